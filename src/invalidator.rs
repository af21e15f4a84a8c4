//! Cache invalidation on content changes.
//!
//! In-process content code publishes `ContentEvent`s through a
//! `ContentEvents` handle; the `Invalidator` task waits on the matching
//! `EventSubscription` and purges every cached merge that can contain
//! dynamic content. Events coalesce: any number of changes published before
//! the task wakes up cost one purge, and none is ever dropped. The HTTP
//! webhooks call the `Invalidator` directly.

use crate::cache::{PurgeOutcome, StoreError, TranslationCache};
use crate::i18n::TranslationMetrics;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Entity types whose edits change translation output.
pub const TRANSLATABLE_ENTITIES: [&str; 7] = [
    "Service",
    "Project",
    "ProjectCategory",
    "JobPosition",
    "HomePage",
    "AboutPage",
    "TeamMember",
];

/// Cache keys whose source set includes dynamic content, in every locale.
pub const DYNAMIC_PATTERNS: [&str; 2] = ["translations:*:all:*", "translations:*:dynamic:*"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Notification that a content record was created, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEvent {
    /// Model name, e.g. `Service`
    pub entity: String,
    pub action: ChangeKind,
}

impl ContentEvent {
    pub fn new(entity: impl Into<String>, action: ChangeKind) -> Self {
        Self {
            entity: entity.into(),
            action,
        }
    }

    pub fn affects_translations(&self) -> bool {
        TRANSLATABLE_ENTITIES.contains(&self.entity.as_str())
    }
}

/// State shared by publishers and the subscriber.
#[derive(Debug)]
struct EventSlot {
    /// Latest translation-bearing event not yet picked up
    pending: Mutex<Option<ContentEvent>>,
    wake: Notify,
    publishers: AtomicUsize,
    subscribed: AtomicBool,
}

impl EventSlot {
    fn take(&self) -> Option<ContentEvent> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Store `event`; returns whether an earlier one was still pending.
    fn replace(&self, event: ContentEvent) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(event)
            .is_some()
    }
}

/// Publisher handle held by the content side.
#[derive(Debug)]
pub struct ContentEvents {
    slot: Arc<EventSlot>,
}

/// Receiving end, consumed by `Invalidator::spawn`.
#[derive(Debug)]
pub struct EventSubscription {
    slot: Arc<EventSlot>,
}

/// Create a publisher/subscriber pair.
pub fn channel() -> (ContentEvents, EventSubscription) {
    let slot = Arc::new(EventSlot {
        pending: Mutex::new(None),
        wake: Notify::new(),
        publishers: AtomicUsize::new(1),
        subscribed: AtomicBool::new(true),
    });
    (
        ContentEvents { slot: slot.clone() },
        EventSubscription { slot },
    )
}

/// Why an event was not published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    Closed,
}

impl ContentEvents {
    /// Hand an event to the subscriber without waiting.
    ///
    /// Returns `Ok(false)` for entity types that do not carry translations;
    /// those never reach the subscriber. A translation-bearing event merges
    /// with one still pending, since both call for the same purge.
    pub fn publish(&self, event: ContentEvent) -> Result<bool, PublishError> {
        if !self.slot.subscribed.load(Ordering::Acquire) {
            return Err(PublishError::Closed);
        }
        if !event.affects_translations() {
            debug!("Ignoring {:?} of {}", event.action, event.entity);
            return Ok(false);
        }

        if self.slot.replace(event) {
            debug!("Coalesced content event into pending invalidation");
        }
        self.slot.wake.notify_one();
        Ok(true)
    }
}

impl Clone for ContentEvents {
    fn clone(&self) -> Self {
        self.slot.publishers.fetch_add(1, Ordering::AcqRel);
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl Drop for ContentEvents {
    fn drop(&mut self) {
        if self.slot.publishers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.slot.wake.notify_one();
        }
    }
}

impl EventSubscription {
    /// Wait for the next pending event. `None` once every publisher is
    /// gone and nothing is left to handle.
    pub async fn recv(&mut self) -> Option<ContentEvent> {
        loop {
            if let Some(event) = self.slot.take() {
                return Some(event);
            }
            if self.slot.publishers.load(Ordering::Acquire) == 0 {
                return None;
            }
            // A permit stored by `notify_one` before we got here makes this
            // return immediately.
            self.slot.wake.notified().await;
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.slot.subscribed.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct Invalidator {
    cache: TranslationCache,
    metrics: Arc<TranslationMetrics>,
}

impl Invalidator {
    pub fn new(cache: TranslationCache, metrics: Arc<TranslationMetrics>) -> Self {
        Self { cache, metrics }
    }

    /// Purge every dynamic-bearing entry across all locales.
    pub async fn invalidate(&self) -> Result<PurgeOutcome, StoreError> {
        let outcome = self.cache.purge(&DYNAMIC_PATTERNS).await?;
        self.metrics.record_invalidation(outcome.cleared_keys());
        info!("Translation cache invalidated ({} keys cleared)", outcome);
        Ok(outcome)
    }

    /// React to one content event. Returns `None` for entity types that do
    /// not carry translations.
    pub async fn handle(&self, event: &ContentEvent) -> Result<Option<PurgeOutcome>, StoreError> {
        if !event.affects_translations() {
            debug!("Ignoring {:?} of {}", event.action, event.entity);
            return Ok(None);
        }

        info!("{} {:?}, invalidating translations", event.entity, event.action);
        self.invalidate().await.map(Some)
    }

    /// Handle events until every publisher is dropped.
    pub fn spawn(self, mut events: EventSubscription) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Err(e) = self.handle(&event).await {
                    error!("Failed to invalidate after {} change: {}", event.entity, e);
                }
            }
            debug!("Content event channel closed");
        })
    }
}

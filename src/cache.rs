//! Cache of merged translation maps.
//!
//! `CacheStore` is the backend seam; `MemoryCacheStore` is the in-process
//! backend. `TranslationCache` adds key building, the TTL policy and the
//! purge fallback on top of whichever backend is plugged in.

use crate::i18n::Locale;
use crate::model::{Namespace, SourceSet, TranslationMap};
use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Key segment used when a request has no namespace.
pub const ALL_NAMESPACES: &str = "@all";

/// Longest lifetime any entry gets, whatever the configured TTL.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Expiry instant for an entry written at `now`, with the TTL capped at
/// `MAX_TTL`.
fn expiry(now: Instant, ttl: Duration) -> Instant {
    let ttl = ttl.min(MAX_TTL);
    now.checked_add(ttl).unwrap_or(now)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("cache store cannot enumerate keys by pattern")]
    PatternUnsupported,
}

/// Glob pattern over cache keys. `*` matches any run of characters.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    glob: String,
    regex: Regex,
}

impl KeyPattern {
    pub fn new(glob: &str) -> Result<Self, regex::Error> {
        let body = glob
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{}$", body))?;

        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob)
    }
}

/// Storage backend for merged maps.
///
/// Implementations must be safe for concurrent use from many request tasks.
/// Expired entries must never be returned by `get`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<TranslationMap>, StoreError>;

    async fn set(&self, key: &str, value: TranslationMap, ttl: Duration) -> Result<(), StoreError>;

    /// Remove every entry whose key matches `pattern`, returning how many
    /// were removed. Backends that cannot enumerate keys return
    /// `StoreError::PatternUnsupported`.
    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<usize, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;

    /// Drop expired entries; returns how many were removed.
    async fn sweep_expired(&self) -> Result<usize, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredMap {
    value: TranslationMap,
    expires_at: Instant,
}

/// In-process backend on a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, StoredMap>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<TranslationMap>, StoreError> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: TranslationMap, ttl: Duration) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_string(),
            StoredMap {
                value,
                expires_at: expiry(Instant::now(), ttl),
            },
        );
        Ok(())
    }

    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<usize, StoreError> {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            if pattern.matches(key) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }
}

/// Identity of a cached merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub locale: Locale,
    pub sources: SourceSet,
    pub namespace: Option<Namespace>,
}

impl CacheKey {
    pub fn new(locale: Locale, sources: SourceSet, namespace: Option<Namespace>) -> Self {
        Self {
            locale,
            sources,
            namespace,
        }
    }
}

impl fmt::Display for CacheKey {
    /// `translations:<locale>:<source>:<namespace|@all>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translations:{}:{}:{}",
            self.locale,
            self.sources,
            self.namespace
                .as_ref()
                .map_or(ALL_NAMESPACES, |ns| ns.as_str())
        )
    }
}

/// TTLs by source set. Dynamic-only merges expire sooner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub default: Duration,
    pub dynamic_only: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(3600),
            dynamic_only: Duration::from_secs(1800),
        }
    }
}

impl TtlPolicy {
    pub fn ttl_for(&self, sources: SourceSet) -> Duration {
        match sources {
            SourceSet::Dynamic => self.dynamic_only,
            _ => self.default,
        }
    }
}

/// What a purge removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    Keys(usize),
    /// The store was cleared wholesale
    All,
}

impl PurgeOutcome {
    pub fn cleared_keys(&self) -> Option<usize> {
        match self {
            PurgeOutcome::Keys(count) => Some(*count),
            PurgeOutcome::All => None,
        }
    }
}

impl fmt::Display for PurgeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurgeOutcome::Keys(count) => write!(f, "{}", count),
            PurgeOutcome::All => f.write_str("all"),
        }
    }
}

impl Serialize for PurgeOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PurgeOutcome::Keys(count) => serializer.serialize_u64(*count as u64),
            PurgeOutcome::All => serializer.serialize_str("all"),
        }
    }
}

/// Translation-aware front of a `CacheStore`.
///
/// Every purge bumps a generation counter. A merge records the generation
/// before it loads and writes back through `set_if_unchanged`, so a result
/// computed from content that a purge has since replaced never reaches the
/// store.
#[derive(Clone)]
pub struct TranslationCache {
    store: Arc<dyn CacheStore>,
    ttl: TtlPolicy,
    generation: Arc<RwLock<u64>>,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: TtlPolicy) -> Self {
        Self {
            store,
            ttl,
            generation: Arc::new(RwLock::new(0)),
        }
    }

    pub fn in_memory(ttl: TtlPolicy) -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), ttl)
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<TranslationMap>, StoreError> {
        self.store.get(&key.to_string()).await
    }

    pub async fn set(&self, key: &CacheKey, value: TranslationMap) -> Result<(), StoreError> {
        let ttl = self.ttl.ttl_for(key.sources);
        debug!("Caching {} keys under {} for {}s", value.len(), key, ttl.as_secs());
        self.store.set(&key.to_string(), value, ttl).await
    }

    /// Current purge generation.
    pub async fn generation(&self) -> u64 {
        *self.generation.read().await
    }

    /// Write `value` only if no purge ran since `generation` was read.
    /// Returns whether the entry was stored.
    pub async fn set_if_unchanged(
        &self,
        key: &CacheKey,
        value: TranslationMap,
        generation: u64,
    ) -> Result<bool, StoreError> {
        // Held across the write so a purge cannot slip in between the check
        // and the store.
        let current = self.generation.read().await;
        if *current != generation {
            debug!("Purge ran during merge, not caching {}", key);
            return Ok(false);
        }
        self.set(key, value).await?;
        Ok(true)
    }

    /// Remove entries matching any of `globs`.
    ///
    /// When the store cannot purge by pattern, or a pattern is unusable,
    /// the whole store is cleared and `PurgeOutcome::All` is returned.
    pub async fn purge(&self, globs: &[&str]) -> Result<PurgeOutcome, StoreError> {
        let mut generation = self.generation.write().await;
        *generation += 1;

        let mut removed = 0;

        for glob in globs {
            let pattern = match KeyPattern::new(glob) {
                Ok(pattern) => pattern,
                Err(e) => {
                    warn!("Invalid purge pattern '{}': {}; clearing cache", glob, e);
                    return self.clear_all().await;
                }
            };

            match self.store.delete_matching(&pattern).await {
                Ok(count) => removed += count,
                Err(e) => {
                    warn!("Pattern purge of '{}' failed: {}; clearing cache", pattern, e);
                    return self.clear_all().await;
                }
            }
        }

        Ok(PurgeOutcome::Keys(removed))
    }

    /// Caller holds the generation write lock.
    async fn clear_all(&self) -> Result<PurgeOutcome, StoreError> {
        self.store.clear().await?;
        Ok(PurgeOutcome::All)
    }

    pub async fn sweep_expired(&self) -> Result<usize, StoreError> {
        self.store.sweep_expired().await
    }

    pub async fn len(&self) -> Result<usize, StoreError> {
        self.store.len().await
    }
}

//! Translation service metrics.
//!
//! Counters for cache behaviour, loader degradations, gate rejections and
//! invalidations. One instance is owned by each `TranslationService`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Requests answered from the cache
    cache_hits: AtomicUsize,

    /// Requests that had to merge (including forced refreshes)
    cache_misses: AtomicUsize,

    /// Merges performed
    merges: AtomicUsize,

    /// Loader calls that degraded to an empty or partial contribution
    loader_degradations: AtomicUsize,

    /// Requests rejected by the request gate
    rate_limited: AtomicUsize,

    /// Invalidation runs (events and explicit calls)
    invalidations: AtomicUsize,

    /// Cache keys removed by invalidation (full clears not counted)
    keys_cleared: AtomicUsize,

    last_invalidated_at: Mutex<Option<DateTime<Utc>>>,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_merge(&self) {
        self.merges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loader_degradation(&self) {
        self.loader_degradations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an invalidation run. `cleared` is `None` when the whole store
    /// was cleared and the number of removed keys is unknown.
    pub fn record_invalidation(&self, cleared: Option<usize>) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        if let Some(count) = cleared {
            self.keys_cleared.fetch_add(count, Ordering::Relaxed);
        }
        if let Ok(mut last) = self.last_invalidated_at.lock() {
            *last = Some(Utc::now());
        }
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn merges(&self) -> usize {
        self.merges.load(Ordering::Relaxed)
    }

    pub fn loader_degradations(&self) -> usize {
        self.loader_degradations.load(Ordering::Relaxed)
    }

    pub fn rate_limited(&self) -> usize {
        self.rate_limited.load(Ordering::Relaxed)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            merges: self.merges(),
            loader_degradations: self.loader_degradations(),
            rate_limited: self.rate_limited(),
            invalidations: self.invalidations(),
            keys_cleared: self.keys_cleared.load(Ordering::Relaxed),
            last_invalidated_at: self.last_invalidated_at.lock().ok().and_then(|last| *last),
        }
    }
}

/// Snapshot of the service counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub merges: usize,
    pub loader_degradations: usize,
    pub rate_limited: usize,
    pub invalidations: usize,
    pub keys_cleared: usize,
    pub last_invalidated_at: Option<DateTime<Utc>>,
}

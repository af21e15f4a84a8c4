//! Request orchestration: gate, cache lookup, merge, cache write.

use crate::cache::{CacheKey, PurgeOutcome, StoreError, TranslationCache, TtlPolicy};
use crate::config::Config;
use crate::content::{self, ContentRepository};
use crate::error::{ServiceError, ValidationError};
use crate::gate::{GateDecision, RequestGate};
use crate::i18n::{Locale, MetricsReport, TranslationMetrics};
use crate::invalidator::{ContentEvent, Invalidator};
use crate::merge::MergeResolver;
use crate::model::{Namespace, SourceSet, TranslationMap};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Raw request parameters, validated by the service.
#[derive(Debug, Clone, Default)]
pub struct TranslationRequest {
    pub locale: String,
    pub source: Option<String>,
    pub namespace: Option<String>,
    pub refresh: bool,
    /// Rate-limit identity of the caller
    pub client: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationResponse {
    pub locale: Locale,
    pub translations: TranslationMap,
    pub count: usize,
    pub source: SourceSet,
    pub namespace: Option<Namespace>,
    pub cached: bool,
}

impl TranslationResponse {
    fn new(key: CacheKey, translations: TranslationMap, cached: bool) -> Self {
        Self {
            locale: key.locale,
            count: translations.len(),
            translations,
            source: key.sources,
            namespace: key.namespace,
            cached,
        }
    }
}

pub struct TranslationService {
    resolver: MergeResolver,
    cache: TranslationCache,
    gate: RequestGate,
    invalidator: Invalidator,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationService {
    pub fn new(resolver: MergeResolver, cache: TranslationCache, gate: RequestGate) -> Self {
        let metrics = Arc::new(TranslationMetrics::new());
        let invalidator = Invalidator::new(cache.clone(), metrics.clone());

        Self {
            resolver,
            cache,
            gate,
            invalidator,
            metrics,
        }
    }

    /// Wire loaders, cache and gate from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let repository = content::repository_from_config(config).await?;
        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: &Config, repository: Arc<dyn ContentRepository>) -> Self {
        let cache = TranslationCache::in_memory(TtlPolicy {
            default: config.cache_ttl(),
            dynamic_only: config.dynamic_cache_ttl(),
        });
        let gate = RequestGate::new(config.rate_limit_requests, config.rate_limit_window());

        Self::new(MergeResolver::from_config(config, repository), cache, gate)
    }

    pub async fn translations(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResponse, ServiceError> {
        if let GateDecision::Limited { retry_after } = self.gate.check(&request.client) {
            self.metrics.record_rate_limited();
            return Err(ServiceError::RateLimited { retry_after });
        }

        let key = validate(&request)?;

        if !request.refresh {
            if let Some(translations) = self.cache.get(&key).await? {
                self.metrics.record_cache_hit();
                debug!("Cache hit for {}", key);
                return Ok(TranslationResponse::new(key, translations, true));
            }
        }
        self.metrics.record_cache_miss();

        let generation = self.cache.generation().await;
        let translations = self.merge(&key).await;
        self.cache
            .set_if_unchanged(&key, translations.clone(), generation)
            .await?;

        Ok(TranslationResponse::new(key, translations, false))
    }

    async fn merge(&self, key: &CacheKey) -> TranslationMap {
        let outcome = self
            .resolver
            .merge(key.locale, key.sources, key.namespace.as_ref())
            .await;
        self.metrics.record_merge();

        for source in &outcome.degraded_sources {
            self.metrics.record_loader_degradation();
            debug!("{} source degraded for {}", source.as_str(), key);
        }
        if outcome.translations.is_empty() {
            warn!("No translations available for {}", key);
        }

        outcome.translations
    }

    /// Precompute the unfiltered `all` merge for every locale.
    pub async fn warm(&self) -> Result<usize, StoreError> {
        let mut warmed = 0;
        for locale in Locale::all() {
            let key = CacheKey::new(locale, SourceSet::All, None);
            let generation = self.cache.generation().await;
            let translations = self.merge(&key).await;
            let count = translations.len();
            if self.cache.set_if_unchanged(&key, translations, generation).await? {
                info!("Warmed {} translations for {}", count, locale);
                warmed += 1;
            }
        }
        Ok(warmed)
    }

    pub async fn invalidate(&self) -> Result<PurgeOutcome, StoreError> {
        self.invalidator.invalidate().await
    }

    pub async fn handle_event(&self, event: &ContentEvent) -> Result<Option<PurgeOutcome>, StoreError> {
        self.invalidator.handle(event).await
    }

    pub fn invalidator(&self) -> Invalidator {
        self.invalidator.clone()
    }

    /// Drop expired cache entries and elapsed rate windows.
    pub async fn sweep(&self) -> Result<(usize, usize), StoreError> {
        let entries = self.cache.sweep_expired().await?;
        let windows = self.gate.sweep_expired();
        Ok((entries, windows))
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }

    pub async fn cache_entries(&self) -> Result<usize, StoreError> {
        self.cache.len().await
    }
}

fn validate(request: &TranslationRequest) -> Result<CacheKey, ValidationError> {
    let code = request.locale.trim();
    let locale =
        Locale::from_code(code).map_err(|_| ValidationError::UnsupportedLocale(code.to_string()))?;

    let sources = match request.source.as_deref().map(str::trim) {
        None | Some("") => SourceSet::All,
        Some(raw) => raw
            .parse()
            .map_err(|_| ValidationError::UnsupportedSource(raw.to_string()))?,
    };

    let namespace = match request.namespace.as_deref() {
        None => None,
        Some(raw) => Namespace::parse(raw)
            .map_err(|_| ValidationError::InvalidNamespace(raw.trim().to_string()))?,
    };

    Ok(CacheKey::new(locale, sources, namespace))
}

use crate::content::{ContentRepository, EntityKind};
use crate::i18n::Locale;
use crate::loaders::Contribution;
use crate::model::{filter_namespace, Namespace, Source, TranslationMap};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default cap on records read per entity kind.
pub const DEFAULT_ENTITY_LIMIT: usize = 20;

/// Turns active content records into `<root>.<slug|id>.<field>` keys.
#[derive(Clone)]
pub struct DynamicContentLoader {
    repository: Arc<dyn ContentRepository>,
    limit: usize,
}

impl DynamicContentLoader {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self {
            repository,
            limit: DEFAULT_ENTITY_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub async fn load(&self, locale: Locale, namespace: Option<&Namespace>) -> Contribution {
        let kinds: Vec<EntityKind> = EntityKind::ALL
            .into_iter()
            .filter(|kind| namespace.map_or(true, |ns| ns.may_contain(kind.key_root())))
            .collect();

        let queries = kinds.iter().map(|&kind| {
            let limit = if kind.is_singleton() { 1 } else { self.limit };
            self.repository.active_records(kind, locale, limit)
        });
        let results = join_all(queries).await;

        let mut map = TranslationMap::new();
        let mut degraded = false;

        for (kind, result) in kinds.into_iter().zip(results) {
            match result {
                Ok(records) => {
                    debug!("Loaded {} {} records for {}", records.len(), kind.model_name(), locale);
                    for record in records {
                        let identifier = record.identifier();
                        for (field, text) in record.fields {
                            if text.trim().is_empty() {
                                continue;
                            }
                            map.insert(
                                format!("{}.{}.{}", kind.key_root(), identifier, field),
                                text,
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to load {} content for {}: {:#}", kind.model_name(), locale, e);
                    degraded = true;
                }
            }
        }

        Contribution {
            source: Source::Dynamic,
            entries: filter_namespace(map, namespace),
            degraded,
        }
    }
}

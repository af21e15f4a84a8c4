use crate::content::{ContentRecord, ContentRepository, EntityKind};
use crate::i18n::Locale;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// A content record with per-locale field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: i64,
    pub slug: Option<String>,
    pub is_active: bool,
    texts: HashMap<String, HashMap<Locale, String>>,
}

impl ContentItem {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            slug: None,
            is_active: true,
            texts: HashMap::new(),
        }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn text(mut self, field: &str, locale: Locale, value: impl Into<String>) -> Self {
        self.texts
            .entry(field.to_string())
            .or_default()
            .insert(locale, value.into());
        self
    }

    /// Resolve the kind's fields for `locale`, falling back to the default
    /// locale's value when the requested one is missing or blank.
    fn resolve(&self, kind: EntityKind, locale: Locale) -> ContentRecord {
        let default = Locale::default_locale();
        let fields = kind
            .fields()
            .iter()
            .filter_map(|field| {
                let values = self.texts.get(*field)?;
                let pick = |l: Locale| values.get(&l).filter(|v| !v.trim().is_empty());
                pick(locale)
                    .or_else(|| pick(default))
                    .map(|value| (field.to_string(), value.clone()))
            })
            .collect();

        ContentRecord {
            id: self.id,
            slug: self.slug.clone(),
            fields,
        }
    }
}

/// Process-local content store.
///
/// Used when no database is configured and in tests. Records keep their
/// insertion order, which stands in for the site's display order.
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    items: RwLock<HashMap<EntityKind, Vec<ContentItem>>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record of the same kind and id.
    pub fn upsert(&self, kind: EntityKind, item: ContentItem) {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        let records = items.entry(kind).or_default();
        match records.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => records.push(item),
        }
    }

    pub fn remove(&self, kind: EntityKind, id: i64) -> bool {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        let Some(records) = items.get_mut(&kind) else {
            return false;
        };
        let before = records.len();
        records.retain(|item| item.id != id);
        records.len() != before
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.items
            .read()
            .map(|items| items.get(&kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn active_records(
        &self,
        kind: EntityKind,
        locale: Locale,
        limit: usize,
    ) -> Result<Vec<ContentRecord>> {
        let items = self
            .items
            .read()
            .map_err(|_| anyhow!("content store lock poisoned"))?;

        Ok(items
            .get(&kind)
            .map(|records| {
                records
                    .iter()
                    .filter(|item| item.is_active)
                    .take(limit)
                    .map(|item| item.resolve(kind, locale))
                    .collect()
            })
            .unwrap_or_default())
    }
}

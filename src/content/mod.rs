//! Content entities that carry translatable text.
//!
//! The marketing-site CRUD layer owns these records; this crate only reads
//! the active ones through `ContentRepository`.

mod memory;
mod postgres;

pub use memory::{ContentItem, InMemoryContentRepository};
pub use postgres::PgContentRepository;

use crate::config::Config;
use crate::i18n::Locale;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Entity types read by the dynamic loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Service,
    ProjectCategory,
    Project,
    JobPosition,
    HomePage,
}

impl EntityKind {
    /// Load order of the dynamic loader.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Service,
        EntityKind::ProjectCategory,
        EntityKind::Project,
        EntityKind::JobPosition,
        EntityKind::HomePage,
    ];

    /// First key segment of every key emitted for this kind.
    pub fn key_root(&self) -> &'static str {
        match self {
            EntityKind::Service => "services",
            EntityKind::ProjectCategory => "categories",
            EntityKind::Project => "projects",
            EntityKind::JobPosition => "jobs",
            EntityKind::HomePage => "pages",
        }
    }

    /// Model name as published in content-change events.
    pub fn model_name(&self) -> &'static str {
        match self {
            EntityKind::Service => "Service",
            EntityKind::ProjectCategory => "ProjectCategory",
            EntityKind::Project => "Project",
            EntityKind::JobPosition => "JobPosition",
            EntityKind::HomePage => "HomePage",
        }
    }

    /// Translated fields emitted per record, by key name.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Service | EntityKind::ProjectCategory => &["name", "description"],
            EntityKind::Project => &["title", "description"],
            EntityKind::JobPosition => &["title", "location"],
            EntityKind::HomePage => &["company_description", "mission_text", "values_text"],
        }
    }

    /// Singleton pages are read once regardless of the configured cap.
    pub fn is_singleton(&self) -> bool {
        matches!(self, EntityKind::HomePage)
    }
}

/// An active content record with its fields resolved for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: i64,
    pub slug: Option<String>,
    /// `(field key, localized text)` pairs
    pub fields: Vec<(String, String)>,
}

impl ContentRecord {
    /// Slug when present, numeric id otherwise.
    pub fn identifier(&self) -> String {
        match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => self.id.to_string(),
        }
    }
}

/// Query interface over live content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Up to `limit` active records of `kind`, with fields resolved for
    /// `locale`, in the site's display order.
    async fn active_records(
        &self,
        kind: EntityKind,
        locale: Locale,
        limit: usize,
    ) -> Result<Vec<ContentRecord>>;
}

/// PostgreSQL repository when `DATABASE_URL` is set, otherwise an empty
/// in-memory one.
pub async fn repository_from_config(config: &Config) -> Result<Arc<dyn ContentRepository>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(PgContentRepository::connect(url).await?)),
        None => {
            warn!("DATABASE_URL not set, dynamic translations will be empty");
            Ok(Arc::new(InMemoryContentRepository::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identifier_prefers_slug() {
        let record = ContentRecord {
            id: 7,
            slug: Some("tailoring".to_string()),
            fields: vec![],
        };
        assert_eq!(record.identifier(), "tailoring");
    }

    #[test]
    fn test_identifier_falls_back_to_id() {
        let mut record = ContentRecord {
            id: 42,
            slug: None,
            fields: vec![],
        };
        assert_eq!(record.identifier(), "42");

        record.slug = Some("  ".to_string());
        assert_eq!(record.identifier(), "42");
    }

    #[test]
    fn test_key_roots_are_unique() {
        let roots: HashSet<_> = EntityKind::ALL.iter().map(|k| k.key_root()).collect();
        assert_eq!(roots.len(), EntityKind::ALL.len());
    }

    #[test]
    fn test_every_kind_has_fields() {
        for kind in EntityKind::ALL {
            assert!(!kind.fields().is_empty(), "{:?} has no fields", kind);
        }
    }

    #[test]
    fn test_only_home_page_is_singleton() {
        let singletons: Vec<_> = EntityKind::ALL.iter().filter(|k| k.is_singleton()).collect();
        assert_eq!(singletons, vec![&EntityKind::HomePage]);
    }
}

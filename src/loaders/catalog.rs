use crate::i18n::Locale;
use crate::loaders::{po, Contribution};
use crate::model::{filter_namespace, Namespace, Source, TranslationMap};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Key root for catalog entries: `catalog.<msgid>`.
pub const CATALOG_KEY_ROOT: &str = "catalog";

/// Reads gettext catalogs laid out as `<dir>/<locale>/LC_MESSAGES/<domain>.po`.
#[derive(Debug, Clone)]
pub struct MessageCatalogLoader {
    dir: PathBuf,
    domain: String,
    skip_fuzzy: bool,
}

impl MessageCatalogLoader {
    pub fn new(dir: impl Into<PathBuf>, domain: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            domain: domain.into(),
            skip_fuzzy: false,
        }
    }

    pub fn skip_fuzzy(mut self, skip: bool) -> Self {
        self.skip_fuzzy = skip;
        self
    }

    pub fn catalog_path(&self, locale: Locale) -> PathBuf {
        self.dir
            .join(locale.code())
            .join("LC_MESSAGES")
            .join(format!("{}.po", self.domain))
    }

    pub async fn load(&self, locale: Locale, namespace: Option<&Namespace>) -> Contribution {
        if let Some(ns) = namespace {
            if !ns.may_contain(CATALOG_KEY_ROOT) {
                return Contribution::new(Source::Catalog, TranslationMap::new());
            }
        }

        let path = self.catalog_path(locale);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Message catalog for {} not found at {}", locale, path.display());
                return Contribution::empty(Source::Catalog);
            }
            Err(e) => {
                warn!("Failed to read message catalog {}: {}", path.display(), e);
                return Contribution::empty(Source::Catalog);
            }
        };

        let entries = match po::parse(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to parse message catalog {}: {}", path.display(), e);
                return Contribution::empty(Source::Catalog);
            }
        };

        let map = self.to_map(&entries);
        debug!("Loaded {} catalog entries from {}", map.len(), path.display());

        Contribution::new(Source::Catalog, filter_namespace(map, namespace))
    }

    fn to_map(&self, entries: &[po::PoEntry]) -> TranslationMap {
        entries
            .iter()
            .filter(|entry| !entry.obsolete && !entry.is_header())
            .filter(|entry| !(self.skip_fuzzy && entry.is_fuzzy()))
            .filter_map(|entry| {
                let msgid = entry.msgid.trim();
                if msgid.is_empty() {
                    return None;
                }
                entry
                    .translation()
                    .map(|text| (format!("{}.{}", CATALOG_KEY_ROOT, msgid), text.to_string()))
            })
            .collect()
    }
}

//! Catalog loaders.
//!
//! Each loader turns one origin of translations into a flat `TranslationMap`
//! for a locale. Loaders never fail: a missing file, a parse error or a
//! broken query becomes an empty (or partial) contribution plus a logged
//! warning, and the contribution is flagged as degraded.

mod catalog;
mod dynamic;
pub mod po;
mod static_bundle;

pub use catalog::MessageCatalogLoader;
pub use dynamic::DynamicContentLoader;
pub use static_bundle::{flatten_bundle, StaticBundleLoader};

use crate::model::{Source, TranslationMap};

/// What one loader produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub source: Source,
    pub entries: TranslationMap,
    /// Set when the loader hit a failure or had to fall back
    pub degraded: bool,
}

impl Contribution {
    pub fn new(source: Source, entries: TranslationMap) -> Self {
        Self {
            source,
            entries,
            degraded: false,
        }
    }

    pub fn degraded(source: Source, entries: TranslationMap) -> Self {
        Self {
            source,
            entries,
            degraded: true,
        }
    }

    pub fn empty(source: Source) -> Self {
        Self::degraded(source, TranslationMap::new())
    }
}

//! Core value types shared by the loaders, the resolver and the cache.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Translation key → localized text for one locale.
///
/// Ordered by key so serialized responses and exports are reproducible.
pub type TranslationMap = BTreeMap<String, String>;

/// One origin of translations. Order of declaration is merge precedence,
/// lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Static,
    Catalog,
    Dynamic,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Static => "static",
            Source::Catalog => "catalog",
            Source::Dynamic => "dynamic",
        }
    }
}

/// Selection of sources contributing to a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSet {
    #[default]
    All,
    Static,
    Catalog,
    Dynamic,
}

impl SourceSet {
    /// Every accepted value, as shown in validation errors.
    pub const NAMES: [&'static str; 4] = ["all", "static", "catalog", "dynamic"];

    /// Sources to load, in merge order.
    pub fn sources(&self) -> &'static [Source] {
        match self {
            SourceSet::All => &[Source::Static, Source::Catalog, Source::Dynamic],
            SourceSet::Static => &[Source::Static],
            SourceSet::Catalog => &[Source::Catalog],
            SourceSet::Dynamic => &[Source::Dynamic],
        }
    }

    pub fn includes(&self, source: Source) -> bool {
        self.sources().contains(&source)
    }

    /// Whether content edits can change results for this set.
    pub fn includes_dynamic(&self) -> bool {
        self.includes(Source::Dynamic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSet::All => "all",
            SourceSet::Static => "static",
            SourceSet::Catalog => "catalog",
            SourceSet::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SourceSet::All),
            "static" => Ok(SourceSet::Static),
            "catalog" => Ok(SourceSet::Catalog),
            "dynamic" => Ok(SourceSet::Dynamic),
            other => Err(format!("Unsupported source: '{}'", other)),
        }
    }
}

static NAMESPACE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Key prefix filter. `services` keeps `services.*` keys only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    name: String,
    prefix: String,
}

impl Namespace {
    /// Parse a namespace query value. Blank input means "no namespace".
    pub fn parse(raw: &str) -> Result<Option<Namespace>, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let regex = NAMESPACE_REGEX.get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)*$").expect("namespace regex is valid")
        });
        if !regex.is_match(trimmed) {
            return Err(format!("Invalid namespace: '{}'", trimmed));
        }

        Ok(Some(Namespace {
            name: trimmed.to_string(),
            prefix: format!("{}.", trimmed),
        }))
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }

    /// Whether keys built under `root` (e.g. `services`) can fall inside
    /// this namespace. Lets loaders skip work that would be filtered away.
    pub fn may_contain(&self, root: &str) -> bool {
        self.name == root
            || self.name.starts_with(&format!("{}.", root))
            || root.starts_with(&self.prefix)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for Namespace {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Keep only the keys inside `namespace`; no namespace keeps everything.
pub fn filter_namespace(map: TranslationMap, namespace: Option<&Namespace>) -> TranslationMap {
    match namespace {
        Some(ns) => map.into_iter().filter(|(key, _)| ns.matches(key)).collect(),
        None => map,
    }
}

//! Translation source validation.
//!
//! Checks static bundles and message catalogs for problems that silently
//! degrade what the frontend shows: empty values, unparsable files, fuzzy
//! or untranslated catalog entries, and placeholders lost in translation.

use crate::i18n::Locale;
use crate::loaders::{flatten_bundle, po, MessageCatalogLoader, StaticBundleLoader};
use regex::Regex;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

/// Validation report containing errors and warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that lose or break translations
    pub errors: Vec<String>,

    /// Problems worth a look that still produce output
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

// printf-style (`%s`, `%(name)s`) and brace (`{name}`) placeholders
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Validator for the file-based translation sources.
pub struct CatalogValidator {
    bundles: StaticBundleLoader,
    catalogs: MessageCatalogLoader,
}

impl CatalogValidator {
    pub fn new(bundles: StaticBundleLoader, catalogs: MessageCatalogLoader) -> Self {
        Self { bundles, catalogs }
    }

    /// Validate the bundle and the catalog of one locale.
    pub fn validate_locale(&self, locale: Locale) -> ValidationReport {
        let mut report = Self::validate_bundle(&self.bundles.bundle_path(locale));
        report.merge(Self::validate_catalog(&self.catalogs.catalog_path(locale)));
        report
    }

    pub fn validate_bundle(path: &Path) -> ValidationReport {
        let mut report = ValidationReport::new();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                report
                    .warnings
                    .push(format!("{}: bundle missing, fallback strings will be served", path.display()));
                return report;
            }
            Err(e) => {
                report.errors.push(format!("{}: {}", path.display(), e));
                return report;
            }
        };

        let entries = serde_json::from_str(&content)
            .map_err(anyhow::Error::from)
            .and_then(|value| flatten_bundle(&value));
        match entries {
            Ok(entries) => {
                for (key, value) in entries {
                    if value.trim().is_empty() {
                        report
                            .errors
                            .push(format!("{}: empty value for '{}'", path.display(), key));
                    }
                }
            }
            Err(e) => report.errors.push(format!("{}: {}", path.display(), e)),
        }

        report
    }

    pub fn validate_catalog(path: &Path) -> ValidationReport {
        let mut report = ValidationReport::new();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                report.errors.push(format!("{}: {}", path.display(), e));
                return report;
            }
        };

        let entries = match po::parse(&content) {
            Ok(entries) => entries,
            Err(e) => {
                report.errors.push(format!("{}: {}", path.display(), e));
                return report;
            }
        };

        for entry in entries.iter().filter(|e| !e.obsolete && !e.is_header()) {
            match entry.translation() {
                None => report
                    .warnings
                    .push(format!("{}: untranslated '{}'", path.display(), entry.msgid)),
                Some(translated) => {
                    if entry.is_fuzzy() {
                        report
                            .warnings
                            .push(format!("{}: fuzzy '{}'", path.display(), entry.msgid));
                    }
                    let placeholders = Self::validate_placeholders(&entry.msgid, translated);
                    report.warnings.extend(
                        placeholders
                            .warnings
                            .into_iter()
                            .map(|w| format!("{}: '{}': {}", path.display(), entry.msgid, w)),
                    );
                }
            }
        }

        report
    }

    /// Check that a translation keeps the original's placeholders.
    pub fn validate_placeholders(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        let mut orig = Self::extract_placeholders(original);
        let mut trans = Self::extract_placeholders(translated);
        orig.sort();
        trans.sort();

        if orig != trans {
            report.warnings.push(format!(
                "Placeholder mismatch: original has {:?}, translation has {:?}",
                orig, trans
            ));
        }

        report
    }

    fn extract_placeholders(text: &str) -> Vec<String> {
        let regex = PLACEHOLDER_REGEX.get_or_init(|| {
            Regex::new(r"%\([A-Za-z0-9_]+\)[sdif]|%[sdif]|\{[A-Za-z0-9_]*\}")
                .expect("placeholder regex is valid")
        });

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== Placeholder Tests ====================

    #[test]
    fn test_extract_placeholders() {
        assert_eq!(
            CatalogValidator::extract_placeholders("Hello %(name)s, you have %d {kind}"),
            vec!["%(name)s", "%d", "{kind}"]
        );
        assert!(CatalogValidator::extract_placeholders("100% cotton").is_empty());
    }

    #[test]
    fn test_placeholders_reordered_is_clean() {
        let report = CatalogValidator::validate_placeholders("{a} of {b}", "{b} з {a}");
        assert!(report.is_clean());
    }

    #[test]
    fn test_placeholder_lost() {
        let report = CatalogValidator::validate_placeholders("Hello %(name)s", "Привіт");
        assert!(report.has_warnings());
        assert!(report.warnings[0].contains("Placeholder mismatch"));
    }

    // ==================== Bundle Tests ====================

    #[test]
    fn test_bundle_missing_is_warning() {
        let dir = TempDir::new().unwrap();
        let report = CatalogValidator::validate_bundle(&dir.path().join("en.json"));
        assert!(!report.has_errors());
        assert!(report.warnings[0].contains("bundle missing"));
    }

    #[test]
    fn test_bundle_empty_values_are_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en.json");
        std::fs::write(&path, r#"{"nav": {"home": "Home", "about": " "}}"#).unwrap();

        let report = CatalogValidator::validate_bundle(&path);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("nav.about"));
    }

    #[test]
    fn test_bundle_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en.json");
        std::fs::write(&path, "[1, 2").unwrap();

        assert!(CatalogValidator::validate_bundle(&path).has_errors());
    }

    // ==================== Catalog Tests ====================

    #[test]
    fn test_catalog_missing_is_error() {
        let dir = TempDir::new().unwrap();
        let report = CatalogValidator::validate_catalog(&dir.path().join("django.po"));
        assert!(report.has_errors());
    }

    #[test]
    fn test_catalog_flags_fuzzy_and_untranslated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("django.po");
        std::fs::write(
            &path,
            "msgid \"\"\nmsgstr \"\"\n\n#, fuzzy\nmsgid \"Name\"\nmsgstr \"Назва\"\n\nmsgid \"Phone\"\nmsgstr \"\"\n\n#~ msgid \"Old\"\n#~ msgstr \"\"\n",
        )
        .unwrap();

        let report = CatalogValidator::validate_catalog(&path);

        assert!(!report.has_errors());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().any(|w| w.contains("fuzzy 'Name'")));
        assert!(report.warnings.iter().any(|w| w.contains("untranslated 'Phone'")));
    }

    #[test]
    fn test_validate_locale_combines_sources() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("uk.json"), r#"{"nav.home": "Головна"}"#).unwrap();

        let validator = CatalogValidator::new(
            StaticBundleLoader::new(dir.path()),
            MessageCatalogLoader::new(dir.path().join("locale"), "django"),
        );
        let report = validator.validate_locale(Locale::UKRAINIAN);

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("django.po"));
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_report_merge() {
        let mut report = ValidationReport::new();
        assert!(report.is_clean());

        let mut other = ValidationReport::new();
        other.errors.push("e".into());
        other.warnings.push("w".into());
        report.merge(other);

        assert!(report.has_errors());
        assert!(report.has_warnings());
    }
}

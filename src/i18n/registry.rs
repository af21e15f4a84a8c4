//! Locale registry: single source of truth for the locales the site serves.
//!
//! The registry is initialized once through `OnceLock` and is immutable
//! afterwards. Every inbound locale code is checked against it before any
//! loader runs.

use std::sync::OnceLock;

/// Configuration for a supported locale.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// Short locale code used in URLs and file names (e.g., "uk", "en")
    pub code: &'static str,

    /// English name of the locale
    pub name: &'static str,

    /// Native name of the locale (e.g., "Українська")
    pub native_name: &'static str,

    /// Whether this is the default locale used for fallbacks (only one should be true)
    pub is_default: bool,

    /// Whether requests for this locale are accepted
    pub enabled: bool,
}

/// Global locale registry singleton.
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global locale registry instance.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: default_locales(),
        })
    }

    /// Get a locale configuration by its code.
    ///
    /// # Returns
    /// * `Some(&LocaleConfig)` if the locale exists
    /// * `None` if the locale is not found
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// Get all enabled locales, in registry order.
    pub fn list_enabled(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().filter(|locale| locale.enabled).collect()
    }

    /// Codes of all enabled locales, used in validation error payloads.
    pub fn enabled_codes(&self) -> Vec<&'static str> {
        self.locales
            .iter()
            .filter(|locale| locale.enabled)
            .map(|locale| locale.code)
            .collect()
    }

    /// Get the default locale configuration.
    ///
    /// # Panics
    /// Panics if zero or several default locales are defined (this indicates
    /// a configuration error in `default_locales`).
    pub fn default_locale(&self) -> &LocaleConfig {
        let defaults: Vec<_> = self
            .locales
            .iter()
            .filter(|locale| locale.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default locale found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default locales found in registry"),
        }
    }

    /// Check if a locale code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|locale| locale.enabled)
            .unwrap_or(false)
    }
}

/// Supported locales. Ukrainian is the site's primary language.
fn default_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "uk",
            name: "Ukrainian",
            native_name: "Українська",
            is_default: true,
            enabled: true,
        },
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_default: false,
            enabled: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LocaleRegistry::get();
        let registry2 = LocaleRegistry::get();

        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_get_by_code_ukrainian() {
        let config = LocaleRegistry::get().get_by_code("uk").unwrap();

        assert_eq!(config.code, "uk");
        assert_eq!(config.name, "Ukrainian");
        assert_eq!(config.native_name, "Українська");
        assert!(config.is_default);
        assert!(config.enabled);
    }

    #[test]
    fn test_get_by_code_english() {
        let config = LocaleRegistry::get().get_by_code("en").unwrap();

        assert_eq!(config.code, "en");
        assert!(!config.is_default);
        assert!(config.enabled);
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        assert!(LocaleRegistry::get().get_by_code("fr").is_none());
    }

    #[test]
    fn test_enabled_codes_in_registry_order() {
        assert_eq!(LocaleRegistry::get().enabled_codes(), vec!["uk", "en"]);
    }

    #[test]
    fn test_list_enabled_len() {
        assert_eq!(LocaleRegistry::get().list_enabled().len(), 2);
    }

    #[test]
    fn test_default_locale_is_ukrainian() {
        assert_eq!(LocaleRegistry::get().default_locale().code, "uk");
    }

    #[test]
    fn test_is_enabled() {
        let registry = LocaleRegistry::get();
        assert!(registry.is_enabled("uk"));
        assert!(registry.is_enabled("en"));
        assert!(!registry.is_enabled("de"));
        assert!(!registry.is_enabled(""));
    }
}

use crate::cache::MAX_TTL;
use anyhow::{ensure, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    /// Show error details in 500 responses
    pub debug: bool,

    // Static bundles
    pub static_translations_dir: PathBuf,

    // Message catalogs
    pub catalog_dir: PathBuf,
    pub catalog_domain: String,
    pub catalog_skip_fuzzy: bool,

    // Dynamic content
    pub database_url: Option<String>,
    pub dynamic_entity_limit: usize,

    // Cache
    pub cache_ttl_secs: u64,
    pub dynamic_cache_ttl_secs: u64,
    pub warm_on_start: bool,

    // Request gate
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,

    // Maintenance
    pub sweep_schedule: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            debug: false,
            static_translations_dir: PathBuf::from("translations"),
            catalog_dir: PathBuf::from("locale"),
            catalog_domain: "django".to_string(),
            catalog_skip_fuzzy: false,
            database_url: None,
            dynamic_entity_limit: 20,
            cache_ttl_secs: 3600,
            dynamic_cache_ttl_secs: 1800,
            warm_on_start: false,
            rate_limit_requests: 30,
            rate_limit_window_secs: 60,
            sweep_schedule: "0 * * * * *".to_string(),
        }
    }
}

fn parsed<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            // Server
            port: parsed("PORT", defaults.port),
            debug: flag("DEBUG", defaults.debug),

            // Static bundles
            static_translations_dir: std::env::var("STATIC_TRANSLATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_translations_dir),

            // Message catalogs
            catalog_dir: std::env::var("CATALOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_dir),
            catalog_domain: std::env::var("CATALOG_DOMAIN").unwrap_or(defaults.catalog_domain),
            catalog_skip_fuzzy: flag("CATALOG_SKIP_FUZZY", defaults.catalog_skip_fuzzy),

            // Dynamic content
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            dynamic_entity_limit: parsed("DYNAMIC_ENTITY_LIMIT", defaults.dynamic_entity_limit),

            // Cache
            cache_ttl_secs: parsed("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            dynamic_cache_ttl_secs: parsed("DYNAMIC_CACHE_TTL_SECS", defaults.dynamic_cache_ttl_secs),
            warm_on_start: flag("WARM_ON_START", defaults.warm_on_start),

            // Request gate
            rate_limit_requests: parsed("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests),
            rate_limit_window_secs: parsed("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit_window_secs),

            // Maintenance
            sweep_schedule: std::env::var("SWEEP_SCHEDULE").unwrap_or(defaults.sweep_schedule),
        };

        ensure!(
            config.rate_limit_window_secs > 0,
            "RATE_LIMIT_WINDOW_SECS must be greater than zero"
        );
        ensure!(
            config.cache_ttl_secs <= MAX_TTL.as_secs()
                && config.dynamic_cache_ttl_secs <= MAX_TTL.as_secs(),
            "CACHE_TTL_SECS and DYNAMIC_CACHE_TTL_SECS must not exceed {} seconds",
            MAX_TTL.as_secs()
        );
        ensure!(
            !config.catalog_domain.trim().is_empty(),
            "CATALOG_DOMAIN must not be empty"
        );

        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn dynamic_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.dynamic_cache_ttl_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

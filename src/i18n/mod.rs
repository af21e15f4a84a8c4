//! Internationalization support shared by the loaders and the service.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for the supported locales
//! - `locale`: Validated `Locale` type built from the registry
//! - `strings`: Compiled-in UI chrome strings used as the last static fallback
//! - `validator`: Checks of bundles and message catalogs
//! - `metrics`: Counters for cache, loader and gate behaviour
//!
//! # Example
//!
//! ```rust,ignore
//! use translation_gateway::i18n::{Locale, LocaleRegistry};
//!
//! // Fallback locale
//! let default = Locale::default_locale();
//!
//! // Validate a request parameter
//! let english = Locale::from_code("en")?;
//!
//! // List all enabled locales
//! let locales = LocaleRegistry::get().list_enabled();
//! ```

mod locale;
mod metrics;
mod registry;
mod strings;
mod validator;

pub use locale::Locale;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LocaleConfig, LocaleRegistry};
pub use strings::BuiltinStrings;
pub use validator::{CatalogValidator, ValidationReport};

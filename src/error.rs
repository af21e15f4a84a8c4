use crate::cache::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Client-fixable request problems.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported locale: '{0}'")]
    UnsupportedLocale(String),

    #[error("Unsupported source: '{0}'")]
    UnsupportedSource(String),

    #[error("Invalid namespace: '{0}'")]
    InvalidNamespace(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Duration },

    /// Failure of the orchestration layer itself, e.g. an unreachable
    /// cache store. Loader failures never end up here.
    #[error("Unexpected failure: {0}")]
    Unexpected(#[from] StoreError),
}

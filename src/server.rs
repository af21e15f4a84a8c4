//! HTTP surface.

use crate::error::{ServiceError, ValidationError};
use crate::gate::{client_identity, retry_after_secs};
use crate::i18n::LocaleRegistry;
use crate::invalidator::ContentEvent;
use crate::model::SourceSet;
use crate::service::{TranslationRequest, TranslationService};
use anyhow::Result;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TranslationService>,
    /// Include failure details in 500 responses
    pub debug: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/translations/stats", get(stats))
        .route("/translations/:locale", get(get_translations))
        .route("/translations/:locale/", get(get_translations))
        .route("/webhooks/translations/invalidate", post(invalidate))
        .route("/webhooks/content-changed", post(content_changed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct TranslationQuery {
    source: Option<String>,
    namespace: Option<String>,
    refresh: Option<String>,
}

/// `true` and `1` (any case) request a refresh; anything else does not.
fn parse_refresh(raw: Option<&str>) -> bool {
    raw.map(|value| {
        let value = value.trim();
        value.eq_ignore_ascii_case("true") || value == "1"
    })
    .unwrap_or(false)
}

async fn health() -> &'static str {
    "OK"
}

async fn get_translations(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<TranslationQuery>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let request = TranslationRequest {
        locale,
        source: query.source,
        namespace: query.namespace,
        refresh: parse_refresh(query.refresh.as_deref()),
        client: client_identity(&headers, peer.map(|ConnectInfo(addr)| addr)),
    };

    match state.service.translations(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e, state.debug),
    }
}

async fn invalidate(State(state): State<AppState>) -> Response {
    match state.service.invalidate().await {
        Ok(outcome) => Json(json!({
            "success": true,
            "cleared_keys": outcome,
        }))
        .into_response(),
        Err(e) => {
            error!("Invalidation failed: {}", e);
            let message = if state.debug {
                format!("Invalidation failed: {}", e)
            } else {
                "Invalidation failed".to_string()
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response()
        }
    }
}

/// Purges before answering, so a request sent after the 202 never sees the
/// replaced content.
async fn content_changed(
    State(state): State<AppState>,
    Json(event): Json<ContentEvent>,
) -> Response {
    let invalidates = match state.service.handle_event(&event).await {
        Ok(outcome) => outcome.is_some(),
        Err(e) => {
            error!("Failed to invalidate after {} change: {}", event.entity, e);
            return error_response(ServiceError::Unexpected(e), state.debug);
        }
    };

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "accepted": true,
            "entity": event.entity,
            "invalidates": invalidates,
        })),
    )
        .into_response()
}

async fn stats(State(state): State<AppState>) -> Response {
    match state.service.cache_entries().await {
        Ok(entries) => Json(json!({
            "metrics": state.service.metrics(),
            "cache_entries": entries,
        }))
        .into_response(),
        Err(e) => error_response(ServiceError::Unexpected(e), state.debug),
    }
}

fn error_response(err: ServiceError, debug: bool) -> Response {
    match err {
        ServiceError::Validation(validation) => {
            let message = validation.to_string();
            let body = match validation {
                ValidationError::UnsupportedLocale(_) => json!({
                    "error": message,
                    "supported_locales": LocaleRegistry::get().enabled_codes(),
                }),
                ValidationError::UnsupportedSource(_) => json!({
                    "error": message,
                    "supported_sources": SourceSet::NAMES,
                }),
                ValidationError::InvalidNamespace(_) => json!({ "error": message }),
            };
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        ServiceError::RateLimited { retry_after } => {
            let secs = retry_after_secs(retry_after);
            info!("Rejected rate-limited request (retry in {}s)", secs);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, secs.to_string())],
                Json(json!({
                    "error": "Rate limit exceeded",
                    "retry_after": secs,
                })),
            )
                .into_response()
        }
        ServiceError::Unexpected(e) => {
            error!("Translation request failed: {}", e);
            let message = if debug {
                format!("Internal server error: {}", e)
            } else {
                "Internal server error".to_string()
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::StoreError;
    use serde_json::Value;
    use std::time::Duration;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_refresh() {
        assert!(parse_refresh(Some("true")));
        assert!(parse_refresh(Some("TRUE")));
        assert!(parse_refresh(Some("1")));
        assert!(!parse_refresh(Some("false")));
        assert!(!parse_refresh(Some("yes please")));
        assert!(!parse_refresh(None));
    }

    #[tokio::test]
    async fn test_unsupported_locale_lists_locales() {
        let response = error_response(
            ValidationError::UnsupportedLocale("de".into()).into(),
            false,
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Unsupported locale: 'de'");
        assert_eq!(body["supported_locales"], json!(["uk", "en"]));
    }

    #[tokio::test]
    async fn test_unsupported_source_lists_sources() {
        let response = error_response(
            ValidationError::UnsupportedSource("po".into()).into(),
            false,
        );
        let body = body_json(response).await;
        assert_eq!(body["supported_sources"], json!(["all", "static", "catalog", "dynamic"]));
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = error_response(
            ServiceError::RateLimited {
                retry_after: Duration::from_millis(41_200),
            },
            false,
        );
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");

        let body = body_json(response).await;
        assert_eq!(body["retry_after"], 42);
    }

    #[tokio::test]
    async fn test_unexpected_hides_detail_unless_debug() {
        let hidden = error_response(StoreError::Unavailable("redis down".into()).into(), false);
        assert_eq!(hidden.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(hidden).await["error"], "Internal server error");

        let shown = error_response(StoreError::Unavailable("redis down".into()).into(), true);
        let message = body_json(shown).await["error"].as_str().unwrap().to_string();
        assert!(message.contains("redis down"));
    }
}

//! # HTTP API Module
//!
//! The assessor's HTTP surface, built on axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness, version and configured provider
//! - `POST /score` - CSV survey in, scored records out (no generation calls)
//! - `POST /assess` - CSV survey in, narratives, decisions and failures out
//! - `POST /assess/report` - CSV survey in, launch report CSV out
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `SAMD_CORS_ORIGINS`: Comma-separated allowed origins, or "*" for all (default: localhost only)
//! - `SAMD_RATE_LIMIT`: Requests per second (default: 20, 0 to disable)
//! - `SAMD_SERVER_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use handlers::{FAILED_RECORDS_HEADER, XLSX_CONTENT_TYPE};
pub use middleware::DEFAULT_RATE_LIMIT;
pub use types::{
    ApiError, AssessResponse, AssessmentJson, ErrorResponse, HealthResponse, ScoreResponse,
};

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::pipeline::Runner;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the runner every request is assessed with.
#[derive(Clone)]
pub struct AppState {
    pub runner: Runner,
}

impl AppState {
    #[must_use]
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }
}

// =============================================================================
// SERVER SETTINGS
// =============================================================================

/// Security settings of the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Bearer key; `None` disables authentication.
    pub api_key: Option<String>,
    /// Requests per second; `0` disables rate limiting.
    pub rate_limit: u32,
    /// Raw `SAMD_CORS_ORIGINS` value.
    pub cors_origins: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
        }
    }
}

impl ServerSettings {
    /// Read `SAMD_SERVER_API_KEY`, `SAMD_RATE_LIMIT` and `SAMD_CORS_ORIGINS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let rate_limit = match lookup("SAMD_RATE_LIMIT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "SAMD_RATE_LIMIT is not a number, using default");
                DEFAULT_RATE_LIMIT
            }),
            None => DEFAULT_RATE_LIMIT,
        };
        Self {
            api_key: lookup("SAMD_SERVER_API_KEY").filter(|k| !k.is_empty()),
            rate_limit,
            cors_origins: lookup("SAMD_CORS_ORIGINS"),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// `"*"` allows every origin; a comma-separated list allows those origins;
/// anything else (or nothing) allows localhost only.
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (SAMD_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => Some(hv),
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();
            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins in SAMD_CORS_ORIGINS, using localhost only");
                localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => localhost_cors(),
    }
}

fn localhost_cors() -> CorsLayer {
    let origins = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .map(HeaderValue::from_static)
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, rate
/// limiting, authentication.
pub fn create_router(state: AppState, settings: &ServerSettings) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/score", post(handlers::score_handler))
        .route("/assess", post(handlers::assess_handler))
        .route("/assess/report", post(handlers::assess_report_handler));

    match &settings.api_key {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            let key: auth::ServerKey = Arc::from(key.as_str());
            router = router.layer(axum_middleware::from_fn_with_state(
                key,
                auth::api_key_auth_middleware,
            ));
        }
        None => tracing::warn!(
            "API key authentication DISABLED - set SAMD_SERVER_API_KEY to require a bearer token"
        ),
    }

    match middleware::create_rate_limiter(settings.rate_limit) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", settings.rate_limit);
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(build_cors_layer(settings.cors_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the API on `addr` until Ctrl-C.
pub async fn run_server(
    addr: &str,
    state: AppState,
    settings: &ServerSettings,
) -> Result<(), AppError> {
    let router = create_router(state, settings);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {e}")))?;

    tracing::info!("samd-launch HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn settings_default_when_unset() {
        let settings = ServerSettings::from_lookup(|_| None);
        assert_eq!(settings, ServerSettings::default());
    }

    #[test]
    fn settings_read_all_keys() {
        let env: HashMap<&str, &str> = [
            ("SAMD_SERVER_API_KEY", "k"),
            ("SAMD_RATE_LIMIT", "0"),
            ("SAMD_CORS_ORIGINS", "*"),
        ]
        .into_iter()
        .collect();
        let settings = ServerSettings::from_lookup(|k| env.get(k).map(|v| (*v).to_string()));
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(settings.rate_limit, 0);
        assert_eq!(settings.cors_origins.as_deref(), Some("*"));
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let settings = ServerSettings::from_lookup(|k| {
            (k == "SAMD_SERVER_API_KEY").then(String::new)
        });
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn unparseable_rate_limit_falls_back() {
        let settings =
            ServerSettings::from_lookup(|k| (k == "SAMD_RATE_LIMIT").then(|| "fast".to_string()));
        assert_eq!(settings.rate_limit, DEFAULT_RATE_LIMIT);
    }
}

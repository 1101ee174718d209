//! BookTime storefront library.
//!
//! The shop, the back office and the fulfillment API as one axum
//! application. The binary wires it to `PostgreSQL`; the integration tests
//! wire the same router to the in-memory stores.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::state::AppState;

/// Deployment switches for [`app`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AppOptions {
    /// Mark the session cookie HTTPS-only.
    pub secure_cookies: bool,
    /// Throttle `/auth` and `/api` per client IP.
    pub rate_limit: bool,
}

/// Build the application router over `state`, keeping sessions in
/// `session_store`.
pub fn app<S>(state: AppState, session_store: S, options: AppOptions) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(options.rate_limit))
        .layer(middleware::create_session_layer(
            session_store,
            options.secure_cookies,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

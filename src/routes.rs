//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`           - Health check (database)
//! - `/api/v1/tours/*`        - Tour API
//! - anything else            - 404 through the error channel, including
//!   known paths hit with an unsupported method
//!
//! # Middleware
//!
//! Outermost first:
//!
//! - **Tracing** - Structured request/response logging
//! - **Request time** - Arrival timestamp used in response envelopes
//! - **Error handler** - Renders every forwarded error for the configured environment

use crate::api;
use crate::api::handlers::{health_handler, not_found_handler};
use crate::api::middleware::{error_handler, request_time, tracing};
use crate::config::Environment;
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
///
/// Trailing-slash normalization is applied around the finished router by
/// [`crate::server::run`].
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `environment` - selects development or production error bodies
pub fn app_router(state: AppState, environment: Environment) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1/tours", api::routes::tour_routes())
        .fallback(not_found_handler)
        .method_not_allowed_fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            environment,
            error_handler::layer,
        ))
        .layer(middleware::from_fn(request_time::layer))
        .layer(tracing::layer())
}

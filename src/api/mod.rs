//! REST API module using Axum
//!
//! HTTP surface of the tank service:
//! - `/api/sensors/*` for readings, PYR evaluation, current changes,
//!   feeding schedules, health checks and sensor registration
//! - `/api/system/health` for liveness
//!
//! Errors are always `{ "error": "<message>" }`.

pub mod error;
pub mod handlers;
mod routes;
pub mod validation;

pub use error::ApiError;
pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::Router;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::defaults;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `TANKWATCH_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for browser clients served from elsewhere.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match std::env::var("TANKWATCH_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/sensors", routes::sensor_routes(state.clone()))
        .nest("/api/system", routes::system_routes(state))
        // Middleware
        .layer(RequestBodyLimitLayer::new(defaults::MAX_REQUEST_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS)))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer())
}

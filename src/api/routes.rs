//! API route definitions
//!
//! - /api/sensors/* - readings, current control, feeding, health, registration
//! - /api/system/health - liveness

use axum::{routing::{get, post}, Router};

use super::handlers::{self, ApiState};

/// Routes nested under `/api/sensors`
pub fn sensor_routes(state: ApiState) -> Router {
    Router::new()
        .route("/readings", post(handlers::record_reading))
        .route("/pyr", post(handlers::process_pyr_reading))
        .route("/current", post(handlers::create_current_change))
        // Feeding
        .route("/feeding", post(handlers::update_feeding_schedule))
        .route("/feeding/:tank_id/:species", get(handlers::get_feeding_schedule))
        // Water quality
        .route("/health", post(handlers::record_health_check))
        .route("/health/:tank_id", get(handlers::get_latest_health_check))
        // Registration
        .route("/register", post(handlers::register_sensor))
        .route("/registered", get(handlers::get_registered_sensors))
        .with_state(state)
}

/// Routes nested under `/api/system`
pub fn system_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::system_health))
        .with_state(state)
}

//! Tankwatch: sensor-driven tank current control and water-quality health
//!
//! ## Architecture
//!
//! - **Control**: PYR readings plus fish detections decide temporary water
//!   currents; each tank's temporary current is reset automatically, with at
//!   most one reset pending per tank
//! - **Health**: water metrics classified HEALTHY / WARNING / CRITICAL
//! - **Storage**: pluggable repository (sled or in-memory)
//! - **API**: axum HTTP surface for the tank clients

pub mod api;
pub mod config;
pub mod control;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::TankwatchConfig;

// Re-export commonly used types
pub use types::{
    CurrentChange, FeedingSchedule, FishDetection, HealthCheck, HealthStatus, HealthThresholds,
    Orientation, SensorReading, Stored, TankId, WaterMetrics,
};

// Re-export control components
pub use control::{evaluate_health, ControlError, TankControlEvaluator, Timer, TokioTimer};

// Re-export storage
pub use storage::{InMemoryRepository, PersistenceError, SledRepository, TankRepository};

//! API route handlers
//!
//! Sensor ingestion, current control, feeding schedules, health checks and
//! sensor registration. Bodies and responses keep the field names the tank
//! clients already send.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::validation;
use crate::control::TankControlEvaluator;
use crate::storage::TankRepository;
use crate::types::{
    CurrentChange, FeedingSchedule, FishDetection, HealthCheck, HealthCheckRequest,
    HealthThresholds, RegisteredSensor, SensorReading, SensorRegistration, Stored, TankId,
};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Current control and health classification
    pub evaluator: Arc<TankControlEvaluator>,
    /// Same repository the evaluator writes to
    pub repository: Arc<dyn TankRepository>,
    pub health_thresholds: Arc<HealthThresholds>,
}

impl ApiState {
    pub fn new(evaluator: Arc<TankControlEvaluator>, health_thresholds: HealthThresholds) -> Self {
        Self {
            repository: Arc::clone(evaluator.repository()),
            evaluator,
            health_thresholds: Arc::new(health_thresholds),
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn body<T>(extracted: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    extracted.map(|Json(v)| v).map_err(ApiError::rejected)
}

fn path<T>(extracted: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    extracted.map(|Path(v)| v).map_err(ApiError::rejected)
}

// ============================================================================
// Readings
// ============================================================================

/// POST /api/sensors/readings
pub async fn record_reading(
    State(state): State<ApiState>,
    reading: Result<Json<SensorReading>, JsonRejection>,
) -> ApiResult<Stored<SensorReading>> {
    let reading = body(reading)?;
    validation::check_reading(&reading)?;

    let stored = state
        .repository
        .record_reading(&reading)
        .map_err(|e| ApiError::internal("Failed to record sensor reading", &e))?;
    tracing::debug!(
        id = stored.id,
        sensor_id = %stored.sensor_id,
        kind = ?stored.kind,
        value = stored.value,
        "Sensor reading recorded"
    );
    Ok(Json(stored))
}

/// Body of `POST /api/sensors/pyr`
#[derive(Debug, Deserialize)]
pub struct PyrRequest {
    pub reading: SensorReading,
    #[serde(default)]
    pub detections: Vec<FishDetection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PyrResponse {
    pub message: String,
    /// The temporary change applied, if the reading called for one
    pub current_change: Option<Stored<CurrentChange>>,
}

/// POST /api/sensors/pyr - evaluate a PYR reading against fish detections
pub async fn process_pyr_reading(
    State(state): State<ApiState>,
    request: Result<Json<PyrRequest>, JsonRejection>,
) -> ApiResult<PyrResponse> {
    let request = body(request)?;
    validation::check_reading(&request.reading)?;
    validation::check_detections(&request.detections)?;

    let current_change = state
        .evaluator
        .evaluate_current(&request.reading, &request.detections)
        .await
        .map_err(|e| ApiError::internal("Failed to process PYR reading", &e))?;

    Ok(Json(PyrResponse {
        message: "PYR reading processed successfully".to_string(),
        current_change,
    }))
}

// ============================================================================
// Current control
// ============================================================================

/// POST /api/sensors/current
pub async fn create_current_change(
    State(state): State<ApiState>,
    change: Result<Json<CurrentChange>, JsonRejection>,
) -> ApiResult<Stored<CurrentChange>> {
    let change = body(change)?;
    validation::check_current_change(&change)?;

    let stored = state
        .evaluator
        .apply_change(change)
        .await
        .map_err(|e| ApiError::internal("Failed to create current change", &e))?;
    Ok(Json(stored))
}

// ============================================================================
// Feeding
// ============================================================================

/// POST /api/sensors/feeding - create or replace the (tank, species) schedule
pub async fn update_feeding_schedule(
    State(state): State<ApiState>,
    schedule: Result<Json<FeedingSchedule>, JsonRejection>,
) -> ApiResult<Stored<FeedingSchedule>> {
    let schedule = body(schedule)?;
    validation::check_feeding_schedule(&schedule)?;

    let stored = state
        .repository
        .upsert_feeding_schedule(&schedule)
        .map_err(|e| ApiError::internal("Failed to update feeding schedule", &e))?;
    tracing::info!(
        tank_id = stored.tank_id,
        species = %stored.species,
        times = stored.schedule.times.len(),
        "Feeding schedule updated"
    );
    Ok(Json(stored))
}

/// GET /api/sensors/feeding/:tankId/:species
pub async fn get_feeding_schedule(
    State(state): State<ApiState>,
    params: Result<Path<(TankId, String)>, PathRejection>,
) -> ApiResult<Option<Stored<FeedingSchedule>>> {
    let (tank_id, species) = path(params)?;
    let schedule = state
        .repository
        .feeding_schedule(tank_id, &species)
        .map_err(|e| ApiError::internal("Failed to get feeding schedule", &e))?;
    Ok(Json(schedule))
}

// ============================================================================
// Health checks
// ============================================================================

/// POST /api/sensors/health - status is derived from the metrics
pub async fn record_health_check(
    State(state): State<ApiState>,
    request: Result<Json<HealthCheckRequest>, JsonRejection>,
) -> ApiResult<Stored<HealthCheck>> {
    let request = body(request)?;
    validation::check_health_request(&request)?;

    let stored = state
        .evaluator
        .record_health_check(request, &state.health_thresholds)
        .map_err(|e| ApiError::internal("Failed to record health check", &e))?;
    Ok(Json(stored))
}

/// GET /api/sensors/health/:tankId
pub async fn get_latest_health_check(
    State(state): State<ApiState>,
    tank_id: Result<Path<TankId>, PathRejection>,
) -> ApiResult<Option<Stored<HealthCheck>>> {
    let tank_id = path(tank_id)?;
    let check = state
        .repository
        .latest_health_check(tank_id)
        .map_err(|e| ApiError::internal("Failed to get latest health check", &e))?;
    Ok(Json(check))
}

// ============================================================================
// Sensor registration
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/sensors/register
pub async fn register_sensor(
    State(state): State<ApiState>,
    registration: Result<Json<SensorRegistration>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let registration = body(registration)?;
    validation::check_registration(&registration)?;

    let updated = state
        .repository
        .register_sensor(
            &registration.sensor_id,
            registration.orientation,
            registration.location,
        )
        .map_err(|e| ApiError::internal("Failed to register sensor", &e))?;
    tracing::info!(
        sensor_id = %registration.sensor_id,
        orientation = %registration.orientation,
        readings = updated,
        "Sensor registered"
    );

    Ok(Json(MessageResponse {
        message: "Sensor registered successfully".to_string(),
    }))
}

/// GET /api/sensors/registered
pub async fn get_registered_sensors(
    State(state): State<ApiState>,
) -> ApiResult<Vec<RegisteredSensor>> {
    let sensors = state
        .repository
        .registered_sensors()
        .map_err(|e| ApiError::internal("Failed to get registered sensors", &e))?;
    Ok(Json(sensors))
}

// ============================================================================
// System
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemHealthResponse {
    pub status: String,
    /// Storage backend name
    pub storage: String,
    /// Tanks with a current reset waiting to fire
    pub pending_resets: usize,
}

/// GET /api/system/health
pub async fn system_health(State(state): State<ApiState>) -> Json<SystemHealthResponse> {
    Json(SystemHealthResponse {
        status: "ok".to_string(),
        storage: state.repository.backend_name().to_string(),
        pending_resets: state.evaluator.pending_resets().await,
    })
}

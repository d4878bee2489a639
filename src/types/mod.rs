//! Shared record types for tank telemetry and control
//!
//! This module defines the records that flow through the service:
//! - Sensor side: SensorReading, RegisteredSensor, FishDetection
//! - Control side: CurrentChange (temporary adjustments and their resets)
//! - Husbandry: FeedingSchedule, HealthCheck with its WaterMetrics
//!
//! Every record serializes with the snake_case field names used by the
//! `/api/sensors` contract. Persisted records are wrapped in [`Stored`].

mod current;
mod detection;
mod feeding;
mod health;
mod sensor;
pub mod thresholds;

pub use current::*;
pub use detection::*;
pub use feeding::*;
pub use health::*;
pub use sensor::*;
pub use thresholds::{BandThreshold, CeilingThreshold, FloorThreshold, HealthThresholds};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tank identifier as used by the fishery backend.
pub type TankId = i64;

/// Point or vector in tank coordinates.
///
/// Detection positions are normalized to 0..1 per axis; sensor locations and
/// velocities use the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ============================================================================
// Persisted record envelope
// ============================================================================

/// A record as returned by the repository: storage-assigned `id` plus audit
/// timestamps, flattened beside the record's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: u64,
    #[serde(flatten)]
    pub record: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<T> Stored<T> {
    /// Wrap a freshly inserted record.
    pub const fn new(id: u64, record: T, now: DateTime<Utc>) -> Self {
        Self {
            id,
            record,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the record in place, keeping `id` and `created_at`.
    pub fn replace(&mut self, record: T, now: DateTime<Utc>) {
        self.record = record;
        self.updated_at = now;
    }
}

impl<T> std::ops::Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_flattens_record_fields() {
        let now = Utc::now();
        let stored = Stored::new(7, CurrentChange::reset(3, now), now);
        let json = serde_json::to_value(&stored).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["tank_id"], 3);
        assert_eq!(json["value"], 0.0);
        assert_eq!(json["is_temporary"], false);
        assert!(json.get("created_at").is_some());
        assert!(json.get("record").is_none());
    }

    #[test]
    fn test_stored_replace_keeps_identity() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(5);
        let mut stored = Stored::new(1, CurrentChange::reset(1, t0), t0);
        stored.replace(CurrentChange::temporary(1, 0.3, 5000, t1), t1);

        assert_eq!(stored.id, 1);
        assert_eq!(stored.created_at, t0);
        assert_eq!(stored.updated_at, t1);
        assert!((stored.value - 0.3).abs() < f64::EPSILON);
    }
}

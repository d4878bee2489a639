//! Fixed physical sensors mounted in a tank

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Vec3;

/// Kind of quantity a sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorType {
    /// Pyroelectric presence/motion sensor
    Pyr,
    Current,
    Temperature,
    Ph,
}

/// Mounting orientation of a sensor; decides which zone of the tank it watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    Up,
    Down,
    Side,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Up => write!(f, "UP"),
            Orientation::Down => write!(f, "DOWN"),
            Orientation::Side => write!(f, "SIDE"),
        }
    }
}

/// One orientation-tagged sample from a fixed sensor.
///
/// Immutable once recorded, except for the registration fields which are set
/// exactly once when an operator registers the physical sensor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: SensorType,
    #[serde(default)]
    pub location: Vec3,
    /// Unset orientation means the reading never drives a current change.
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub is_registered: bool,
}

impl SensorReading {
    /// Apply an operator registration. Returns `false` if the reading was
    /// already registered and therefore left untouched.
    pub fn register(&mut self, orientation: Orientation, location: Vec3) -> bool {
        if self.is_registered {
            return false;
        }
        self.orientation = Some(orientation);
        self.location = location;
        self.is_registered = true;
        true
    }
}

/// Body of `POST /api/sensors/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorRegistration {
    #[serde(rename = "sensorId")]
    pub sensor_id: String,
    pub orientation: Orientation,
    pub location: Vec3,
}

/// One entry per distinct registered sensor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredSensor {
    pub sensor_id: String,
    pub orientation: Orientation,
    pub location: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_deserializes_contract_shape() {
        let json = serde_json::json!({
            "id": 1,
            "sensor_id": "pyr_001",
            "timestamp": "2024-03-01T12:00:00Z",
            "value": 0.8,
            "type": "PYR",
            "location": { "x": 0.5, "y": 0.9, "z": 0.5 },
            "orientation": "UP",
            "is_registered": true,
            "created_at": "2024-03-01T12:00:00Z",
            "updated_at": "2024-03-01T12:00:00Z"
        });

        let reading: SensorReading = serde_json::from_value(json).unwrap();
        assert_eq!(reading.kind, SensorType::Pyr);
        assert_eq!(reading.orientation, Some(Orientation::Up));
        assert!(reading.is_registered);
    }

    #[test]
    fn test_missing_orientation_is_none() {
        let json = serde_json::json!({ "sensor_id": "ph_7", "value": 7.4, "type": "PH" });
        let reading: SensorReading = serde_json::from_value(json).unwrap();
        assert_eq!(reading.orientation, None);
        assert!(!reading.is_registered);
    }

    #[test]
    fn test_register_flips_once() {
        let mut reading: SensorReading = serde_json::from_value(
            serde_json::json!({ "sensor_id": "pyr_002", "value": 0.1, "type": "PYR" }),
        )
        .unwrap();

        assert!(reading.register(Orientation::Side, Vec3::new(0.0, 0.5, 0.5)));
        assert!(!reading.register(Orientation::Up, Vec3::new(1.0, 1.0, 1.0)));
        assert_eq!(reading.orientation, Some(Orientation::Side));
        assert_eq!(reading.location, Vec3::new(0.0, 0.5, 0.5));
    }
}

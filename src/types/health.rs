//! Water-quality health checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TankId;

/// The six water-quality measurements a health check is classified from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterMetrics {
    /// °C
    pub temperature: f64,
    pub ph: f64,
    /// mg/L dissolved oxygen
    pub oxygen: f64,
    /// mg/L
    pub ammonia: f64,
    /// mg/L
    pub nitrite: f64,
    /// mg/L
    pub nitrate: f64,
}

impl WaterMetrics {
    /// Iterate `(metric, value)` pairs in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (WaterMetric, f64)> {
        [
            (WaterMetric::Temperature, self.temperature),
            (WaterMetric::Ph, self.ph),
            (WaterMetric::Oxygen, self.oxygen),
            (WaterMetric::Ammonia, self.ammonia),
            (WaterMetric::Nitrite, self.nitrite),
            (WaterMetric::Nitrate, self.nitrate),
        ]
        .into_iter()
    }
}

/// Name of a single water-quality metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterMetric {
    Temperature,
    Ph,
    Oxygen,
    Ammonia,
    Nitrite,
    Nitrate,
}

impl std::fmt::Display for WaterMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WaterMetric::Temperature => "temperature",
            WaterMetric::Ph => "ph",
            WaterMetric::Oxygen => "oxygen",
            WaterMetric::Ammonia => "ammonia",
            WaterMetric::Nitrite => "nitrite",
            WaterMetric::Nitrate => "nitrate",
        };
        f.write_str(name)
    }
}

/// Coarse three-level classification of water quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Warning => write!(f, "WARNING"),
            HealthStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Body of `POST /api/sensors/health`. Any `status` sent by the client is
/// ignored; it is always derived from `metrics`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthCheckRequest {
    pub tank_id: TankId,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub species: String,
    pub metrics: WaterMetrics,
    #[serde(default)]
    pub notes: String,
}

/// A point-in-time water-quality assessment for one (tank, species).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub tank_id: TankId,
    pub timestamp: DateTime<Utc>,
    pub species: String,
    pub metrics: WaterMetrics,
    pub status: HealthStatus,
    pub notes: String,
}

impl HealthCheck {
    pub fn from_request(request: HealthCheckRequest, status: HealthStatus) -> Self {
        Self {
            tank_id: request.tank_id,
            timestamp: request.timestamp,
            species: request.species,
            metrics: request.metrics,
            status,
            notes: request.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ignores_client_status() {
        let json = serde_json::json!({
            "tank_id": 2,
            "species": "salmon",
            "metrics": {
                "temperature": 24.0, "ph": 7.5, "oxygen": 8.0,
                "ammonia": 0.0, "nitrite": 0.0, "nitrate": 0.0
            },
            "status": "CRITICAL",
            "notes": "weekly"
        });

        let request: HealthCheckRequest = serde_json::from_value(json).unwrap();
        let check = HealthCheck::from_request(request, HealthStatus::Healthy);
        assert_eq!(check.status, HealthStatus::Healthy);
        assert_eq!(check.notes, "weekly");
    }

    #[test]
    fn test_status_ordering() {
        assert!(HealthStatus::Critical > HealthStatus::Warning);
        assert!(HealthStatus::Warning > HealthStatus::Healthy);
    }
}

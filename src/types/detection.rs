//! Fish sightings produced by the vision pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::thresholds::current_control::ACTIVE_CONFIDENCE;
use super::{TankId, Vec3};

/// One fish sighting. Positions are normalized 0..1 per axis, with `y`
/// growing towards the bottom of the tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishDetection {
    pub tank_id: TankId,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub fish_id: String,
    pub position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    pub confidence: f64,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub size: f64,
}

impl FishDetection {
    /// Whether the detection is confident enough to influence current control.
    pub fn is_active(&self) -> bool {
        self.confidence > ACTIVE_CONFIDENCE
    }
}

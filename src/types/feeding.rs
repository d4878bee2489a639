//! Per-(tank, species) feeding plans

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TankId;

/// When, how much, and what to feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingPlan {
    /// Times of day in `HH:mm`
    pub times: Vec<String>,
    /// Grams per feeding
    pub amount: f64,
    #[serde(rename = "type")]
    pub food_type: String,
}

/// Feeding schedule, unique per `(tank_id, species)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingSchedule {
    pub tank_id: TankId,
    pub species: String,
    pub schedule: FeedingPlan,
    #[serde(default)]
    pub last_fed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_feeding: Option<DateTime<Utc>>,
}

impl FeedingSchedule {
    /// Uniqueness key used for upserts.
    pub fn key(&self) -> (TankId, &str) {
        (self.tank_id, self.species.as_str())
    }
}

//! Water-current directives

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::TankId;

/// A directive to alter a tank's water current.
///
/// The sign of `value` encodes direction along the sensor's axis, its
/// magnitude the strength. `duration` is in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentChange {
    pub tank_id: TankId,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub is_temporary: bool,
}

impl CurrentChange {
    /// A time-bounded adjustment that must be reverted after `duration_ms`.
    pub const fn temporary(
        tank_id: TankId,
        value: f64,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            tank_id,
            timestamp,
            value,
            duration: duration_ms,
            is_temporary: true,
        }
    }

    /// The zero-value record appended when a temporary change expires.
    pub const fn reset(tank_id: TankId, timestamp: DateTime<Utc>) -> Self {
        Self {
            tank_id,
            timestamp,
            value: 0.0,
            duration: 0,
            is_temporary: false,
        }
    }

    /// Temporary, non-zero changes are followed by an automatic reset.
    pub fn needs_reset(&self) -> bool {
        self.is_temporary && self.value != 0.0
    }

    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration)
    }

    pub fn is_reset(&self) -> bool {
        !self.is_temporary && self.value == 0.0 && self.duration == 0
    }
}

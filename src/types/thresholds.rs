//! Current-control policy constants and water-quality health thresholds

use serde::{Deserialize, Serialize};

/// Decision policy for temporary current changes
pub mod current_control {
    /// Detections at or below this confidence are ignored
    pub const ACTIVE_CONFIDENCE: f64 = 0.7;

    // === Zones (normalized tank coordinates) ===
    /// Mean depth below this is the surface zone (UP sensors)
    pub const SURFACE_ZONE_MAX_Y: f64 = 0.3;
    /// Mean depth above this is the bottom zone (DOWN sensors)
    pub const BOTTOM_ZONE_MIN_Y: f64 = 0.7;
    /// Mean x below this is the left zone (SIDE sensors)
    pub const LEFT_ZONE_MAX_X: f64 = 0.3;
    /// Mean x above this is the right zone (SIDE sensors)
    pub const RIGHT_ZONE_MIN_X: f64 = 0.7;

    // === Responses ===
    /// Current pushing surface fish down; negated for bottom fish
    pub const VERTICAL_CURRENT: f64 = 0.5;
    /// Current pushing left-side fish right; negated for right-side fish
    pub const HORIZONTAL_CURRENT: f64 = 0.3;
    /// Vertical adjustments are short (ms)
    pub const VERTICAL_DURATION_MS: u64 = 3_000;
    /// Default adjustment duration (ms)
    pub const DEFAULT_DURATION_MS: u64 = 5_000;
}

/// Default water-quality limits
pub mod water_quality {
    // === Temperature (°C) ===
    pub const TEMPERATURE_MIN: f64 = 20.0;
    pub const TEMPERATURE_MAX: f64 = 28.0;
    pub const TEMPERATURE_IDEAL: f64 = 24.0;
    pub const TEMPERATURE_TOLERANCE: f64 = 2.0;

    // === pH ===
    pub const PH_MIN: f64 = 6.5;
    pub const PH_MAX: f64 = 8.5;
    pub const PH_IDEAL: f64 = 7.5;
    pub const PH_TOLERANCE: f64 = 0.5;

    // === Dissolved oxygen (mg/L) ===
    pub const OXYGEN_CRITICAL_BELOW: f64 = 5.0;
    pub const OXYGEN_WARNING_BELOW: f64 = 8.0;

    // === Nitrogen compounds (mg/L) ===
    pub const AMMONIA_MAX: f64 = 0.25;
    pub const NITRITE_MAX: f64 = 0.5;
    pub const NITRATE_MAX: f64 = 40.0;

    /// Fraction of a ceiling above which a reading is a warning
    pub const CEILING_WARNING_FRACTION: f64 = 0.8;
}

// ============================================================================
// Health thresholds (operator-tunable, defaults above)
// ============================================================================

/// Which bucket a single metric falls into, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breach {
    Warning,
    Critical,
}

/// Metric with a safe band and an ideal point inside it (temperature, pH).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThreshold {
    pub critical_min: f64,
    pub critical_max: f64,
    pub ideal: f64,
    /// Allowed deviation from `ideal` before a warning
    pub tolerance: f64,
}

impl BandThreshold {
    pub fn classify(&self, value: f64) -> Option<Breach> {
        if value < self.critical_min || value > self.critical_max {
            Some(Breach::Critical)
        } else if (value - self.ideal).abs() > self.tolerance {
            Some(Breach::Warning)
        } else {
            None
        }
    }
}

/// Metric that is only dangerous when low (dissolved oxygen).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorThreshold {
    pub critical_below: f64,
    pub warning_below: f64,
}

impl FloorThreshold {
    pub fn classify(&self, value: f64) -> Option<Breach> {
        if value < self.critical_below {
            Some(Breach::Critical)
        } else if value < self.warning_below {
            Some(Breach::Warning)
        } else {
            None
        }
    }
}

/// Metric that is only dangerous when high (ammonia, nitrite, nitrate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CeilingThreshold {
    pub max: f64,
}

impl CeilingThreshold {
    pub fn classify(&self, value: f64, warning_fraction: f64) -> Option<Breach> {
        if value > self.max {
            Some(Breach::Critical)
        } else if value > self.max * warning_fraction {
            Some(Breach::Warning)
        } else {
            None
        }
    }
}

/// Full set of water-quality thresholds, loaded from the `[health]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    pub temperature: BandThreshold,
    pub ph: BandThreshold,
    pub oxygen: FloorThreshold,
    pub ammonia: CeilingThreshold,
    pub nitrite: CeilingThreshold,
    pub nitrate: CeilingThreshold,
    pub ceiling_warning_fraction: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        use water_quality::*;
        Self {
            temperature: BandThreshold {
                critical_min: TEMPERATURE_MIN,
                critical_max: TEMPERATURE_MAX,
                ideal: TEMPERATURE_IDEAL,
                tolerance: TEMPERATURE_TOLERANCE,
            },
            ph: BandThreshold {
                critical_min: PH_MIN,
                critical_max: PH_MAX,
                ideal: PH_IDEAL,
                tolerance: PH_TOLERANCE,
            },
            oxygen: FloorThreshold {
                critical_below: OXYGEN_CRITICAL_BELOW,
                warning_below: OXYGEN_WARNING_BELOW,
            },
            ammonia: CeilingThreshold { max: AMMONIA_MAX },
            nitrite: CeilingThreshold { max: NITRITE_MAX },
            nitrate: CeilingThreshold { max: NITRATE_MAX },
            ceiling_warning_fraction: CEILING_WARNING_FRACTION,
        }
    }
}

impl HealthThresholds {
    /// Check internal consistency, returning one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, band) in [("temperature", &self.temperature), ("ph", &self.ph)] {
            if band.critical_min >= band.critical_max {
                errors.push(format!(
                    "health.{name}: critical_min ({}) must be below critical_max ({})",
                    band.critical_min, band.critical_max
                ));
            }
            if band.ideal < band.critical_min || band.ideal > band.critical_max {
                errors.push(format!(
                    "health.{name}: ideal ({}) must lie within [{}, {}]",
                    band.ideal, band.critical_min, band.critical_max
                ));
            }
            if band.tolerance < 0.0 {
                errors.push(format!("health.{name}: tolerance must not be negative"));
            } else if band.ideal - band.tolerance < band.critical_min
                || band.ideal + band.tolerance > band.critical_max
            {
                errors.push(format!(
                    "health.{name}: ideal ± tolerance ({} ± {}) must lie within [{}, {}]",
                    band.ideal, band.tolerance, band.critical_min, band.critical_max
                ));
            }
        }

        if self.oxygen.critical_below > self.oxygen.warning_below {
            errors.push(format!(
                "health.oxygen: critical_below ({}) must not exceed warning_below ({})",
                self.oxygen.critical_below, self.oxygen.warning_below
            ));
        }

        for (name, ceiling) in [
            ("ammonia", &self.ammonia),
            ("nitrite", &self.nitrite),
            ("nitrate", &self.nitrate),
        ] {
            if ceiling.max <= 0.0 {
                errors.push(format!("health.{name}: max must be positive"));
            }
        }

        if !(self.ceiling_warning_fraction > 0.0 && self.ceiling_warning_fraction <= 1.0) {
            errors.push(format!(
                "health.ceiling_warning_fraction ({}) must be in (0, 1]",
                self.ceiling_warning_fraction
            ));
        }

        errors
    }
}

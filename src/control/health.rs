//! Water-quality classifier
//!
//! Every metric lands in at most one bucket (critical or warning). Any
//! critical metric makes the check CRITICAL; otherwise any warning makes it
//! WARNING; otherwise it is HEALTHY. No state, safe to call from anywhere.

use crate::types::thresholds::Breach;
use crate::types::{HealthStatus, HealthThresholds, WaterMetric, WaterMetrics};

/// Classification result with the metrics that drove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthAssessment {
    pub status: HealthStatus,
    pub critical: Vec<WaterMetric>,
    pub warnings: Vec<WaterMetric>,
}

/// Classify `metrics` against the default thresholds.
pub fn evaluate_health(metrics: &WaterMetrics) -> HealthStatus {
    assess_health(metrics, &HealthThresholds::default()).status
}

/// Classify `metrics` against `thresholds`, reporting each breached metric.
pub fn assess_health(metrics: &WaterMetrics, thresholds: &HealthThresholds) -> HealthAssessment {
    let mut critical = Vec::new();
    let mut warnings = Vec::new();

    for (metric, value) in metrics.iter() {
        let breach = match metric {
            WaterMetric::Temperature => thresholds.temperature.classify(value),
            WaterMetric::Ph => thresholds.ph.classify(value),
            WaterMetric::Oxygen => thresholds.oxygen.classify(value),
            WaterMetric::Ammonia => thresholds
                .ammonia
                .classify(value, thresholds.ceiling_warning_fraction),
            WaterMetric::Nitrite => thresholds
                .nitrite
                .classify(value, thresholds.ceiling_warning_fraction),
            WaterMetric::Nitrate => thresholds
                .nitrate
                .classify(value, thresholds.ceiling_warning_fraction),
        };

        match breach {
            Some(Breach::Critical) => critical.push(metric),
            Some(Breach::Warning) => warnings.push(metric),
            None => {}
        }
    }

    let status = if !critical.is_empty() {
        HealthStatus::Critical
    } else if !warnings.is_empty() {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    HealthAssessment {
        status,
        critical,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ideal() -> WaterMetrics {
        WaterMetrics {
            temperature: 24.0,
            ph: 7.5,
            oxygen: 8.0,
            ammonia: 0.0,
            nitrite: 0.0,
            nitrate: 0.0,
        }
    }

    #[test]
    fn test_ideal_water_is_healthy() {
        assert_eq!(evaluate_health(&ideal()), HealthStatus::Healthy);
    }

    #[test]
    fn test_cold_water_is_critical() {
        let metrics = WaterMetrics {
            temperature: 19.0,
            ..ideal()
        };
        assert_eq!(evaluate_health(&metrics), HealthStatus::Critical);
    }

    #[test]
    fn test_temperature_drift_is_warning() {
        let metrics = WaterMetrics {
            temperature: 26.5,
            ..ideal()
        };
        assert_eq!(evaluate_health(&metrics), HealthStatus::Warning);
    }

    #[test]
    fn test_ph_bands() {
        let warn = WaterMetrics { ph: 8.1, ..ideal() };
        let crit = WaterMetrics { ph: 8.6, ..ideal() };
        let ok = WaterMetrics { ph: 7.0, ..ideal() };
        assert_eq!(evaluate_health(&warn), HealthStatus::Warning);
        assert_eq!(evaluate_health(&crit), HealthStatus::Critical);
        assert_eq!(evaluate_health(&ok), HealthStatus::Healthy);
    }

    #[test]
    fn test_oxygen_floor() {
        assert_eq!(
            evaluate_health(&WaterMetrics { oxygen: 7.9, ..ideal() }),
            HealthStatus::Warning
        );
        assert_eq!(
            evaluate_health(&WaterMetrics { oxygen: 4.9, ..ideal() }),
            HealthStatus::Critical
        );
    }

    #[test]
    fn test_nitrogen_ceilings() {
        assert_eq!(
            evaluate_health(&WaterMetrics { ammonia: 0.22, ..ideal() }),
            HealthStatus::Warning
        );
        assert_eq!(
            evaluate_health(&WaterMetrics { ammonia: 0.3, ..ideal() }),
            HealthStatus::Critical
        );
        assert_eq!(
            evaluate_health(&WaterMetrics { nitrite: 0.45, ..ideal() }),
            HealthStatus::Warning
        );
        assert_eq!(
            evaluate_health(&WaterMetrics { nitrate: 35.0, ..ideal() }),
            HealthStatus::Warning
        );
        assert_eq!(
            evaluate_health(&WaterMetrics { nitrate: 41.0, ..ideal() }),
            HealthStatus::Critical
        );
        assert_eq!(
            evaluate_health(&WaterMetrics { nitrate: 30.0, ..ideal() }),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_critical_wins_over_warnings() {
        let metrics = WaterMetrics {
            temperature: 26.5,
            ph: 8.2,
            oxygen: 4.0,
            ..ideal()
        };
        let assessment = assess_health(&metrics, &HealthThresholds::default());
        assert_eq!(assessment.status, HealthStatus::Critical);
        assert_eq!(assessment.critical, vec![WaterMetric::Oxygen]);
        assert_eq!(assessment.warnings, vec![WaterMetric::Temperature, WaterMetric::Ph]);
    }

    #[test]
    fn test_metric_counts_in_one_bucket_only() {
        let metrics = WaterMetrics {
            temperature: 30.0,
            ..ideal()
        };
        let assessment = assess_health(&metrics, &HealthThresholds::default());
        assert_eq!(assessment.critical, vec![WaterMetric::Temperature]);
        assert!(assessment.warnings.is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        let mut thresholds = HealthThresholds::default();
        thresholds.temperature.critical_min = 10.0;
        thresholds.temperature.ideal = 14.0;

        let metrics = WaterMetrics {
            temperature: 14.5,
            ..ideal()
        };
        assert_eq!(assess_health(&metrics, &thresholds).status, HealthStatus::Healthy);
        assert_eq!(evaluate_health(&metrics), HealthStatus::Critical);
    }
}

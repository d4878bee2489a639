//! Current-decision policy
//!
//! Fish clustering in the zone a sensor watches get nudged out of it with a
//! short, directional current. The decision is a pure function so it can be
//! tested without storage or timers.

use crate::types::thresholds::current_control::*;
use crate::types::{FishDetection, Orientation, SensorReading, TankId};

/// A non-zero current adjustment chosen for one tank.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentDecision {
    /// Taken from the first active detection, not from the reading
    pub tank_id: TankId,
    pub value: f64,
    pub duration_ms: u64,
    pub active_fish: usize,
    pub avg_x: f64,
    pub avg_y: f64,
}

/// Decide whether `reading` and `detections` call for a temporary current.
///
/// Returns `None` when no detection is active, when the reading carries no
/// orientation, or when the active fish sit outside the watched zone.
pub fn decide_current(
    reading: &SensorReading,
    detections: &[FishDetection],
) -> Option<CurrentDecision> {
    let active: Vec<&FishDetection> = detections.iter().filter(|d| d.is_active()).collect();
    let first = active.first()?;

    let count = active.len() as f64;
    let avg_x = active.iter().map(|d| d.position.x).sum::<f64>() / count;
    let avg_y = active.iter().map(|d| d.position.y).sum::<f64>() / count;

    let (value, duration_ms) = match reading.orientation? {
        Orientation::Up if avg_y < SURFACE_ZONE_MAX_Y => (VERTICAL_CURRENT, VERTICAL_DURATION_MS),
        Orientation::Down if avg_y > BOTTOM_ZONE_MIN_Y => (-VERTICAL_CURRENT, VERTICAL_DURATION_MS),
        Orientation::Side if avg_x < LEFT_ZONE_MAX_X => (HORIZONTAL_CURRENT, DEFAULT_DURATION_MS),
        Orientation::Side if avg_x > RIGHT_ZONE_MIN_X => (-HORIZONTAL_CURRENT, DEFAULT_DURATION_MS),
        _ => return None,
    };

    Some(CurrentDecision {
        tank_id: first.tank_id,
        value,
        duration_ms,
        active_fish: active.len(),
        avg_x,
        avg_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SensorType, Vec3};
    use chrono::Utc;

    fn reading(orientation: Option<Orientation>) -> SensorReading {
        SensorReading {
            sensor_id: "pyr_001".to_string(),
            timestamp: Utc::now(),
            value: 0.8,
            kind: SensorType::Pyr,
            location: Vec3::new(0.5, 0.9, 0.5),
            orientation,
            is_registered: true,
        }
    }

    fn fish(tank_id: TankId, x: f64, y: f64, confidence: f64) -> FishDetection {
        FishDetection {
            tank_id,
            timestamp: Utc::now(),
            fish_id: format!("fish_{tank_id}_{x}_{y}"),
            position: Vec3::new(x, y, 0.5),
            velocity: Vec3::default(),
            confidence,
            species: "salmon".to_string(),
            size: 12.0,
        }
    }

    #[test]
    fn test_no_active_fish_no_action() {
        let detections = vec![fish(1, 0.1, 0.1, 0.7), fish(1, 0.2, 0.1, 0.3)];
        for orientation in [Orientation::Up, Orientation::Down, Orientation::Side] {
            assert_eq!(decide_current(&reading(Some(orientation)), &detections), None);
        }
        assert_eq!(decide_current(&reading(Some(Orientation::Up)), &[]), None);
    }

    #[test]
    fn test_up_surface_boundary() {
        let up = reading(Some(Orientation::Up));

        let decision = decide_current(&up, &[fish(1, 0.5, 0.29, 0.9)]).unwrap();
        assert!((decision.value - 0.5).abs() < f64::EPSILON);
        assert_eq!(decision.duration_ms, 3000);

        assert_eq!(decide_current(&up, &[fish(1, 0.5, 0.3, 0.9)]), None);
    }

    #[test]
    fn test_down_bottom_boundary() {
        let down = reading(Some(Orientation::Down));

        let decision = decide_current(&down, &[fish(1, 0.5, 0.71, 0.9)]).unwrap();
        assert!((decision.value + 0.5).abs() < f64::EPSILON);
        assert_eq!(decision.duration_ms, 3000);

        assert_eq!(decide_current(&down, &[fish(1, 0.5, 0.7, 0.9)]), None);
    }

    #[test]
    fn test_side_zones() {
        let side = reading(Some(Orientation::Side));

        let left = decide_current(&side, &[fish(1, 0.2, 0.5, 0.9)]).unwrap();
        assert!((left.value - 0.3).abs() < f64::EPSILON);
        assert_eq!(left.duration_ms, 5000);

        let right = decide_current(&side, &[fish(1, 0.8, 0.5, 0.9)]).unwrap();
        assert!((right.value + 0.3).abs() < f64::EPSILON);
        assert_eq!(right.duration_ms, 5000);

        assert_eq!(decide_current(&side, &[fish(1, 0.5, 0.5, 0.9)]), None);
    }

    #[test]
    fn test_side_ignores_depth_and_up_ignores_x() {
        assert_eq!(
            decide_current(&reading(Some(Orientation::Side)), &[fish(1, 0.5, 0.05, 0.9)]),
            None
        );
        assert_eq!(
            decide_current(&reading(Some(Orientation::Up)), &[fish(1, 0.05, 0.5, 0.9)]),
            None
        );
    }

    #[test]
    fn test_unset_orientation_no_action() {
        assert_eq!(decide_current(&reading(None), &[fish(1, 0.1, 0.1, 0.95)]), None);
    }

    #[test]
    fn test_mean_uses_only_active_fish() {
        // The low-confidence fish deep in the tank must not drag the mean down.
        let detections = vec![
            fish(4, 0.5, 0.1, 0.9),
            fish(4, 0.5, 0.2, 0.8),
            fish(4, 0.5, 0.95, 0.5),
        ];
        let decision = decide_current(&reading(Some(Orientation::Up)), &detections).unwrap();
        assert_eq!(decision.active_fish, 2);
        assert!((decision.avg_y - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_tank_taken_from_first_active_fish() {
        let detections = vec![fish(9, 0.1, 0.1, 0.2), fish(3, 0.1, 0.1, 0.9), fish(5, 0.1, 0.1, 0.9)];
        let decision = decide_current(&reading(Some(Orientation::Up)), &detections).unwrap();
        assert_eq!(decision.tank_id, 3);
    }
}

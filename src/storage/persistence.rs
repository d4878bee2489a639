//! Pluggable storage backend for tank records
//!
//! Abstracts record persistence so the control loop and HTTP handlers never
//! depend on a concrete store:
//! - `InMemoryRepository`: in-memory store for tests and ephemeral runs
//! - `SledRepository`: durable embedded store (see `sled_backend`)

use chrono::Utc;

use crate::types::{
    CurrentChange, FeedingSchedule, HealthCheck, Orientation, RegisteredSensor, SensorReading,
    Stored, TankId, Vec3,
};

/// Trait for pluggable persistence backends
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks. Current changes and health checks are append-only.
pub trait TankRepository: Send + Sync {
    /// Store a sensor reading
    fn record_reading(&self, reading: &SensorReading)
        -> Result<Stored<SensorReading>, PersistenceError>;

    /// Register every still-unregistered reading of `sensor_id`.
    /// Returns the number of readings updated.
    fn register_sensor(
        &self,
        sensor_id: &str,
        orientation: Orientation,
        location: Vec3,
    ) -> Result<usize, PersistenceError>;

    /// One entry per distinct registered sensor id, in first-seen order
    fn registered_sensors(&self) -> Result<Vec<RegisteredSensor>, PersistenceError>;

    /// Append a current change (triggering change or reset)
    fn append_current_change(
        &self,
        change: &CurrentChange,
    ) -> Result<Stored<CurrentChange>, PersistenceError>;

    /// All current changes of a tank, oldest first
    fn current_changes(&self, tank_id: TankId)
        -> Result<Vec<Stored<CurrentChange>>, PersistenceError>;

    /// Create or update the schedule for `(tank_id, species)`
    fn upsert_feeding_schedule(
        &self,
        schedule: &FeedingSchedule,
    ) -> Result<Stored<FeedingSchedule>, PersistenceError>;

    fn feeding_schedule(
        &self,
        tank_id: TankId,
        species: &str,
    ) -> Result<Option<Stored<FeedingSchedule>>, PersistenceError>;

    /// Append a classified health check
    fn append_health_check(&self, check: &HealthCheck)
        -> Result<Stored<HealthCheck>, PersistenceError>;

    /// Most recent check of a tank by `timestamp`
    fn latest_health_check(
        &self,
        tank_id: TankId,
    ) -> Result<Option<Stored<HealthCheck>>, PersistenceError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Collapse registered readings to one entry per sensor id.
pub(crate) fn distinct_registered<'a>(
    readings: impl Iterator<Item = &'a SensorReading>,
) -> Vec<RegisteredSensor> {
    let mut seen = std::collections::HashSet::new();
    readings
        .filter(|r| r.is_registered)
        .filter_map(|r| {
            let orientation = r.orientation?;
            seen.insert(r.sensor_id.clone()).then(|| RegisteredSensor {
                sensor_id: r.sensor_id.clone(),
                orientation,
                location: r.location,
            })
        })
        .collect()
}

/// Pick the newest check by timestamp; later insertions win ties.
pub(crate) fn newest_check<'a>(
    checks: impl Iterator<Item = &'a Stored<HealthCheck>>,
) -> Option<Stored<HealthCheck>> {
    checks
        .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
        .cloned()
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Default)]
struct Tables {
    next_id: u64,
    readings: Vec<Stored<SensorReading>>,
    current_changes: Vec<Stored<CurrentChange>>,
    feeding_schedules: Vec<Stored<FeedingSchedule>>,
    health_checks: Vec<Stored<HealthCheck>>,
}

impl Tables {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory persistence for testing and ephemeral deployments
///
/// Thread-safe via `RwLock`. Not durable; data is lost on restart.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: std::sync::RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, PersistenceError> {
        self.tables
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, PersistenceError> {
        self.tables
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))
    }
}

impl TankRepository for InMemoryRepository {
    fn record_reading(
        &self,
        reading: &SensorReading,
    ) -> Result<Stored<SensorReading>, PersistenceError> {
        let mut tables = self.write()?;
        let stored = Stored::new(tables.allocate_id(), reading.clone(), Utc::now());
        tables.readings.push(stored.clone());
        Ok(stored)
    }

    fn register_sensor(
        &self,
        sensor_id: &str,
        orientation: Orientation,
        location: Vec3,
    ) -> Result<usize, PersistenceError> {
        let mut tables = self.write()?;
        let now = Utc::now();
        let mut updated = 0;
        for stored in tables.readings.iter_mut().filter(|r| r.sensor_id == sensor_id) {
            if stored.record.register(orientation, location) {
                stored.updated_at = now;
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn registered_sensors(&self) -> Result<Vec<RegisteredSensor>, PersistenceError> {
        let tables = self.read()?;
        Ok(distinct_registered(tables.readings.iter().map(|s| &s.record)))
    }

    fn append_current_change(
        &self,
        change: &CurrentChange,
    ) -> Result<Stored<CurrentChange>, PersistenceError> {
        let mut tables = self.write()?;
        let stored = Stored::new(tables.allocate_id(), change.clone(), Utc::now());
        tables.current_changes.push(stored.clone());
        Ok(stored)
    }

    fn current_changes(
        &self,
        tank_id: TankId,
    ) -> Result<Vec<Stored<CurrentChange>>, PersistenceError> {
        let tables = self.read()?;
        Ok(tables
            .current_changes
            .iter()
            .filter(|c| c.tank_id == tank_id)
            .cloned()
            .collect())
    }

    fn upsert_feeding_schedule(
        &self,
        schedule: &FeedingSchedule,
    ) -> Result<Stored<FeedingSchedule>, PersistenceError> {
        let mut tables = self.write()?;
        let now = Utc::now();

        if let Some(existing) = tables
            .feeding_schedules
            .iter_mut()
            .find(|s| s.key() == schedule.key())
        {
            existing.replace(schedule.clone(), now);
            return Ok(existing.clone());
        }

        let stored = Stored::new(tables.allocate_id(), schedule.clone(), now);
        tables.feeding_schedules.push(stored.clone());
        Ok(stored)
    }

    fn feeding_schedule(
        &self,
        tank_id: TankId,
        species: &str,
    ) -> Result<Option<Stored<FeedingSchedule>>, PersistenceError> {
        let tables = self.read()?;
        Ok(tables
            .feeding_schedules
            .iter()
            .find(|s| s.key() == (tank_id, species))
            .cloned())
    }

    fn append_health_check(
        &self,
        check: &HealthCheck,
    ) -> Result<Stored<HealthCheck>, PersistenceError> {
        let mut tables = self.write()?;
        let stored = Stored::new(tables.allocate_id(), check.clone(), Utc::now());
        tables.health_checks.push(stored.clone());
        Ok(stored)
    }

    fn latest_health_check(
        &self,
        tank_id: TankId,
    ) -> Result<Option<Stored<HealthCheck>>, PersistenceError> {
        let tables = self.read()?;
        Ok(newest_check(
            tables.health_checks.iter().filter(|c| c.tank_id == tank_id),
        ))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeedingPlan, HealthStatus, SensorType, WaterMetrics};
    use chrono::Duration;

    fn reading(sensor_id: &str) -> SensorReading {
        SensorReading {
            sensor_id: sensor_id.to_string(),
            timestamp: Utc::now(),
            value: 0.4,
            kind: SensorType::Pyr,
            location: Vec3::default(),
            orientation: None,
            is_registered: false,
        }
    }

    fn schedule(tank_id: TankId, species: &str, amount: f64) -> FeedingSchedule {
        FeedingSchedule {
            tank_id,
            species: species.to_string(),
            schedule: FeedingPlan {
                times: vec!["08:00".to_string(), "18:00".to_string()],
                amount,
                food_type: "pellets".to_string(),
            },
            last_fed: None,
            next_feeding: None,
        }
    }

    fn check(tank_id: TankId, minutes_ago: i64) -> HealthCheck {
        HealthCheck {
            tank_id,
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            species: "salmon".to_string(),
            metrics: WaterMetrics {
                temperature: 24.0,
                ph: 7.5,
                oxygen: 8.0,
                ammonia: 0.0,
                nitrite: 0.0,
                nitrate: 0.0,
            },
            status: HealthStatus::Healthy,
            notes: String::new(),
        }
    }

    #[test]
    fn test_register_flips_only_unregistered() {
        let repo = InMemoryRepository::new();
        repo.record_reading(&reading("pyr_001")).unwrap();
        repo.record_reading(&reading("pyr_001")).unwrap();
        repo.record_reading(&reading("pyr_002")).unwrap();

        let updated = repo
            .register_sensor("pyr_001", Orientation::Up, Vec3::new(0.5, 0.9, 0.5))
            .unwrap();
        assert_eq!(updated, 2);

        let again = repo
            .register_sensor("pyr_001", Orientation::Down, Vec3::default())
            .unwrap();
        assert_eq!(again, 0);

        let sensors = repo.registered_sensors().unwrap();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].sensor_id, "pyr_001");
        assert_eq!(sensors[0].orientation, Orientation::Up);
    }

    #[test]
    fn test_feeding_upsert_never_duplicates() {
        let repo = InMemoryRepository::new();
        let first = repo.upsert_feeding_schedule(&schedule(1, "salmon", 20.0)).unwrap();
        let second = repo.upsert_feeding_schedule(&schedule(1, "salmon", 35.0)).unwrap();
        repo.upsert_feeding_schedule(&schedule(1, "trout", 10.0)).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);

        let found = repo.feeding_schedule(1, "salmon").unwrap().unwrap();
        assert!((found.schedule.amount - 35.0).abs() < f64::EPSILON);
        assert!(repo.feeding_schedule(2, "salmon").unwrap().is_none());
    }

    #[test]
    fn test_latest_health_check_by_timestamp() {
        let repo = InMemoryRepository::new();
        repo.append_health_check(&check(1, 5)).unwrap();
        let newest = repo.append_health_check(&check(1, 1)).unwrap();
        repo.append_health_check(&check(1, 10)).unwrap();
        repo.append_health_check(&check(2, 0)).unwrap();

        let latest = repo.latest_health_check(1).unwrap().unwrap();
        assert_eq!(latest.id, newest.id);
        assert!(repo.latest_health_check(3).unwrap().is_none());
    }

    #[test]
    fn test_current_changes_are_append_only_per_tank() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();
        repo.append_current_change(&CurrentChange::temporary(1, 0.5, 3000, now)).unwrap();
        repo.append_current_change(&CurrentChange::temporary(2, 0.3, 5000, now)).unwrap();
        repo.append_current_change(&CurrentChange::reset(1, now)).unwrap();

        let history = repo.current_changes(1).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].needs_reset());
        assert!(history[1].is_reset());
    }

    #[test]
    fn test_trait_object() {
        let repo: Box<dyn TankRepository> = Box::new(InMemoryRepository::new());
        assert_eq!(repo.backend_name(), "InMemory");
    }
}

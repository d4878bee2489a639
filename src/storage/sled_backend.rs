//! Durable repository backed by sled
//!
//! One named tree per record kind, JSON values. Append-only trees are keyed
//! by the storage id (big-endian u64 from `Db::generate_id`, so iteration is
//! chronological); feeding schedules are keyed by `"{tank_id}/{species}"`.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

use super::persistence::{distinct_registered, newest_check, PersistenceError, TankRepository};
use crate::types::{
    CurrentChange, FeedingSchedule, HealthCheck, Orientation, RegisteredSensor, SensorReading,
    Stored, TankId, Vec3,
};

const READINGS_TREE: &str = "readings";
const CURRENT_CHANGES_TREE: &str = "current_changes";
const FEEDING_TREE: &str = "feeding_schedules";
const HEALTH_TREE: &str = "health_checks";

/// Sled-backed [`TankRepository`].
#[derive(Clone)]
pub struct SledRepository {
    db: sled::Db,
    readings: sled::Tree,
    current_changes: sled::Tree,
    feeding_schedules: sled::Tree,
    health_checks: sled::Tree,
}

impl SledRepository {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let repo = Self::from_db(db)?;
        info!(path = ?path_ref, "Tank repository opened");
        Ok(repo)
    }

    /// Temporary database, removed on drop
    pub fn temporary() -> Result<Self, PersistenceError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, PersistenceError> {
        Ok(Self {
            readings: db.open_tree(READINGS_TREE)?,
            current_changes: db.open_tree(CURRENT_CHANGES_TREE)?,
            feeding_schedules: db.open_tree(FEEDING_TREE)?,
            health_checks: db.open_tree(HEALTH_TREE)?,
            db,
        })
    }

    /// Insert `record` under a fresh id and flush.
    fn append<T: Serialize + Clone>(
        &self,
        tree: &sled::Tree,
        record: &T,
    ) -> Result<Stored<T>, PersistenceError> {
        let id = self.db.generate_id()?;
        let stored = Stored::new(id, record.clone(), Utc::now());
        tree.insert(id.to_be_bytes(), serde_json::to_vec(&stored)?)?;
        self.db.flush()?;
        Ok(stored)
    }

    /// Decode every value of `tree`, skipping entries that fail to parse.
    fn scan<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<Stored<T>>, PersistenceError> {
        let mut out = Vec::new();
        for item in tree.iter() {
            let (key, value) = item?;
            match serde_json::from_slice::<Stored<T>>(&value) {
                Ok(stored) => out.push(stored),
                Err(e) => {
                    warn!(key = ?key, error = %e, "Skipping undecodable record");
                }
            }
        }
        Ok(out)
    }

    fn feeding_key(tank_id: TankId, species: &str) -> Vec<u8> {
        format!("{tank_id}/{species}").into_bytes()
    }
}

impl TankRepository for SledRepository {
    fn record_reading(
        &self,
        reading: &SensorReading,
    ) -> Result<Stored<SensorReading>, PersistenceError> {
        let stored = self.append(&self.readings, reading)?;
        debug!(id = stored.id, sensor_id = %reading.sensor_id, "Stored sensor reading");
        Ok(stored)
    }

    fn register_sensor(
        &self,
        sensor_id: &str,
        orientation: Orientation,
        location: Vec3,
    ) -> Result<usize, PersistenceError> {
        let now = Utc::now();
        let mut updated = 0;

        for mut stored in Self::scan::<SensorReading>(&self.readings)? {
            if stored.sensor_id != sensor_id || !stored.record.register(orientation, location) {
                continue;
            }
            stored.updated_at = now;
            self.readings
                .insert(stored.id.to_be_bytes(), serde_json::to_vec(&stored)?)?;
            updated += 1;
        }

        if updated > 0 {
            self.db.flush()?;
        }
        Ok(updated)
    }

    fn registered_sensors(&self) -> Result<Vec<RegisteredSensor>, PersistenceError> {
        let readings = Self::scan::<SensorReading>(&self.readings)?;
        Ok(distinct_registered(readings.iter().map(|s| &s.record)))
    }

    fn append_current_change(
        &self,
        change: &CurrentChange,
    ) -> Result<Stored<CurrentChange>, PersistenceError> {
        self.append(&self.current_changes, change)
    }

    fn current_changes(
        &self,
        tank_id: TankId,
    ) -> Result<Vec<Stored<CurrentChange>>, PersistenceError> {
        let mut changes = Self::scan::<CurrentChange>(&self.current_changes)?;
        changes.retain(|c| c.tank_id == tank_id);
        Ok(changes)
    }

    fn upsert_feeding_schedule(
        &self,
        schedule: &FeedingSchedule,
    ) -> Result<Stored<FeedingSchedule>, PersistenceError> {
        let key = Self::feeding_key(schedule.tank_id, &schedule.species);
        let now = Utc::now();

        let stored = match self.feeding_schedules.get(&key)? {
            Some(bytes) => {
                let mut existing: Stored<FeedingSchedule> = serde_json::from_slice(&bytes)?;
                existing.replace(schedule.clone(), now);
                existing
            }
            None => Stored::new(self.db.generate_id()?, schedule.clone(), now),
        };

        self.feeding_schedules
            .insert(key, serde_json::to_vec(&stored)?)?;
        self.db.flush()?;
        Ok(stored)
    }

    fn feeding_schedule(
        &self,
        tank_id: TankId,
        species: &str,
    ) -> Result<Option<Stored<FeedingSchedule>>, PersistenceError> {
        match self.feeding_schedules.get(Self::feeding_key(tank_id, species))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn append_health_check(
        &self,
        check: &HealthCheck,
    ) -> Result<Stored<HealthCheck>, PersistenceError> {
        self.append(&self.health_checks, check)
    }

    fn latest_health_check(
        &self,
        tank_id: TankId,
    ) -> Result<Option<Stored<HealthCheck>>, PersistenceError> {
        let checks = Self::scan::<HealthCheck>(&self.health_checks)?;
        Ok(newest_check(checks.iter().filter(|c| c.tank_id == tank_id)))
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

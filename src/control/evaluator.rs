//! Temporary current changes and their automatic reset
//!
//! The evaluator owns one slot per tank holding the pending reset, if any.
//! Every operation that touches a tank's current runs under that tank's
//! async mutex, so decisions for one tank are serialized while different
//! tanks proceed concurrently.
//!
//! Each scheduled reset carries a generation number. A reset task that wakes
//! up re-checks its generation under the tank mutex and does nothing if it
//! has been superseded in the meantime.
//!
//! Slots are leased from the tank table. A scheduled reset holds a lease
//! until it fires or is cancelled, and the entry is removed when its last
//! lease is dropped with no reset pending.

use chrono::Utc;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use super::decision::decide_current;
use super::health::assess_health;
use super::timer::{Timer, TimerHandle};
use super::ControlError;
use crate::storage::TankRepository;
use crate::types::{
    CurrentChange, FishDetection, HealthCheck, HealthCheckRequest, HealthStatus,
    HealthThresholds, SensorReading, Stored, TankId,
};

struct PendingReset {
    generation: u64,
    handle: TimerHandle,
}

#[derive(Default)]
struct TankSlot {
    pending: Option<PendingReset>,
}

type SharedSlot = Arc<AsyncMutex<TankSlot>>;

struct TankEntry {
    slot: SharedSlot,
    leases: usize,
}

type TankTable = Arc<Mutex<HashMap<TankId, TankEntry>>>;

fn lock_table(tanks: &TankTable) -> MutexGuard<'_, HashMap<TankId, TankEntry>> {
    tanks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Access to one tank's slot. Lease counts only change under the table lock.
struct SlotLease {
    tanks: TankTable,
    tank_id: TankId,
    slot: SharedSlot,
}

impl SlotLease {
    fn acquire(tanks: &TankTable, tank_id: TankId) -> Self {
        let mut table = lock_table(tanks);
        let entry = table.entry(tank_id).or_insert_with(|| TankEntry {
            slot: SharedSlot::default(),
            leases: 0,
        });
        entry.leases += 1;
        Self {
            tanks: Arc::clone(tanks),
            tank_id,
            slot: Arc::clone(&entry.slot),
        }
    }

    fn existing(tanks: &TankTable, tank_id: TankId) -> Option<Self> {
        let mut table = lock_table(tanks);
        let entry = table.get_mut(&tank_id)?;
        entry.leases += 1;
        Some(Self {
            tanks: Arc::clone(tanks),
            tank_id,
            slot: Arc::clone(&entry.slot),
        })
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        let mut table = lock_table(&self.tanks);
        let Some(entry) = table.get_mut(&self.tank_id) else {
            return;
        };
        entry.leases = entry.leases.saturating_sub(1);
        let idle = entry.leases == 0
            && entry
                .slot
                .try_lock()
                .is_ok_and(|slot| slot.pending.is_none());
        if idle {
            table.remove(&self.tank_id);
        }
    }
}

/// Applies sensor-driven current changes and reverts them on schedule.
pub struct TankControlEvaluator {
    repository: Arc<dyn TankRepository>,
    timer: Arc<dyn Timer>,
    tanks: TankTable,
    generation: AtomicU64,
}

impl TankControlEvaluator {
    pub fn new(repository: Arc<dyn TankRepository>, timer: Arc<dyn Timer>) -> Self {
        Self {
            repository,
            timer,
            tanks: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn repository(&self) -> &Arc<dyn TankRepository> {
        &self.repository
    }

    fn slot(&self, tank_id: TankId) -> SlotLease {
        SlotLease::acquire(&self.tanks, tank_id)
    }

    fn all_slots(&self) -> Vec<SlotLease> {
        let ids: Vec<TankId> = lock_table(&self.tanks).keys().copied().collect();
        ids.into_iter()
            .filter_map(|tank_id| SlotLease::existing(&self.tanks, tank_id))
            .collect()
    }

    /// Number of tanks with per-tank state held in memory.
    pub fn tracked_tanks(&self) -> usize {
        lock_table(&self.tanks).len()
    }

    /// Decide on, persist, and schedule the reset of a temporary current.
    ///
    /// Returns `Ok(None)` when the reading and detections call for no change.
    pub async fn evaluate_current(
        &self,
        reading: &SensorReading,
        detections: &[FishDetection],
    ) -> Result<Option<Stored<CurrentChange>>, ControlError> {
        let Some(decision) = decide_current(reading, detections) else {
            debug!(
                sensor_id = %reading.sensor_id,
                detections = detections.len(),
                "No current change required"
            );
            return Ok(None);
        };

        info!(
            tank_id = decision.tank_id,
            sensor_id = %reading.sensor_id,
            value = decision.value,
            duration_ms = decision.duration_ms,
            active_fish = decision.active_fish,
            avg_x = decision.avg_x,
            avg_y = decision.avg_y,
            "Fish clustered in sensor zone, applying temporary current"
        );

        let change = CurrentChange::temporary(
            decision.tank_id,
            decision.value,
            decision.duration_ms,
            Utc::now(),
        );
        self.apply_change(change).await.map(Some)
    }

    /// Persist a current change for its tank.
    ///
    /// A temporary non-zero change replaces any pending reset with a fresh
    /// one after `change.duration`. Any other change cancels the pending
    /// reset, since it sets the tank's current explicitly.
    ///
    /// The reset is scheduled before the change is persisted and stays
    /// scheduled if persisting fails.
    pub async fn apply_change(
        &self,
        change: CurrentChange,
    ) -> Result<Stored<CurrentChange>, ControlError> {
        let lease = self.slot(change.tank_id);
        let mut slot = lease.slot.lock().await;

        if change.needs_reset() {
            self.replace_pending(&mut slot, change.tank_id, change.duration())?;
        } else if let Some(previous) = slot.pending.take() {
            previous.handle.cancel();
            info!(
                tank_id = change.tank_id,
                value = change.value,
                "Explicit current change cancelled pending reset"
            );
        }

        let stored = self.repository.append_current_change(&change)?;
        debug!(tank_id = change.tank_id, id = stored.id, "Current change recorded");
        Ok(stored)
    }

    /// Schedule a reset of `tank_id` after `delay`, replacing any pending one.
    pub async fn schedule_reset(&self, tank_id: TankId, delay: Duration) -> Result<(), ControlError> {
        let lease = self.slot(tank_id);
        let mut slot = lease.slot.lock().await;
        self.replace_pending(&mut slot, tank_id, delay)
    }

    /// Swap in a new pending reset. The previous one is cancelled only once
    /// the new timer is in place, so a scheduling failure leaves it intact.
    fn replace_pending(
        &self,
        slot: &mut TankSlot,
        tank_id: TankId,
        delay: Duration,
    ) -> Result<(), ControlError> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let task = fire_reset(self.slot(tank_id), Arc::clone(&self.repository), generation).boxed();

        let handle = self.timer.after(delay, task)?;

        if let Some(previous) = slot.pending.replace(PendingReset { generation, handle }) {
            previous.handle.cancel();
            info!(
                tank_id,
                superseded = previous.generation,
                generation,
                "Superseded pending current reset"
            );
        }

        debug!(
            tank_id,
            generation,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Current reset scheduled"
        );
        Ok(())
    }

    /// Whether `tank_id` has a reset waiting to fire.
    pub async fn has_pending_reset(&self, tank_id: TankId) -> bool {
        let Some(lease) = SlotLease::existing(&self.tanks, tank_id) else {
            return false;
        };
        let pending = lease.slot.lock().await.pending.is_some();
        pending
    }

    /// Number of tanks with a reset waiting to fire.
    pub async fn pending_resets(&self) -> usize {
        let mut count = 0;
        for lease in self.all_slots() {
            if lease.slot.lock().await.pending.is_some() {
                count += 1;
            }
        }
        count
    }

    /// Classify a health check and persist it.
    pub fn record_health_check(
        &self,
        request: HealthCheckRequest,
        thresholds: &HealthThresholds,
    ) -> Result<Stored<HealthCheck>, ControlError> {
        let assessment = assess_health(&request.metrics, thresholds);

        match assessment.status {
            HealthStatus::Critical => warn!(
                tank_id = request.tank_id,
                species = %request.species,
                critical = ?assessment.critical,
                warnings = ?assessment.warnings,
                "Water quality CRITICAL"
            ),
            HealthStatus::Warning => warn!(
                tank_id = request.tank_id,
                species = %request.species,
                warnings = ?assessment.warnings,
                "Water quality WARNING"
            ),
            HealthStatus::Healthy => debug!(
                tank_id = request.tank_id,
                species = %request.species,
                "Water quality healthy"
            ),
        }

        let check = HealthCheck::from_request(request, assessment.status);
        Ok(self.repository.append_health_check(&check)?)
    }

    /// Cancel every pending reset and wait for resets already firing.
    /// No reset is recorded once this returns.
    pub async fn shutdown(&self) {
        let mut cancelled = 0usize;
        for lease in self.all_slots() {
            if let Some(pending) = lease.slot.lock().await.pending.take() {
                pending.handle.cancel();
                cancelled += 1;
            }
        }
        self.timer.shutdown().await;
        info!(cancelled, "Current control stopped");
    }
}

/// Timer body: record the reset if this generation is still the pending one.
async fn fire_reset(lease: SlotLease, repository: Arc<dyn TankRepository>, generation: u64) {
    let tank_id = lease.tank_id;
    let mut slot = lease.slot.lock().await;
    if slot.pending.as_ref().map(|p| p.generation) != Some(generation) {
        debug!(tank_id, generation, "Stale current reset skipped");
        return;
    }
    slot.pending = None;

    match repository.append_current_change(&CurrentChange::reset(tank_id, Utc::now())) {
        Ok(stored) => info!(tank_id, id = stored.id, "Temporary current expired, reset recorded"),
        Err(e) => error!(tank_id, error = %e, "Failed to record current reset"),
    }
}

//! Tank current control and water-quality evaluation
//!
//! - [`decision`]: pure current-decision policy from a sensor reading and a
//!   batch of fish detections
//! - [`evaluator`]: [`TankControlEvaluator`], which persists decisions and
//!   owns the per-tank pending-reset table
//! - [`timer`]: cancellable deferred tasks ([`Timer`], [`TokioTimer`])
//! - [`health`]: pure water-quality classifier

pub mod decision;
pub mod evaluator;
pub mod health;
pub mod timer;

pub use decision::{decide_current, CurrentDecision};
pub use evaluator::TankControlEvaluator;
pub use health::{assess_health, evaluate_health, HealthAssessment};
pub use timer::{Timer, TimerError, TimerHandle, TokioTimer};

use crate::storage::PersistenceError;

/// Errors surfaced by control operations.
///
/// Both variants are local to the tank being controlled; other tanks and
/// health evaluation are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("failed to persist record: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("failed to schedule current reset: {0}")]
    Scheduling(#[from] TimerError),
}

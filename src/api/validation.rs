//! Request body checks applied before anything reaches the control core.
//!
//! Each check collects every problem it finds and reports them together in
//! a single 400.

use chrono::NaiveTime;

use super::error::ApiError;
use crate::types::{
    CurrentChange, FeedingSchedule, FishDetection, HealthCheckRequest, SensorReading,
    SensorRegistration, Vec3,
};

/// pH scale bounds.
const PH_RANGE: std::ops::RangeInclusive<f64> = 0.0..=14.0;

#[derive(Default)]
struct Problems(Vec<String>);

impl Problems {
    fn require(&mut self, ok: bool, problem: impl FnOnce() -> String) {
        if !ok {
            self.0.push(problem());
        }
    }

    fn finite(&mut self, field: &str, value: f64) {
        self.require(value.is_finite(), || format!("{field} must be a finite number"));
    }

    fn finite_vec(&mut self, field: &str, v: &Vec3) {
        self.require(v.is_finite(), || format!("{field} must have finite coordinates"));
    }

    fn non_empty(&mut self, field: &str, value: &str) {
        self.require(!value.trim().is_empty(), || format!("{field} must not be empty"));
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::bad_request(self.0.join("; ")))
        }
    }
}

/// `HH:mm`, 24-hour clock.
fn is_clock_time(s: &str) -> bool {
    s.len() == 5 && s.as_bytes()[2] == b':' && NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}

pub fn check_reading(reading: &SensorReading) -> Result<(), ApiError> {
    let mut p = Problems::default();
    p.non_empty("sensor_id", &reading.sensor_id);
    p.finite("value", reading.value);
    p.finite_vec("location", &reading.location);
    p.finish()
}

pub fn check_detections(detections: &[FishDetection]) -> Result<(), ApiError> {
    let mut p = Problems::default();
    for (i, d) in detections.iter().enumerate() {
        p.finite_vec(&format!("detections[{i}].position"), &d.position);
        p.finite(&format!("detections[{i}].confidence"), d.confidence);
    }
    p.finish()
}

pub fn check_current_change(change: &CurrentChange) -> Result<(), ApiError> {
    let mut p = Problems::default();
    p.finite("value", change.value);
    p.finish()
}

pub fn check_feeding_schedule(schedule: &FeedingSchedule) -> Result<(), ApiError> {
    let mut p = Problems::default();
    p.non_empty("species", &schedule.species);
    p.require(
        schedule.schedule.amount.is_finite() && schedule.schedule.amount >= 0.0,
        || "schedule.amount must be a non-negative number".to_string(),
    );
    for t in &schedule.schedule.times {
        p.require(is_clock_time(t), || {
            format!("schedule.times: '{t}' is not a valid HH:mm time")
        });
    }
    p.finish()
}

pub fn check_health_request(request: &HealthCheckRequest) -> Result<(), ApiError> {
    let mut p = Problems::default();
    let m = &request.metrics;
    for (metric, value) in m.iter() {
        p.finite(&format!("metrics.{metric}"), value);
    }
    if m.ph.is_finite() {
        p.require(PH_RANGE.contains(&m.ph), || {
            format!("metrics.ph must be within 0-14, got {}", m.ph)
        });
    }
    for (name, value) in [
        ("oxygen", m.oxygen),
        ("ammonia", m.ammonia),
        ("nitrite", m.nitrite),
        ("nitrate", m.nitrate),
    ] {
        if value.is_finite() {
            p.require(value >= 0.0, || format!("metrics.{name} must not be negative"));
        }
    }
    p.finish()
}

pub fn check_registration(registration: &SensorRegistration) -> Result<(), ApiError> {
    let mut p = Problems::default();
    p.non_empty("sensorId", &registration.sensor_id);
    p.finite_vec("location", &registration.location);
    p.finish()
}

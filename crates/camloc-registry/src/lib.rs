//! `camloc-registry` – the sensor registry.
//!
//! Keeps the live `id → Sensor` map that the transport layer mutates as
//! configuration, detection, and disconnect messages arrive.  The angulation
//! engine never touches the registry directly; it is handed an immutable
//! [`SensorSnapshot`] produced by [`SensorRegistry::snapshot`].
//!
//! # Lifecycle
//!
//! - A configuration report for an unknown id creates the sensor with a
//!   detection offset of `0`.
//! - A configuration report for a known id replaces pose and fov but keeps
//!   the last detection offset.
//! - A detection for an unknown id is rejected.
//! - A disconnect removes the entry.

use std::collections::HashMap;

use camloc_types::{CamlocError, Pose, Sensor, SensorId, SensorSnapshot};
use tracing::{debug, info};

/// Whether [`SensorRegistry::apply_config`] created a new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOutcome {
    Created,
    Updated,
}

/// Central `id → Sensor` store.
///
/// The registry is owned and serialised by its caller (the locator service);
/// it has no interior locking of its own.
#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: HashMap<SensorId, Sensor>,
}

impl SensorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn get(&self, id: &SensorId) -> Option<&Sensor> {
        self.sensors.get(id)
    }

    /// Create or update a sensor's pose and field of view.
    ///
    /// # Errors
    ///
    /// Returns [`CamlocError::InvalidParameter`] when `fov_deg` is negative
    /// or any value is non-finite.  The registry is left unchanged.
    pub fn apply_config(
        &mut self,
        id: SensorId,
        pose: Pose,
        fov_deg: f64,
    ) -> Result<ConfigOutcome, CamlocError> {
        if !(pose.x.is_finite() && pose.y.is_finite() && pose.rotation_deg.is_finite()) {
            return Err(invalid("pose", format!("non-finite pose {pose:?} for {id}")));
        }
        if !fov_deg.is_finite() || fov_deg < 0.0 {
            return Err(invalid("fov_deg", format!("must be finite and >= 0, got {fov_deg} for {id}")));
        }

        match self.sensors.get_mut(&id) {
            Some(sensor) => {
                sensor.pose = pose;
                sensor.fov_deg = fov_deg;
                debug!(sensor = %id, ?pose, fov_deg, "sensor config updated");
                Ok(ConfigOutcome::Updated)
            }
            None => {
                info!(sensor = %id, ?pose, fov_deg, "sensor registered");
                self.sensors.insert(id, Sensor::new(pose, fov_deg));
                Ok(ConfigOutcome::Created)
            }
        }
    }

    /// Record the normalised horizontal offset of a new detection.
    ///
    /// # Errors
    ///
    /// Returns [`CamlocError::UnknownSensor`] when `id` has not been
    /// configured, and [`CamlocError::InvalidParameter`] when `last_x` lies
    /// outside `[0, 1]`.
    pub fn update_detection(&mut self, id: &SensorId, last_x: f64) -> Result<(), CamlocError> {
        if !(0.0..=1.0).contains(&last_x) {
            return Err(invalid("last_x", format!("must lie in [0, 1], got {last_x} for {id}")));
        }
        match self.sensors.get_mut(id) {
            Some(sensor) => {
                sensor.last_x = last_x;
                debug!(sensor = %id, last_x, "detection recorded");
                Ok(())
            }
            None => Err(CamlocError::UnknownSensor(id.clone())),
        }
    }

    /// Remove a sensor, returning its last known record.
    pub fn remove(&mut self, id: &SensorId) -> Option<Sensor> {
        let removed = self.sensors.remove(id);
        if removed.is_some() {
            info!(sensor = %id, "sensor removed");
        }
        removed
    }

    /// Immutable, id-ordered copy of the current registry contents.
    pub fn snapshot(&self) -> SensorSnapshot {
        self.sensors.iter().collect()
    }
}

fn invalid(name: &str, reason: String) -> CamlocError {
    CamlocError::InvalidParameter {
        name: name.to_string(),
        reason,
    }
}

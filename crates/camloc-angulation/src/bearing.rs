//! Bearing model.
//!
//! A sensor reports where the target sits horizontally in its frame
//! (`last_x ∈ [0, 1]`).  Combined with its facing angle and field of view
//! that gives an absolute bearing:
//!
//! ```text
//! angle_deg = rotation + fov * (0.5 − last_x)
//! slope     = tan(radians(angle_deg))
//! ```
//!
//! Near odd multiples of 90° the slope grows without bound.  It stays finite
//! everywhere except exactly at the asymptote, and the resulting precision
//! loss is accepted rather than treated as an error.

use camloc_types::{Coordinates, Pose, Sensor};

/// The line from a sensor's position through its detected target.
///
/// Derived on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingLine {
    pub origin: Coordinates,
    pub slope: f64,
}

impl BearingLine {
    pub fn new(origin: Coordinates, slope: f64) -> Self {
        Self { origin, slope }
    }

    /// Bearing through the sensor's most recent detection.
    pub fn from_sensor(sensor: &Sensor) -> Self {
        Self::new(sensor.pose.origin(), slope(sensor))
    }

    /// Bearing along the sensor's optical axis, ignoring fov and detection.
    pub fn central(pose: &Pose) -> Self {
        Self::new(pose.origin(), slope_of_angle(pose.rotation_deg))
    }

    /// `y` on this line at the given `x`.
    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * (x - self.origin.x) + self.origin.y
    }
}

/// Absolute bearing of the detected target in degrees.
pub fn bearing_angle_deg(sensor: &Sensor) -> f64 {
    sensor.pose.rotation_deg + sensor.fov_deg * (0.5 - sensor.last_x)
}

/// Slope of the bearing line through the sensor's detection.
pub fn slope(sensor: &Sensor) -> f64 {
    slope_of_angle(bearing_angle_deg(sensor))
}

fn slope_of_angle(angle_deg: f64) -> f64 {
    angle_deg.to_radians().tan()
}

//! Installation check for a pair of sensors.
//!
//! Only the sensors' *central* bearings are used (fov and detection offset
//! are ignored).  The two optical axes must cross, and the crossing point
//! must lie in front of each sensor: on the side given by the sensor's
//! [`FacingQuadrant`].

use camloc_types::Sensor;
use tracing::debug;

use crate::bearing::BearingLine;
use crate::intersect::intersect;

/// Direction signs `(sx, sy)` a sensor faces, derived from its rotation.
///
/// A sign of `+1` means the crossing point must have a coordinate `≥` the
/// sensor's, `-1` means `≤`, and `0` imposes no constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacingQuadrant {
    pub sx: i8,
    pub sy: i8,
}

impl FacingQuadrant {
    const BRACKETS: [FacingQuadrant; 4] = [
        FacingQuadrant { sx: 1, sy: 1 },
        FacingQuadrant { sx: -1, sy: 1 },
        FacingQuadrant { sx: -1, sy: -1 },
        FacingQuadrant { sx: 1, sy: -1 },
    ];

    const UNCONSTRAINED: FacingQuadrant = FacingQuadrant { sx: 0, sy: 0 };

    /// Map a rotation (degrees) onto one of four 90°-wide brackets.
    ///
    /// Non-negative rotations are bracketed upward from 0°: `[0, 90]`,
    /// `(90, 180]`, `(180, 270]`, `(270, 360]`.  Negative rotations mirror
    /// that downward, so `[-90, 0)` faces `(+, −)`.  Rotations beyond ±360°
    /// and NaN are unconstrained.
    pub fn from_rotation(rotation_deg: f64) -> Self {
        if rotation_deg >= 0.0 {
            (0_i32..4)
                .find(|&i| rotation_deg <= f64::from(i + 1) * 90.0)
                .map(|i| Self::BRACKETS[i as usize])
                .unwrap_or(Self::UNCONSTRAINED)
        } else if rotation_deg < 0.0 {
            (0_i32..4)
                .find(|&i| rotation_deg >= -f64::from(i + 1) * 90.0)
                .map(|i| Self::BRACKETS[3 - i as usize])
                .unwrap_or(Self::UNCONSTRAINED)
        } else {
            Self::UNCONSTRAINED
        }
    }

    fn admits(sign: i8, point: f64, origin: f64) -> bool {
        match sign {
            s if s > 0 => point >= origin,
            s if s < 0 => point <= origin,
            _ => true,
        }
    }
}

/// Check that two sensors' optical axes cross in front of both of them.
///
/// Returns `false` for parallel axes, non-finite input, or a crossing point
/// behind either sensor.  Never panics.
pub fn validate_setup(a: &Sensor, b: &Sensor) -> bool {
    let Some(point) = intersect(&BearingLine::central(&a.pose), &BearingLine::central(&b.pose)) else {
        debug!("setup rejected: central bearings do not intersect");
        return false;
    };

    [a, b].iter().all(|sensor| {
        let q = FacingQuadrant::from_rotation(sensor.pose.rotation_deg);
        let ok = FacingQuadrant::admits(q.sx, point.x, sensor.pose.x)
            && FacingQuadrant::admits(q.sy, point.y, sensor.pose.y);
        if !ok {
            debug!(
                x = point.x,
                y = point.y,
                sensor_x = sensor.pose.x,
                sensor_y = sensor.pose.y,
                rotation = sensor.pose.rotation_deg,
                "setup rejected: crossing point behind sensor"
            );
        }
        ok
    })
}

//! Position estimator.
//!
//! Fuses every sensor in a [`SensorSnapshot`] into one position by taking
//! the arithmetic mean of all valid pairwise bearing intersections.
//!
//! For a snapshot of `n` sensors:
//!
//! 1. Each sensor yields a [`BearingLine`] and its rotation folded into
//!    `[0°, 180°)`.
//! 2. Every unordered pair is visited exactly once, in ascending id order.
//! 3. A pair whose folded rotations differ by less than
//!    `min_angular_difference_deg` is skipped as near-parallel.
//! 4. Remaining pairs are intersected; NaN / infinite points are dropped.
//! 5. The surviving points are averaged.
//!
//! This is deliberately a plain mean: it is neither weighted nor robust to
//! outlying pairs.
//!
//! # Example
//!
//! ```rust
//! use camloc_angulation::PositionEstimator;
//! use camloc_types::{Pose, Sensor, SensorId, SensorSnapshot};
//!
//! let snapshot: SensorSnapshot = [
//!     (SensorId::from("a"), Sensor::new(Pose::new(0.0, 3.0, 0.0), 0.0)),
//!     (SensorId::from("b"), Sensor::new(Pose::new(3.0, 0.0, 90.0), 0.0)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let p = PositionEstimator::default().estimate(&snapshot).unwrap();
//! assert!((p.x - 3.0).abs() < 1e-3);
//! assert!((p.y - 3.0).abs() < 1e-3);
//! ```

use camloc_types::{CamlocError, Coordinates, SensorId, SensorSnapshot};
use tracing::{debug, trace};

use crate::bearing::BearingLine;
use crate::intersect::intersect;

/// Pairs whose sensor rotations are closer than this (degrees, modulo 180°)
/// are skipped unless a different threshold is configured.
pub const DEFAULT_MIN_ANGULAR_DIFFERENCE_DEG: f64 = 1.0;

/// Outcome of one estimation pass, including per-pair bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EstimateReport {
    /// The fused position, `None` when no pair produced an intersection.
    pub position: Option<Coordinates>,
    /// Number of unordered pairs visited.
    pub pairs_considered: usize,
    /// Pairs whose intersection contributed to `position`.
    pub pairs_used: usize,
    /// Pairs skipped by the near-parallel gate.
    pub pairs_near_parallel: usize,
    /// Pairs with equal slopes or a non-finite intersection.
    pub pairs_degenerate: usize,
}

/// Mean-of-pairwise-intersections position estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionEstimator {
    min_angular_difference_deg: f64,
}

impl Default for PositionEstimator {
    fn default() -> Self {
        Self {
            min_angular_difference_deg: DEFAULT_MIN_ANGULAR_DIFFERENCE_DEG,
        }
    }
}

impl PositionEstimator {
    /// Create an estimator with the given near-parallel gate (degrees).
    ///
    /// # Errors
    ///
    /// Returns [`CamlocError::InvalidParameter`] unless the threshold is
    /// finite and strictly positive.
    pub fn new(min_angular_difference_deg: f64) -> Result<Self, CamlocError> {
        if !min_angular_difference_deg.is_finite() || min_angular_difference_deg <= 0.0 {
            return Err(CamlocError::InvalidParameter {
                name: "min_angular_difference_deg".to_string(),
                reason: format!("must be finite and > 0, got {min_angular_difference_deg}"),
            });
        }
        Ok(Self {
            min_angular_difference_deg,
        })
    }

    pub fn min_angular_difference_deg(&self) -> f64 {
        self.min_angular_difference_deg
    }

    /// Fused target position, or `None` for fewer than two sensors or when
    /// every pair was rejected.
    pub fn estimate(&self, snapshot: &SensorSnapshot) -> Option<Coordinates> {
        self.report(snapshot).position
    }

    /// Run the estimation and return the position with pair statistics.
    pub fn report(&self, snapshot: &SensorSnapshot) -> EstimateReport {
        let mut report = EstimateReport::default();
        if snapshot.len() < 2 {
            debug!(sensors = snapshot.len(), "not enough sensors to estimate");
            return report;
        }

        // Snapshot iteration is ordered by id.
        let bearings: Vec<(&SensorId, BearingLine, f64)> = snapshot
            .iter()
            .map(|(id, sensor)| {
                (
                    id,
                    BearingLine::from_sensor(sensor),
                    sensor.pose.rotation_deg.rem_euclid(180.0),
                )
            })
            .collect();

        let (mut sum_x, mut sum_y) = (0.0, 0.0);
        for (i, (id_a, line_a, rot_a)) in bearings.iter().enumerate() {
            for (id_b, line_b, rot_b) in &bearings[i + 1..] {
                report.pairs_considered += 1;

                if (rot_a - rot_b).abs() < self.min_angular_difference_deg {
                    trace!(a = %id_a, b = %id_b, "pair skipped: near-parallel rotations");
                    report.pairs_near_parallel += 1;
                    continue;
                }

                match intersect(line_a, line_b) {
                    Some(point) => {
                        trace!(a = %id_a, b = %id_b, x = point.x, y = point.y, "pair intersection");
                        sum_x += point.x;
                        sum_y += point.y;
                        report.pairs_used += 1;
                    }
                    None => {
                        trace!(a = %id_a, b = %id_b, "pair skipped: degenerate intersection");
                        report.pairs_degenerate += 1;
                    }
                }
            }
        }

        if report.pairs_used > 0 {
            let n = report.pairs_used as f64;
            report.position = Some(Coordinates::new(sum_x / n, sum_y / n));
        }

        debug!(
            sensors = snapshot.len(),
            used = report.pairs_used,
            near_parallel = report.pairs_near_parallel,
            degenerate = report.pairs_degenerate,
            "estimate computed"
        );
        report
    }
}

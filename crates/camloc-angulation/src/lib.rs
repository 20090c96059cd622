//! `camloc-angulation` – the angulation engine.
//!
//! Turns bearing-only observations from several fixed sensors into a fused
//! target position.  Everything here is a pure function of its inputs: no
//! I/O, no retained state, safe to call concurrently on independent
//! snapshots.
//!
//! Angles are degrees at every public boundary and are converted to radians
//! only immediately before a trigonometric call.
//!
//! # Modules
//!
//! - [`bearing`] – [`BearingLine`][bearing::BearingLine]: the line from a
//!   sensor through its detected target.
//! - [`intersect`] – degenerate-safe intersection of two bearing lines.
//! - [`estimator`] – [`PositionEstimator`][estimator::PositionEstimator]:
//!   mean of every valid pairwise intersection across a snapshot.
//! - [`setup`] – sanity check of a two-sensor installation's central bearings.
//! - [`extrapolate`] – linear projection of a moving target between samples.

pub mod bearing;
pub mod estimator;
pub mod extrapolate;
pub mod intersect;
pub mod setup;

pub use bearing::BearingLine;
pub use estimator::{DEFAULT_MIN_ANGULAR_DIFFERENCE_DEG, EstimateReport, PositionEstimator};
pub use extrapolate::{extrapolate, extrapolate_now, lerp};
pub use intersect::intersect;
pub use setup::{FacingQuadrant, validate_setup};

//! Trajectory extrapolation.
//!
//! Projects a target's position linearly from two timestamped samples:
//!
//! ```text
//! t = (now − a.timestamp) / (b.timestamp − a.timestamp)
//! p = a + (b − a) · t
//! ```
//!
//! `t` is not clamped.  Projecting past `b` hides some of the pipeline's
//! latency for a moving target, at the risk of overshoot when it turns.

use camloc_types::{CamlocError, Coordinates, TimedSample};
use chrono::{DateTime, TimeDelta, Utc};

/// Position predicted for `now` from samples `a` and `b`.
///
/// # Errors
///
/// Returns [`CamlocError::InvalidTimeSpan`] when both samples carry the
/// same timestamp.
pub fn extrapolate(
    a: &TimedSample,
    b: &TimedSample,
    now: DateTime<Utc>,
) -> Result<Coordinates, CamlocError> {
    let span = b.timestamp - a.timestamp;
    if span == TimeDelta::zero() {
        return Err(CamlocError::InvalidTimeSpan { at: a.timestamp });
    }

    let t = seconds(now - a.timestamp) / seconds(span);
    Ok(lerp(a.position, b.position, t))
}

/// [`extrapolate`] to the current wall-clock time.
pub fn extrapolate_now(a: &TimedSample, b: &TimedSample) -> Result<TimedSample, CamlocError> {
    let now = Utc::now();
    extrapolate(a, b, now).map(|position| TimedSample::new(position, now))
}

/// Component-wise linear interpolation; `t` outside `[0, 1]` extrapolates.
pub fn lerp(a: Coordinates, b: Coordinates, t: f64) -> Coordinates {
    Coordinates::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

fn seconds(delta: TimeDelta) -> f64 {
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

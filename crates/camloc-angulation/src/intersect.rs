//! Pairwise intersection of two bearing lines.
//!
//! ```text
//! x = (m_a·a_x − m_b·b_x + b_y − a_y) / (m_a − m_b)
//! y = m_a·(x − a_x) + a_y
//! ```
//!
//! `y` is evaluated on whichever of the two lines is shallower.  Both choices
//! are the same point in exact arithmetic, but a near-vertical slope would
//! amplify the rounding error of `x` by its own magnitude.
//!
//! There is no tolerance for near-parallel lines here; callers that need one
//! gate the pair before intersecting (see
//! [`PositionEstimator`][crate::estimator::PositionEstimator]).

use camloc_types::Coordinates;

use crate::bearing::BearingLine;

/// Intersect two bearing lines.
///
/// Returns `None` when the slopes are exactly equal or when the resulting
/// point is NaN or infinite.  Never panics.
pub fn intersect(a: &BearingLine, b: &BearingLine) -> Option<Coordinates> {
    let denominator = a.slope - b.slope;
    if denominator == 0.0 {
        return None;
    }

    let x = (a.slope * a.origin.x - b.slope * b.origin.x + b.origin.y - a.origin.y) / denominator;
    let shallow = if a.slope.abs() <= b.slope.abs() { a } else { b };
    let y = shallow.y_at(x);

    let point = Coordinates::new(x, y);
    point.is_finite().then_some(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x: f64, y: f64, slope: f64) -> BearingLine {
        BearingLine::new(Coordinates::new(x, y), slope)
    }

    #[test]
    fn crossing_lines_meet_on_both() {
        let a = line(0.0, 0.0, 1.0);
        let b = line(4.0, 0.0, -1.0);
        let p = intersect(&a, &b).expect("lines cross");
        assert!((p.x - 2.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
        assert!((a.y_at(p.x) - p.y).abs() < 1e-9);
        assert!((b.y_at(p.x) - p.y).abs() < 1e-9);
    }

    #[test]
    fn arbitrary_unequal_slopes_satisfy_both_equations() {
        let cases = [
            (line(1.5, -2.0, 0.3), line(-4.0, 7.0, -2.5)),
            (line(10.0, 10.0, 5.0), line(0.0, 0.0, 0.2)),
            (line(-3.0, 2.0, -0.7), line(6.0, -1.0, 0.1)),
        ];
        for (a, b) in cases {
            let p = intersect(&a, &b).expect("unequal slopes intersect");
            assert!((a.y_at(p.x) - p.y).abs() < 1e-9, "{a:?} / {p:?}");
            assert!((b.y_at(p.x) - p.y).abs() < 1e-9, "{b:?} / {p:?}");
        }
    }

    #[test]
    fn equal_slopes_never_intersect() {
        assert!(intersect(&line(0.0, 0.0, 2.0), &line(1.0, 5.0, 2.0)).is_none());
        // Coincident lines are rejected too.
        assert!(intersect(&line(0.0, 0.0, 2.0), &line(1.0, 2.0, 2.0)).is_none());
        assert!(intersect(&line(0.0, 0.0, 0.0), &line(3.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn non_finite_result_is_rejected() {
        assert!(intersect(&line(0.0, 0.0, f64::NAN), &line(1.0, 1.0, 1.0)).is_none());
        assert!(intersect(&line(0.0, 0.0, f64::INFINITY), &line(1.0, 1.0, 1.0)).is_none());
        // inf − inf in the numerator
        assert!(intersect(&line(1e10, 0.0, 1e300), &line(-1e10, 0.0, -1e300)).is_none());
    }

    #[test]
    fn argument_order_does_not_matter() {
        let a = line(0.0, 3.0, 0.0);
        let b = line(3.0, 0.0, 90f64.to_radians().tan());
        let p = intersect(&a, &b).unwrap();
        let q = intersect(&b, &a).unwrap();
        assert!((p.x - q.x).abs() < 1e-9);
        assert!((p.y - q.y).abs() < 1e-9);
    }

    #[test]
    fn horizontal_and_near_vertical_lines() {
        let horizontal = line(0.0, 3.0, 0.0);
        let vertical = line(3.0, 0.0, 90f64.to_radians().tan());
        let p = intersect(&horizontal, &vertical).expect("lines cross");
        assert!((p.x - 3.0).abs() < 1e-9);
        assert!((p.y - 3.0).abs() < 1e-9);
    }
}

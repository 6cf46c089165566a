//! Arc and ellipse tessellation by chord bisection.
//!
//! An arc from `p0` to `p1` is refined by repeatedly replacing a chord
//! `a → b` with the two chords through the arc point above its midpoint.
//! That point is found without trigonometry: it is the chord midpoint plus
//! `factor[level] · M·(a − b)`, where `M` is the quarter-turn of the arc's
//! own parametrization (a 90° rotation for circles, its affine image for
//! ellipses and for circles seen through a non-uniform transform).
//!
//! Work is kept on an explicit stack holding at most one pending chord per
//! level, so memory is bounded by [`MAX_ARC_SUBDIVISIONS`].

use crate::basics::{PointD, PointEquality};
use crate::chord_table::{ChordRow, MAX_ARC_SUBDIVISIONS};
use crate::trans_affine::TransAffine;

/// Quarter-turn matrix for a circular arc drawn through `device`.
///
/// In user space the turn is `+90°` for a counterclockwise arc and `−90°`
/// otherwise; the result is that rotation conjugated by the linear part of
/// `device`. Returns `None` if `device` is singular.
pub fn circular_arc_matrix(ccw: bool, device: &TransAffine) -> Option<TransAffine> {
    let turn = if ccw {
        TransAffine::new_custom(0.0, 1.0, -1.0, 0.0, 0.0, 0.0)
    } else {
        TransAffine::new_custom(0.0, -1.0, 1.0, 0.0, 0.0, 0.0)
    };
    let linear = linear_part(device);
    let mut m = linear.inverted()?;
    m.multiply(&turn);
    m.multiply(&linear);
    Some(m)
}

/// Quarter-turn matrix for the elliptic arc whose vectors from the center
/// to its endpoints are the conjugate semi-diameters `u` and `v`.
///
/// The result maps `u` to `v` and `v` to `−u`. Returns `None` when `u` and
/// `v` are parallel.
pub fn elliptic_arc_matrix(u: PointD, v: PointD) -> Option<TransAffine> {
    let basis = TransAffine::new_custom(u.x, u.y, v.x, v.y, 0.0, 0.0);
    let mut m = basis.inverted()?;
    m.multiply(&TransAffine::new_custom(0.0, 1.0, -1.0, 0.0, 0.0, 0.0));
    m.multiply(&basis);
    Some(m)
}

fn linear_part(m: &TransAffine) -> TransAffine {
    let c = m.coefficients();
    TransAffine::new_custom(c[0], c[1], c[2], c[3], 0.0, 0.0)
}

/// Approximate the arc from `p0` to `p1` by a polyline.
///
/// Returns the endpoints of the emitted segments in drawing order; `p0`
/// itself is not included. `turn` is the arc's quarter-turn matrix (only
/// its linear part is used) and `row` the factors for the arc's kind.
///
/// Chords whose ends are the same device point under `equality` are
/// dropped. At least one segment is always produced: a zero-length arc
/// yields `[p0]`, and an arc whose chords all collapse yields `[p1]`.
pub fn tessellate_arc(
    p0: PointD,
    p1: PointD,
    turn: &TransAffine,
    row: &ChordRow,
    equality: PointEquality,
) -> Vec<PointD> {
    if p0 == p1 {
        return vec![p0];
    }

    let mut points = Vec::with_capacity(1 << MAX_ARC_SUBDIVISIONS);
    let mut stack: Vec<(PointD, PointD, usize)> = Vec::with_capacity(MAX_ARC_SUBDIVISIONS + 1);
    stack.push((p0, p1, 0));

    while let Some((a, b, level)) = stack.pop() {
        if equality.same(a, b) {
            continue;
        }
        if level >= MAX_ARC_SUBDIVISIONS {
            points.push(b);
            continue;
        }
        let bisection = a.midpoint(b) + turn.map_vector(a - b) * row[level];
        // Second half first so the first half is popped next.
        stack.push((bisection, b, level + 1));
        stack.push((a, bisection, level + 1));
    }

    if points.is_empty() {
        points.push(p1);
    }
    points
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord_table::ArcKind;
    use std::f64::consts::{FRAC_1_SQRT_2, PI};

    const EPS: f64 = 1e-9;

    fn ccw_turn() -> TransAffine {
        circular_arc_matrix(true, &TransAffine::new()).unwrap()
    }

    #[test]
    fn test_quarter_circle_points_on_circle() {
        let pts = tessellate_arc(
            PointD::new(1.0, 0.0),
            PointD::new(0.0, 1.0),
            &ccw_turn(),
            &ArcKind::Quarter.chord_row(),
            PointEquality::Real,
        );
        assert_eq!(pts.len(), 1 << MAX_ARC_SUBDIVISIONS);
        for p in &pts {
            assert!((p.length_sq() - 1.0).abs() < EPS);
        }
        assert_eq!(*pts.last().unwrap(), PointD::new(0.0, 1.0));
        // Counterclockwise, evenly spaced.
        let step = PI / 2.0 / pts.len() as f64;
        for (i, p) in pts.iter().enumerate() {
            assert!((p.y.atan2(p.x) - step * (i + 1) as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_half_circle_bulges_in_sweep_direction() {
        let row = ArcKind::Half.chord_row();
        let ccw = tessellate_arc(
            PointD::new(1.0, 0.0),
            PointD::new(-1.0, 0.0),
            &ccw_turn(),
            &row,
            PointEquality::Real,
        );
        assert!(ccw.iter().all(|p| p.y >= -EPS));
        let mid = ccw[ccw.len() / 2 - 1];
        assert!((mid.x).abs() < EPS && (mid.y - 1.0).abs() < EPS);

        let cw_turn = circular_arc_matrix(false, &TransAffine::new()).unwrap();
        let cw = tessellate_arc(
            PointD::new(1.0, 0.0),
            PointD::new(-1.0, 0.0),
            &cw_turn,
            &row,
            PointEquality::Real,
        );
        assert!(cw.iter().all(|p| p.y <= EPS));
    }

    #[test]
    fn test_three_quarter_arc() {
        let pts = tessellate_arc(
            PointD::new(1.0, 0.0),
            PointD::new(0.0, -1.0),
            &ccw_turn(),
            &ArcKind::ThreeQuarter.chord_row(),
            PointEquality::Real,
        );
        let mid = pts[pts.len() / 2 - 1];
        assert!((mid.x + FRAC_1_SQRT_2).abs() < EPS);
        assert!((mid.y - FRAC_1_SQRT_2).abs() < EPS);
        for p in &pts {
            assert!((p.length_sq() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_user_defined_angle() {
        let angle: f64 = 1.0;
        let p1 = PointD::new(angle.cos(), angle.sin());
        let pts = tessellate_arc(
            PointD::new(1.0, 0.0),
            p1,
            &ccw_turn(),
            &ArcKind::from_angle(angle).chord_row(),
            PointEquality::Real,
        );
        for p in &pts {
            assert!((p.length_sq() - 1.0).abs() < EPS);
            let a = p.y.atan2(p.x);
            assert!(a > 0.0 && a <= angle + EPS);
        }
    }

    #[test]
    fn test_elliptic_quarter() {
        let u = PointD::new(4.0, 0.0);
        let v = PointD::new(0.0, 1.0);
        let turn = elliptic_arc_matrix(u, v).unwrap();
        assert_eq!(turn.map_vector(u), v);
        assert_eq!(turn.map_vector(v), -u);
        let pts = tessellate_arc(u, v, &turn, &ArcKind::Quarter.chord_row(), PointEquality::Real);
        for p in &pts {
            let r = (p.x / 4.0).powi(2) + p.y * p.y;
            assert!((r - 1.0).abs() < EPS);
            assert!(p.x >= -EPS && p.y >= -EPS);
        }
    }

    #[test]
    fn test_circle_through_nonuniform_transform() {
        let device = TransAffine::new_scaling(3.0, 1.0);
        let turn = circular_arc_matrix(true, &device).unwrap();
        let p0 = device.map_point(PointD::new(1.0, 0.0));
        let p1 = device.map_point(PointD::new(0.0, 1.0));
        let pts = tessellate_arc(p0, p1, &turn, &ArcKind::Quarter.chord_row(), PointEquality::Real);
        for p in &pts {
            let user = device.unmap_point(*p);
            assert!((user.length_sq() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_segment_count_bounds() {
        let row = ArcKind::Quarter.chord_row();
        for radius in [0.4, 1.0, 3.0, 10.0, 1000.0] {
            let pts = tessellate_arc(
                PointD::new(radius, 0.0),
                PointD::new(0.0, radius),
                &ccw_turn(),
                &row,
                PointEquality::Raster,
            );
            assert!(!pts.is_empty());
            assert!(pts.len() <= 1 << MAX_ARC_SUBDIVISIONS);
        }
    }

    #[test]
    fn test_raster_drops_subpixel_segments() {
        let pts = tessellate_arc(
            PointD::new(3.0, 0.0),
            PointD::new(0.0, 3.0),
            &ccw_turn(),
            &ArcKind::Quarter.chord_row(),
            PointEquality::Raster,
        );
        assert!(pts.len() < 1 << MAX_ARC_SUBDIVISIONS);
        let mut prev = PointD::new(3.0, 0.0).rounded();
        for p in &pts {
            assert_ne!(p.rounded(), prev);
            prev = p.rounded();
        }
    }

    #[test]
    fn test_zero_length_arc_is_one_segment() {
        let p = PointD::new(2.5, -1.0);
        let pts = tessellate_arc(p, p, &ccw_turn(), &ArcKind::Half.chord_row(), PointEquality::Real);
        assert_eq!(pts, vec![p]);
    }

    #[test]
    fn test_collapsed_arc_falls_back_to_endpoint() {
        let p0 = PointD::new(0.1, 0.0);
        let p1 = PointD::new(0.0, 0.1);
        let pts = tessellate_arc(p0, p1, &ccw_turn(), &ArcKind::Quarter.chord_row(), PointEquality::Raster);
        assert_eq!(pts, vec![p1]);
    }

    #[test]
    fn test_parallel_semi_diameters() {
        assert!(elliptic_arc_matrix(PointD::new(1.0, 1.0), PointD::new(2.0, 2.0)).is_none());
    }
}

//! Chord-bisection scale factors.
//!
//! Bisecting a circular arc of angle `θ` produces two arcs of `θ/2`. If `s`
//! is the sagitta of the parent arc (as a fraction of the radius), the
//! sagitta of each half is `1 − sqrt(1 − s/2)`. The point on the arc above a
//! chord's midpoint sits at `factor · |chord|` along the outward normal,
//! where `factor = 0.5·s / sqrt(s·(2 − s))`.
//!
//! The three fixed arc kinds share one immutable table built on first use.
//! Arcs of any other angle get a row computed by value for the single
//! tessellation that needs it, so no mutable table is ever shared.

use std::sync::OnceLock;

/// Number of bisection levels an arc is subdivided through (at most
/// `2^MAX_ARC_SUBDIVISIONS` segments per arc).
pub const MAX_ARC_SUBDIVISIONS: usize = 5;

/// Scale factors for levels `0..MAX_ARC_SUBDIVISIONS`.
pub type ChordRow = [f64; MAX_ARC_SUBDIVISIONS];

/// Angle subtended by an arc handed to the tessellator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcKind {
    Quarter,
    Half,
    ThreeQuarter,
    /// Any other angle, described by its sagitta as a fraction of the
    /// radius (`1 − cos(θ/2)`).
    UserDefined { sagitta: f64 },
}

impl ArcKind {
    /// Sagitta of a whole arc of this kind, as a fraction of the radius.
    pub fn sagitta(&self) -> f64 {
        match *self {
            // 1 - cos(45°), 1 - cos(90°), 1 - cos(135°)
            ArcKind::Quarter => 1.0 - std::f64::consts::FRAC_1_SQRT_2,
            ArcKind::Half => 1.0,
            ArcKind::ThreeQuarter => 1.0 + std::f64::consts::FRAC_1_SQRT_2,
            ArcKind::UserDefined { sagitta } => sagitta,
        }
    }

    /// User-defined kind for a circular arc subtending `angle` radians.
    pub fn from_angle(angle: f64) -> Self {
        ArcKind::UserDefined {
            sagitta: 1.0 - (0.5 * angle).cos(),
        }
    }

    /// The factor row for this kind. Fixed kinds come from the shared
    /// table; user-defined kinds are computed on the spot.
    pub fn chord_row(&self) -> ChordRow {
        let table = ChordTable::fixed();
        match *self {
            ArcKind::Quarter => table.quarter,
            ArcKind::Half => table.half,
            ArcKind::ThreeQuarter => table.three_quarter,
            ArcKind::UserDefined { sagitta } => compute_chord_row(sagitta),
        }
    }
}

/// Precomputed rows for the fixed arc kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordTable {
    pub quarter: ChordRow,
    pub half: ChordRow,
    pub three_quarter: ChordRow,
}

static FIXED_TABLE: OnceLock<ChordTable> = OnceLock::new();

impl ChordTable {
    /// The process-wide table, initialized on first access.
    pub fn fixed() -> &'static ChordTable {
        FIXED_TABLE.get_or_init(|| ChordTable {
            quarter: compute_chord_row(ArcKind::Quarter.sagitta()),
            half: compute_chord_row(ArcKind::Half.sagitta()),
            three_quarter: compute_chord_row(ArcKind::ThreeQuarter.sagitta()),
        })
    }
}

/// Run the sagitta recurrence from `sagitta` and return the factor for
/// every subdivision level.
///
/// The half chord starts at `sqrt(s·(2 − s))` and is then carried down
/// the levels as `h' = 0.5·h / (1 − s')`.
pub fn compute_chord_row(sagitta: f64) -> ChordRow {
    let mut row = [0.0; MAX_ARC_SUBDIVISIONS];
    let mut s = sagitta;
    let mut half_chord = (s * (2.0 - s)).max(0.0).sqrt();
    for factor in row.iter_mut() {
        *factor = if half_chord > 0.0 { 0.5 * s / half_chord } else { 0.0 };
        s = 1.0 - (1.0 - 0.5 * s).sqrt();
        half_chord = 0.5 * half_chord / (1.0 - s);
    }
    row
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-12;

    // factor = 0.5 * tan(θ/4) for an arc of angle θ
    fn expected(angle: f64) -> f64 {
        0.5 * (0.25 * angle).tan()
    }

    #[test]
    fn test_half_row_first_entry() {
        assert!((ChordTable::fixed().half[0] - 0.5).abs() < EPS);
    }

    #[test]
    fn test_fixed_rows_match_closed_form() {
        let t = ChordTable::fixed();
        for k in 0..MAX_ARC_SUBDIVISIONS {
            let div = (1u32 << k) as f64;
            assert!((t.quarter[k] - expected(PI / 2.0 / div)).abs() < EPS);
            assert!((t.half[k] - expected(PI / div)).abs() < EPS);
            assert!((t.three_quarter[k] - expected(1.5 * PI / div)).abs() < 1e-11);
        }
    }

    #[test]
    fn test_rows_decrease_with_depth() {
        let row = ArcKind::ThreeQuarter.chord_row();
        for w in row.windows(2) {
            assert!(w[1] < w[0]);
        }
    }

    #[test]
    fn test_user_defined_matches_fixed() {
        let user = ArcKind::from_angle(PI / 2.0).chord_row();
        let fixed = ArcKind::Quarter.chord_row();
        for (u, f) in user.iter().zip(fixed.iter()) {
            assert!((u - f).abs() < EPS);
        }
    }

    #[test]
    fn test_user_defined_rows_are_independent() {
        let a = ArcKind::from_angle(0.3).chord_row();
        let b = ArcKind::from_angle(2.0).chord_row();
        assert!((a[0] - expected(0.3)).abs() < EPS);
        assert!((b[0] - expected(2.0)).abs() < EPS);
        // Computing b did not disturb a.
        assert_eq!(a, ArcKind::from_angle(0.3).chord_row());
    }

    #[test]
    fn test_user_defined_every_level_matches_closed_form() {
        for angle in [0.05, 1.0, 2.5, 3.0] {
            let row = ArcKind::from_angle(angle).chord_row();
            for (k, f) in row.iter().enumerate() {
                let div = (1u32 << k) as f64;
                assert!((f - expected(angle / div)).abs() < 1e-11);
            }
        }
    }

    #[test]
    fn test_zero_sagitta() {
        assert_eq!(compute_chord_row(0.0), [0.0; MAX_ARC_SUBDIVISIONS]);
    }
}

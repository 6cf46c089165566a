//! Foundation types, rounding helpers and the point-equality policy.
//!
//! Everything else in the crate depends on these: the device point type,
//! integer rounding for raster devices, and the relative "fuzz" used when
//! classifying matrices.

use core::ops::{Add, Mul, Neg, Sub};

// ============================================================================
// Rounding
// ============================================================================

/// Round a double to the nearest integer (round half away from zero).
#[inline]
pub fn iround(v: f64) -> i32 {
    if v < 0.0 {
        (v - 0.5) as i32
    } else {
        (v + 0.5) as i32
    }
}

// ============================================================================
// Mathematical constants
// ============================================================================

pub const PI: f64 = std::f64::consts::PI;

/// Convert degrees to radians.
#[inline]
pub fn deg2rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Relative tolerance used when classifying matrices and arc geometry.
pub const FUZZ: f64 = 0.000_000_1;

/// Returns `true` if `v` is negligible compared with `scale`.
///
/// `scale` must already be expressed in the same units as `v` (for matrix
/// classification that means squared coefficients).
#[inline]
pub fn is_negligible(v: f64, scale: f64) -> bool {
    v.abs() <= FUZZ * scale
}

// ============================================================================
// Point
// ============================================================================

/// A 2D point or vector with `f64` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointD {
    pub x: f64,
    pub y: f64,
}

impl PointD {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint of `self` and `p`.
    #[inline]
    pub fn midpoint(self, p: PointD) -> PointD {
        PointD::new(0.5 * (self.x + p.x), 0.5 * (self.y + p.y))
    }

    /// Dot product, treating both points as vectors.
    #[inline]
    pub fn dot(self, p: PointD) -> f64 {
        self.x * p.x + self.y * p.y
    }

    /// Z component of the cross product, treating both points as vectors.
    #[inline]
    pub fn cross(self, p: PointD) -> f64 {
        self.x * p.y - self.y * p.x
    }

    /// Squared length, treating the point as a vector.
    #[inline]
    pub fn length_sq(self) -> f64 {
        self.dot(self)
    }

    /// Nearest integer grid point.
    #[inline]
    pub fn rounded(self) -> (i32, i32) {
        (iround(self.x), iround(self.y))
    }
}

impl Add for PointD {
    type Output = PointD;
    fn add(self, rhs: PointD) -> PointD {
        PointD::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PointD {
    type Output = PointD;
    fn sub(self, rhs: PointD) -> PointD {
        PointD::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for PointD {
    type Output = PointD;
    fn mul(self, rhs: f64) -> PointD {
        PointD::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for PointD {
    type Output = PointD;
    fn neg(self) -> PointD {
        PointD::new(-self.x, -self.y)
    }
}

// ============================================================================
// Point equality policy
// ============================================================================

/// How two device points are compared for "same point" tests.
///
/// Raster devices compare after rounding to the integer grid, so two points
/// that differ only in sub-pixel position are the same point. Real-valued
/// devices compare coordinates exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointEquality {
    Raster,
    #[default]
    Real,
}

impl PointEquality {
    /// Returns `true` if `a` and `b` land on the same device point.
    #[inline]
    pub fn same(self, a: PointD, b: PointD) -> bool {
        match self {
            PointEquality::Raster => a.rounded() == b.rounded(),
            PointEquality::Real => a.x == b.x && a.y == b.y,
        }
    }

    /// Returns `true` for integer-addressed devices.
    #[inline]
    pub fn is_raster(self) -> bool {
        self == PointEquality::Raster
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iround() {
        assert_eq!(iround(0.4), 0);
        assert_eq!(iround(0.5), 1);
        assert_eq!(iround(-0.5), -1);
        assert_eq!(iround(-0.4), 0);
        assert_eq!(iround(2.7), 3);
    }

    #[test]
    fn test_deg2rad() {
        assert!((deg2rad(180.0) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_point_ops() {
        let a = PointD::new(1.0, 2.0);
        let b = PointD::new(3.0, -1.0);
        assert_eq!(a + b, PointD::new(4.0, 1.0));
        assert_eq!(a - b, PointD::new(-2.0, 3.0));
        assert_eq!(a * 2.0, PointD::new(2.0, 4.0));
        assert_eq!(-a, PointD::new(-1.0, -2.0));
        assert_eq!(a.midpoint(b), PointD::new(2.0, 0.5));
        assert_eq!(a.dot(b), 1.0);
        assert_eq!(a.cross(b), -7.0);
    }

    #[test]
    fn test_raster_equality_ignores_subpixel() {
        let a = PointD::new(10.2, 5.1);
        let b = PointD::new(9.8, 4.9);
        assert!(PointEquality::Raster.same(a, b));
        assert!(!PointEquality::Real.same(a, b));
    }

    #[test]
    fn test_real_equality_is_exact() {
        let a = PointD::new(1.0, 1.0);
        assert!(PointEquality::Real.same(a, PointD::new(1.0, 1.0)));
        assert!(!PointEquality::Real.same(a, PointD::new(1.0, 1.0 + 1e-15)));
    }

    #[test]
    fn test_is_negligible() {
        assert!(is_negligible(1e-9, 1.0));
        assert!(!is_negligible(1e-3, 1.0));
        assert!(is_negligible(1e-3, 1e6));
    }
}

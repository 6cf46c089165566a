//! Affine user-to-device transformation.
//!
//! A 2x2 linear part plus translation, together with the classification the
//! plotter consults before choosing a native or tessellated rendering:
//! uniform scaling, axis preservation and orientation. The classification is
//! re-derived from scratch by every mutating operation, so the flags can
//! never disagree with the coefficients.

use crate::basics::{is_negligible, PointD, PointEquality};

/// Epsilon for coefficient-wise matrix comparisons.
pub const AFFINE_EPSILON: f64 = 1e-14;

/// 2D affine transformation matrix.
///
/// Stores six components: `[sx, shy, shx, sy, tx, ty]` representing the
/// matrix:
///
/// ```text
///   | sx  shx tx |
///   | shy  sy ty |
///   |  0    0  1 |
/// ```
///
/// Transform: `x' = x*sx + y*shx + tx`, `y' = x*shy + y*sy + ty`.
#[derive(Debug, Clone, Copy)]
pub struct TransAffine {
    sx: f64,
    shy: f64,
    shx: f64,
    sy: f64,
    tx: f64,
    ty: f64,
    flip_y: bool,
    equality: PointEquality,
    uniform: bool,
    axes_preserved: bool,
    nonreflection: bool,
}

impl TransAffine {
    // ====================================================================
    // Construction
    // ====================================================================

    /// Identity matrix on a real-valued, unflipped device.
    pub fn new() -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Custom matrix from six components.
    pub fn new_custom(sx: f64, shy: f64, shx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        let mut m = Self {
            sx,
            shy,
            shx,
            sy,
            tx,
            ty,
            flip_y: false,
            equality: PointEquality::Real,
            uniform: false,
            axes_preserved: false,
            nonreflection: false,
        };
        m.derive();
        m
    }

    /// Construct from a `[6]` array: `[sx, shy, shx, sy, tx, ty]`.
    pub fn from_array(m: &[f64; 6]) -> Self {
        Self::new_custom(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// Rotation matrix.
    pub fn new_rotation(a: f64) -> Self {
        let (sa, ca) = a.sin_cos();
        Self::new_custom(ca, sa, -sa, ca, 0.0, 0.0)
    }

    /// Non-uniform scaling matrix.
    pub fn new_scaling(x: f64, y: f64) -> Self {
        Self::new_custom(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    /// Uniform scaling matrix.
    pub fn new_scaling_uniform(s: f64) -> Self {
        Self::new_custom(s, 0.0, 0.0, s, 0.0, 0.0)
    }

    /// Translation matrix.
    pub fn new_translation(x: f64, y: f64) -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Attach the device conventions the classification depends on.
    ///
    /// `flip_y` states that the device's y axis points the other way from
    /// the user's, which inverts the meaning of the determinant's sign.
    pub fn with_device(mut self, flip_y: bool, equality: PointEquality) -> Self {
        self.flip_y = flip_y;
        self.equality = equality;
        self.derive();
        self
    }

    /// Map one parallelogram to another.
    ///
    /// `src` and `dst` are `[x1,y1, x2,y2, x3,y3]`: three corners, the
    /// fourth is implicit. Returns `None` when `src` is degenerate.
    pub fn parl_to_parl(src: &[f64; 6], dst: &[f64; 6]) -> Option<Self> {
        let from = Self::new_custom(
            src[2] - src[0],
            src[3] - src[1],
            src[4] - src[0],
            src[5] - src[1],
            src[0],
            src[1],
        );
        let mut m = from.inverted()?;
        m.multiply(&Self::new_custom(
            dst[2] - dst[0],
            dst[3] - dst[1],
            dst[4] - dst[0],
            dst[5] - dst[1],
            dst[0],
            dst[1],
        ));
        Some(m)
    }

    /// Map a parallelogram to a rectangle.
    pub fn parl_to_rect(parl: &[f64; 6], x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
        let dst = [x1, y1, x2, y1, x1, y2];
        Self::parl_to_parl(parl, &dst)
    }

    // ====================================================================
    // Whole-value replacement
    // ====================================================================

    /// Replace all six coefficients, keeping the device conventions.
    pub fn set(&mut self, m: &[f64; 6]) -> &mut Self {
        self.sx = m[0];
        self.shy = m[1];
        self.shx = m[2];
        self.sy = m[3];
        self.tx = m[4];
        self.ty = m[5];
        self.derive();
        self
    }

    /// The six coefficients as `[sx, shy, shx, sy, tx, ty]`.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.sx, self.shy, self.shx, self.sy, self.tx, self.ty]
    }

    // ====================================================================
    // Composition
    // ====================================================================

    /// Post-multiply: `self = self * m` (`self` is applied first).
    pub fn multiply(&mut self, m: &TransAffine) -> &mut Self {
        let t0 = self.sx * m.sx + self.shy * m.shx;
        let t2 = self.shx * m.sx + self.sy * m.shx;
        let t4 = self.tx * m.sx + self.ty * m.shx + m.tx;
        self.shy = self.sx * m.shy + self.shy * m.sy;
        self.sy = self.shx * m.shy + self.sy * m.sy;
        self.ty = self.tx * m.shy + self.ty * m.sy + m.ty;
        self.sx = t0;
        self.shx = t2;
        self.tx = t4;
        self.derive();
        self
    }

    /// Left-multiply by `m`: the new matrix is applied before the current
    /// one. Reflections and shears are accepted as they come.
    pub fn concat(&mut self, m: &TransAffine) -> &mut Self {
        let mut t = *m;
        t.multiply(self);
        t.flip_y = self.flip_y;
        t.equality = self.equality;
        t.derive();
        *self = t;
        self
    }

    /// The inverse mapping, or `None` for a singular matrix.
    pub fn inverted(&self) -> Option<TransAffine> {
        if self.is_singular() {
            return None;
        }
        let d = 1.0 / self.determinant();
        let mut m = *self;
        m.sx = self.sy * d;
        m.sy = self.sx * d;
        m.shy = -self.shy * d;
        m.shx = -self.shx * d;
        m.tx = -self.tx * m.sx - self.ty * m.shx;
        m.ty = -self.tx * m.shy - self.ty * m.sy;
        m.derive();
        Some(m)
    }

    // ====================================================================
    // Mapping
    // ====================================================================

    /// Forward transform of a point.
    #[inline]
    pub fn map_point(&self, p: PointD) -> PointD {
        PointD::new(
            p.x * self.sx + p.y * self.shx + self.tx,
            p.x * self.shy + p.y * self.sy + self.ty,
        )
    }

    /// Forward transform of a displacement (no translation).
    #[inline]
    pub fn map_vector(&self, v: PointD) -> PointD {
        PointD::new(v.x * self.sx + v.y * self.shx, v.x * self.shy + v.y * self.sy)
    }

    /// Inverse of [`map_vector`](Self::map_vector).
    ///
    /// Divides by the determinant; a singular matrix yields non-finite
    /// components.
    #[inline]
    pub fn unmap_vector(&self, v: PointD) -> PointD {
        let d = 1.0 / self.determinant();
        PointD::new(
            (v.x * self.sy - v.y * self.shx) * d,
            (v.y * self.sx - v.x * self.shy) * d,
        )
    }

    /// Inverse of [`map_point`](Self::map_point).
    #[inline]
    pub fn unmap_point(&self, p: PointD) -> PointD {
        self.unmap_vector(PointD::new(p.x - self.tx, p.y - self.ty))
    }

    // ====================================================================
    // Classification
    // ====================================================================

    /// Rotation plus uniform scaling (possibly with reflection).
    #[inline]
    pub fn is_uniform(&self) -> bool {
        self.uniform
    }

    /// No rotation or shear: upright rectangles stay upright.
    #[inline]
    pub fn axes_preserved(&self) -> bool {
        self.axes_preserved
    }

    /// Orientation is preserved once the device's y convention is taken
    /// into account.
    #[inline]
    pub fn is_nonreflection(&self) -> bool {
        self.nonreflection
    }

    #[inline]
    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    /// The same-point policy of the device this transform targets.
    #[inline]
    pub fn point_equality(&self) -> PointEquality {
        self.equality
    }

    fn derive(&mut self) {
        // Linear classification: compared against the matrix's own size.
        let lin = self
            .sx
            .abs()
            .max(self.shy.abs())
            .max(self.shx.abs())
            .max(self.sy.abs());
        self.axes_preserved = is_negligible(self.shy, lin) && is_negligible(self.shx, lin);

        let row0 = self.sx * self.sx + self.shx * self.shx;
        let row1 = self.shy * self.shy + self.sy * self.sy;
        let dot = self.sx * self.shy + self.shx * self.sy;
        let sq = row0.max(row1);
        self.uniform = is_negligible(row0 - row1, sq) && is_negligible(dot, sq);

        let det = self.determinant();
        self.nonreflection = if self.flip_y { det < 0.0 } else { det >= 0.0 };
    }

    // ====================================================================
    // Auxiliary
    // ====================================================================

    /// Determinant of the 2x2 portion.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.sx * self.sy - self.shy * self.shx
    }

    /// `true` when the determinant vanishes relative to the coefficients.
    pub fn is_singular(&self) -> bool {
        let sq = (self.sx * self.sx)
            .max(self.shy * self.shy)
            .max(self.shx * self.shx)
            .max(self.sy * self.sy);
        sq == 0.0 || is_negligible(self.determinant(), sq)
    }

    /// Smallest singular value of the linear part: the factor by which the
    /// thinnest direction is scaled.
    pub fn min_singular_value(&self) -> f64 {
        let a = self.sx * self.sx + self.shy * self.shy + self.shx * self.shx + self.sy * self.sy;
        let d = self.determinant();
        let disc = (a * a - 4.0 * d * d).max(0.0).sqrt();
        (0.5 * (a - disc)).max(0.0).sqrt()
    }

    /// Check if this is an identity matrix.
    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.is_equal(&TransAffine::new(), epsilon)
    }

    /// Check if two matrices are equal within epsilon, coefficient-wise.
    pub fn is_equal(&self, m: &TransAffine, epsilon: f64) -> bool {
        self.coefficients()
            .iter()
            .zip(m.coefficients().iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for TransAffine {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TransAffine {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other, AFFINE_EPSILON)
    }
}

impl std::ops::Mul for TransAffine {
    type Output = TransAffine;
    fn mul(self, rhs: TransAffine) -> TransAffine {
        let mut result = self;
        result.multiply(&rhs);
        result
    }
}

// ============================================================================
// Tests
// ============================================================================

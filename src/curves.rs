//! Bezier curve flattening.
//!
//! Quadratic and cubic curves are flattened by adaptive de Casteljau
//! subdivision in the device frame: a piece is accepted once its control
//! points lie within the distance tolerance of its chord, otherwise it is
//! split in half.

use crate::basics::PointD;

const CURVE_COLLINEARITY_EPSILON: f64 = 1e-30;
const CURVE_RECURSION_LIMIT: u32 = 32;

#[inline]
fn calc_sq_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}

/// Subdivision flattener for quadratic and cubic Bezier curves.
///
/// The distance tolerance is `0.5 / approximation_scale` device units, so
/// a scale of 1 keeps every flattened point within half a pixel.
#[derive(Debug, Clone)]
pub struct CurveFlattener {
    approximation_scale: f64,
    distance_tolerance_square: f64,
    points: Vec<PointD>,
}

impl CurveFlattener {
    pub fn new(approximation_scale: f64) -> Self {
        let mut c = Self {
            approximation_scale: 1.0,
            distance_tolerance_square: 0.25,
            points: Vec::new(),
        };
        c.set_approximation_scale(approximation_scale);
        c
    }

    pub fn set_approximation_scale(&mut self, s: f64) {
        self.approximation_scale = if s > 0.0 { s } else { 1.0 };
        let d = 0.5 / self.approximation_scale;
        self.distance_tolerance_square = d * d;
    }

    pub fn approximation_scale(&self) -> f64 {
        self.approximation_scale
    }

    /// Flatten a quadratic curve. The result starts after `p1` and ends
    /// with `p3`.
    pub fn quadratic(&mut self, p1: PointD, p2: PointD, p3: PointD) -> Vec<PointD> {
        self.points.clear();
        self.recursive_quadratic(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y, 0);
        self.points.push(p3);
        std::mem::take(&mut self.points)
    }

    /// Flatten a cubic curve. The result starts after `p1` and ends with
    /// `p4`.
    pub fn cubic(&mut self, p1: PointD, p2: PointD, p3: PointD, p4: PointD) -> Vec<PointD> {
        self.points.clear();
        self.recursive_cubic(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y, p4.x, p4.y, 0);
        self.points.push(p4);
        std::mem::take(&mut self.points)
    }

    #[allow(clippy::too_many_arguments)]
    fn recursive_quadratic(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
        level: u32,
    ) {
        if level > CURVE_RECURSION_LIMIT {
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;

        let dx = x3 - x1;
        let dy = y3 - y1;
        let d = ((x2 - x3) * dy - (y2 - y3) * dx).abs();

        if d > CURVE_COLLINEARITY_EPSILON {
            if d * d <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                self.points.push(PointD::new(x123, y123));
                return;
            }
        } else {
            // Collinear control polygon
            let da = dx * dx + dy * dy;
            let d_val = if da == 0.0 {
                calc_sq_distance(x1, y1, x2, y2)
            } else {
                let t = ((x2 - x1) * dx + (y2 - y1) * dy) / da;
                if t > 0.0 && t < 1.0 {
                    // 1---2---3
                    return;
                }
                if t <= 0.0 {
                    calc_sq_distance(x2, y2, x1, y1)
                } else {
                    calc_sq_distance(x2, y2, x3, y3)
                }
            };
            if d_val < self.distance_tolerance_square {
                self.points.push(PointD::new(x2, y2));
                return;
            }
        }

        self.recursive_quadratic(x1, y1, x12, y12, x123, y123, level + 1);
        self.recursive_quadratic(x123, y123, x23, y23, x3, y3, level + 1);
    }

    #[allow(clippy::too_many_arguments)]
    fn recursive_cubic(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
        x4: f64,
        y4: f64,
        level: u32,
    ) {
        if level > CURVE_RECURSION_LIMIT {
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x34 = (x3 + x4) / 2.0;
        let y34 = (y3 + y4) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;
        let x234 = (x23 + x34) / 2.0;
        let y234 = (y23 + y34) / 2.0;
        let x1234 = (x123 + x234) / 2.0;
        let y1234 = (y123 + y234) / 2.0;

        let dx = x4 - x1;
        let dy = y4 - y1;

        let mut d2 = ((x2 - x4) * dy - (y2 - y4) * dx).abs();
        let mut d3 = ((x3 - x4) * dy - (y3 - y4) * dx).abs();

        let collinear = d2 <= CURVE_COLLINEARITY_EPSILON && d3 <= CURVE_COLLINEARITY_EPSILON;

        if collinear {
            // All collinear, or p1 == p4
            let k = dx * dx + dy * dy;
            if k == 0.0 {
                d2 = calc_sq_distance(x1, y1, x2, y2);
                d3 = calc_sq_distance(x4, y4, x3, y3);
            } else {
                let k = 1.0 / k;
                d2 = k * ((x2 - x1) * dx + (y2 - y1) * dy);
                d3 = k * ((x3 - x1) * dx + (y3 - y1) * dy);
                if d2 > 0.0 && d2 < 1.0 && d3 > 0.0 && d3 < 1.0 {
                    // 1---2---3---4
                    return;
                }
                d2 = if d2 <= 0.0 {
                    calc_sq_distance(x2, y2, x1, y1)
                } else if d2 >= 1.0 {
                    calc_sq_distance(x2, y2, x4, y4)
                } else {
                    calc_sq_distance(x2, y2, x1 + d2 * dx, y1 + d2 * dy)
                };
                d3 = if d3 <= 0.0 {
                    calc_sq_distance(x3, y3, x1, y1)
                } else if d3 >= 1.0 {
                    calc_sq_distance(x3, y3, x4, y4)
                } else {
                    calc_sq_distance(x3, y3, x1 + d3 * dx, y1 + d3 * dy)
                };
            }
            if d2 > d3 {
                if d2 < self.distance_tolerance_square {
                    self.points.push(PointD::new(x2, y2));
                    return;
                }
            } else if d3 < self.distance_tolerance_square {
                self.points.push(PointD::new(x3, y3));
                return;
            }
        } else if (d2 + d3) * (d2 + d3) <= self.distance_tolerance_square * (dx * dx + dy * dy) {
            self.points.push(PointD::new(x23, y23));
            return;
        }

        self.recursive_cubic(x1, y1, x12, y12, x123, y123, x1234, y1234, level + 1);
        self.recursive_cubic(x1234, y1234, x234, y234, x34, y34, x4, y4, level + 1);
    }
}

impl Default for CurveFlattener {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

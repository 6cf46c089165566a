//! Plotter core.
//!
//! [`PlotterCore`] owns the drawing-state stack of one open drawing object
//! and turns primitive calls in user coordinates into device-frame paths,
//! native arcs and markers handed to a [`BackendCapability`].
//!
//! An isolated arc is not drawn when it is called. It is stashed, and the
//! decision between a native arc and a tessellated one is made when the
//! next primitive arrives: a native arc can only be used if the arc turns
//! out to be the whole path.

use crate::backend::{ArcCapability, ArcShape, BackendCapability, NativeArc};
use crate::basics::{deg2rad, is_negligible, PointD};
use crate::chord_table::ArcKind;
use crate::config::PlotterConfig;
use crate::curves::CurveFlattener;
use crate::drawing_state::{
    Attributes, CapMode, DrawingState, FillRule, JoinMode, StashedArc, StashedArcKind,
    StateStack, DEFAULT_MITER_LIMIT, MAX_FILL_TYPE,
};
use crate::error::{PlotError, Result};
use crate::path_buffer::{PathBuffer, SegmentKind};
use crate::tessellator::{circular_arc_matrix, elliptic_arc_matrix, tessellate_arc};
use crate::trans_affine::TransAffine;

// ============================================================================
// Arc geometry
// ============================================================================

/// Resolved geometry of an arc call, in user coordinates.
#[derive(Debug, Clone, Copy)]
struct ArcGeometry {
    center: PointD,
    counterclockwise: bool,
    kind: ArcKind,
}

/// Circular arc from `p0` to `p1` about (approximately) `c`.
///
/// The center is moved onto the perpendicular bisector of the chord so
/// that both endpoints are on the circle. The arc sweeps at most 180°.
fn circular_arc_geometry(c: PointD, p0: PointD, p1: PointD) -> Result<ArcGeometry> {
    if p0 == p1 {
        return Err(PlotError::DegenerateGeometry(
            "arc endpoints coincide".into(),
        ));
    }
    if c == p0 || c == p1 {
        return Err(PlotError::DegenerateGeometry(
            "arc center is an endpoint".into(),
        ));
    }

    let mid = p0.midpoint(p1);
    let chord = p1 - p0;
    let normal = PointD::new(-chord.y, chord.x);
    let center = mid + normal * ((c - mid).dot(normal) / normal.length_sq());

    let u = p0 - center;
    let v = p1 - center;
    let r2 = u.length_sq();
    let cross = u.cross(v);
    let dot = u.dot(v);

    let kind = if is_negligible(cross, r2) && dot < 0.0 {
        ArcKind::Half
    } else if is_negligible(dot, r2) {
        ArcKind::Quarter
    } else {
        ArcKind::from_angle(cross.abs().atan2(dot))
    };

    Ok(ArcGeometry {
        center,
        counterclockwise: cross >= 0.0,
        kind,
    })
}

/// Quarter elliptic arc; `p0 − c` and `p1 − c` are conjugate
/// semi-diameters.
fn elliptic_arc_geometry(c: PointD, p0: PointD, p1: PointD) -> Result<ArcGeometry> {
    let u = p0 - c;
    let v = p1 - c;
    let cross = u.cross(v);
    if u.length_sq() == 0.0
        || v.length_sq() == 0.0
        || is_negligible(cross, u.length_sq().max(v.length_sq()))
    {
        return Err(PlotError::DegenerateGeometry(
            "elliptic arc semi-diameters are parallel".into(),
        ));
    }
    Ok(ArcGeometry {
        center: c,
        counterclockwise: cross >= 0.0,
        kind: ArcKind::Quarter,
    })
}

/// Semi-diameters lying along the coordinate axes.
fn axis_aligned(u: PointD, v: PointD) -> bool {
    (u.y == 0.0 && v.x == 0.0) || (u.x == 0.0 && v.y == 0.0)
}

fn not_open() -> PlotError {
    PlotError::InvalidOperation("plotter is not open".into())
}

// ============================================================================
// PlotterCore
// ============================================================================

/// Geometry engine of one drawing object.
///
/// Every primitive fails with [`PlotError::InvalidOperation`] while the
/// plotter is not open, without changing any state.
pub struct PlotterCore<'b> {
    backend: &'b mut dyn BackendCapability,
    config: PlotterConfig,
    /// Normalized (unit square) to device.
    device_map: TransAffine,
    stack: Option<StateStack>,
    flattener: CurveFlattener,
}

impl<'b> PlotterCore<'b> {
    pub fn new(backend: &'b mut dyn BackendCapability, config: PlotterConfig) -> Self {
        let flattener = CurveFlattener::new(config.curves.approximation_scale);
        Self {
            backend,
            config,
            device_map: TransAffine::new(),
            stack: None,
            flattener,
        }
    }

    pub fn with_defaults(backend: &'b mut dyn BackendCapability) -> Self {
        Self::new(backend, PlotterConfig::default())
    }

    pub fn config(&self) -> &PlotterConfig {
        &self.config
    }

    // ====================================================================
    // Lifecycle
    // ====================================================================

    /// Open the drawing object: a single frame, the unit square mapped onto
    /// the configured viewport, default attributes.
    pub fn open(&mut self) -> Result<()> {
        if self.stack.is_some() {
            return Err(PlotError::InvalidOperation(
                "open: plotter is already open".into(),
            ));
        }

        let [xmin, ymin, xmax, ymax] = self.config.device.viewport;
        let dst = if self.config.device.flip_y {
            [xmin, ymax, xmax, ymax, xmin, ymin]
        } else {
            [xmin, ymin, xmax, ymin, xmin, ymax]
        };
        let device_map = TransAffine::parl_to_parl(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &dst)
            .filter(|m| !m.is_singular())
            .ok_or_else(|| {
                tracing::debug!(viewport = ?self.config.device.viewport, "degenerate viewport");
                PlotError::SingularTransform
            })?;
        self.device_map = device_map;

        let transform = self.device_transform(TransAffine::new());
        let attributes = Attributes::new(self.config.default_line_width);
        let immediate = !self.config.paths.defer_arcs
            || self
                .backend
                .query_arc_capability(transform.axes_preserved(), transform.is_uniform())
                == ArcCapability::None;
        self.flattener
            .set_approximation_scale(self.config.curves.approximation_scale);
        self.stack = Some(StateStack::new(DrawingState::new(
            transform, attributes, immediate,
        )));
        tracing::debug!(immediate, "plotter opened");
        Ok(())
    }

    /// End the path of every frame, innermost first, and drop the stack.
    pub fn close(&mut self) -> Result<()> {
        self.check_open("close")?;
        loop {
            self.end_path_inner()?;
            let Some(stack) = self.stack.as_mut() else {
                break;
            };
            if stack.depth() <= 1 {
                break;
            }
            stack.pop()?;
        }
        self.stack = None;
        tracing::debug!("plotter closed");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.stack.is_some()
    }

    // ====================================================================
    // State access
    // ====================================================================

    fn check_open(&self, op: &str) -> Result<()> {
        if self.stack.is_none() {
            return Err(PlotError::InvalidOperation(format!(
                "{op}: plotter is not open"
            )));
        }
        Ok(())
    }

    fn frame(stack: &Option<StateStack>) -> Result<&DrawingState> {
        stack.as_ref().map(StateStack::top).ok_or_else(not_open)
    }

    fn frame_mut(stack: &mut Option<StateStack>) -> Result<&mut DrawingState> {
        stack.as_mut().map(StateStack::top_mut).ok_or_else(not_open)
    }

    /// Compose a user map with the normalized-to-device map and the device
    /// conventions.
    fn device_transform(&self, user: TransAffine) -> TransAffine {
        let mut t = user.with_device(self.config.device.flip_y, self.config.point_equality());
        t.multiply(&self.device_map);
        t
    }

    /// Number of frames on the stack (0 when closed).
    pub fn depth(&self) -> usize {
        self.stack.as_ref().map_or(0, StateStack::depth)
    }

    /// Top frame.
    pub fn state(&self) -> Option<&DrawingState> {
        self.stack.as_ref().map(StateStack::top)
    }

    /// Cursor in user coordinates.
    pub fn position(&self) -> Option<PointD> {
        self.state().map(|s| s.position)
    }

    /// Current user-to-device transform.
    pub fn transform(&self) -> Option<&TransAffine> {
        self.state().map(DrawingState::transform)
    }

    /// The path being built in the top frame.
    pub fn path(&self) -> Option<&PathBuffer> {
        self.state().map(|s| &s.path)
    }

    pub fn has_stashed_arc(&self) -> bool {
        self.state().map_or(false, DrawingState::has_stash)
    }

    // ====================================================================
    // Transform
    // ====================================================================

    /// Map the user rectangle `(x0,y0)-(x1,y1)` onto the viewport.
    pub fn space(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        self.space2(x0, y0, x1, y0, x0, y1)
    }

    /// Map the user parallelogram with lower-left `(x0,y0)`, lower-right
    /// `(x1,y1)` and upper-left `(x2,y2)` onto the viewport.
    pub fn space2(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        self.check_open("space")?;
        let src = [x0, y0, x1, y1, x2, y2];
        let user = TransAffine::parl_to_parl(&src, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        match user {
            Some(user) => self.install_user_map(user),
            None => {
                tracing::debug!(?src, "rejected singular viewport");
                Err(PlotError::SingularTransform)
            }
        }
    }

    /// Replace the user-to-normalized map with `m` (`[m0..m5]`).
    pub fn set_matrix(&mut self, m: [f64; 6]) -> Result<()> {
        self.check_open("set_matrix")?;
        let user = TransAffine::from_array(&m);
        if user.is_singular() {
            tracing::debug!(?m, "rejected singular matrix");
            return Err(PlotError::SingularTransform);
        }
        self.install_user_map(user)
    }

    fn install_user_map(&mut self, user: TransAffine) -> Result<()> {
        self.flush_stash()?;
        let t = self.device_transform(user);
        Self::frame_mut(&mut self.stack)?.set_transform(t);
        Ok(())
    }

    /// Apply `m` before the current transform.
    pub fn concat(&mut self, m: [f64; 6]) -> Result<()> {
        self.check_open("concat")?;
        let n = TransAffine::from_array(&m);
        if n.is_singular() {
            tracing::debug!(?m, "rejected singular concat");
            return Err(PlotError::SingularTransform);
        }
        self.flush_stash()?;
        let state = Self::frame_mut(&mut self.stack)?;
        let mut t = *state.transform();
        t.concat(&n);
        state.set_transform(t);
        Ok(())
    }

    pub fn translate(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.concat([1.0, 0.0, 0.0, 1.0, dx, dy])
    }

    /// Rotate the user frame by `angle` degrees.
    pub fn rotate(&mut self, angle: f64) -> Result<()> {
        let (s, c) = deg2rad(angle).sin_cos();
        self.concat([c, s, -s, c, 0.0, 0.0])
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> Result<()> {
        self.concat([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    // ====================================================================
    // Path lifecycle
    // ====================================================================

    /// Emit the current path (or its stashed arc) and leave the buffer
    /// empty.
    pub fn end_path(&mut self) -> Result<()> {
        self.check_open("end_path")?;
        self.end_path_inner()
    }

    fn end_path_inner(&mut self) -> Result<()> {
        self.flush_stash()?;
        let state = Self::frame_mut(&mut self.stack)?;
        let attributes = state.attributes;
        let Some(path) = state.path.finish() else {
            return Ok(());
        };

        if attributes.points_connected {
            tracing::debug!(points = path.points.len(), closed = path.closed, "emit path");
            self.backend.emit_path(&path, &attributes)?;
        } else {
            // The closing point repeats the first one.
            let n = path.points.len() - usize::from(path.closed);
            tracing::debug!(markers = n, "emit disconnected path");
            for p in &path.points[..n] {
                self.backend.emit_marker(p.point, &attributes)?;
            }
        }
        Ok(())
    }

    /// Draw the stashed arc, if any.
    fn flush_stash(&mut self) -> Result<()> {
        let state = Self::frame_mut(&mut self.stack)?;
        let Some(arc) = state.take_stash() else {
            return Ok(());
        };
        state.polygonal = true;
        tracing::debug!(kind = ?arc.kind, "flush stashed arc");
        let result = self.draw_arc_now(arc.kind, arc.center, arc.p0, arc.p1);
        Self::frame_mut(&mut self.stack)?.polygonal = false;
        result
    }

    /// End the path unless `p` is the cursor, then put the cursor at `p`.
    fn begin_contiguous(&mut self, p: PointD) -> Result<()> {
        if Self::frame(&self.stack)?.position != p {
            self.end_path_inner()?;
            Self::frame_mut(&mut self.stack)?.position = p;
        }
        Ok(())
    }

    /// End an over-long unfilled path.
    fn maybe_auto_flush(&mut self) -> Result<()> {
        let max = self.config.paths.max_unfilled_path_length;
        let state = Self::frame(&self.stack)?;
        if max > 0
            && !state.attributes.is_filled()
            && state.attributes.points_connected
            && state.path.len() >= max
        {
            tracing::debug!(points = state.path.len(), max, "auto-flush unfilled path");
            self.end_path_inner()?;
        }
        Ok(())
    }

    /// Append a straight segment to `p`, opening a path at the cursor if
    /// needed. The stash must already be flushed.
    fn append_line(&mut self, p: PointD) -> Result<()> {
        let state = Self::frame_mut(&mut self.stack)?;
        if state.path.is_empty() {
            let start = state.device_position();
            state.path.begin(start);
        }
        let d = state.transform().map_point(p);
        state.path.push(d, SegmentKind::Line);
        state.position = p;
        Ok(())
    }

    // ====================================================================
    // Lines
    // ====================================================================

    /// End the current path and move the cursor.
    pub fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.check_open("move_to")?;
        self.end_path_inner()?;
        Self::frame_mut(&mut self.stack)?.position = PointD::new(x, y);
        Ok(())
    }

    pub fn move_rel(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.check_open("move_rel")?;
        let p = Self::frame(&self.stack)?.position;
        self.move_to(p.x + dx, p.y + dy)
    }

    /// Continue the path with a straight segment from the cursor.
    pub fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.check_open("line_to")?;
        self.flush_stash()?;
        self.append_line(PointD::new(x, y))?;
        self.maybe_auto_flush()
    }

    pub fn line_rel(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.check_open("line_rel")?;
        let p = Self::frame(&self.stack)?.position;
        self.line_to(p.x + dx, p.y + dy)
    }

    /// Segment from `(x0,y0)` to `(x1,y1)`.
    pub fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        self.check_open("line")?;
        self.begin_contiguous(PointD::new(x0, y0))?;
        self.line_to(x1, y1)
    }

    /// Segments through `points`, starting at the first one.
    pub fn polyline(&mut self, points: &[PointD]) -> Result<()> {
        self.check_open("polyline")?;
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        self.begin_contiguous(*first)?;
        for p in rest {
            self.line_to(p.x, p.y)?;
        }
        Ok(())
    }

    /// Closed rectangle with opposite corners `(x0,y0)` and `(x1,y1)`,
    /// drawn as its own path. The cursor ends at the center.
    pub fn box_(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        self.check_open("box")?;
        self.move_to(x0, y0)?;
        for (x, y) in [(x1, y0), (x1, y1), (x0, y1), (x0, y0)] {
            self.flush_stash()?;
            self.append_line(PointD::new(x, y))?;
        }
        self.end_path_inner()?;
        Self::frame_mut(&mut self.stack)?.position =
            PointD::new(0.5 * (x0 + x1), 0.5 * (y0 + y1));
        Ok(())
    }

    /// Join the last point to the first one. The cursor moves to the start
    /// of the path.
    pub fn close_path(&mut self) -> Result<()> {
        self.check_open("close_path")?;
        self.flush_stash()?;
        let state = Self::frame_mut(&mut self.stack)?;
        if state.path.len() < 2 {
            return Ok(());
        }
        state.path.close();
        if let Some(start) = state.path.first() {
            state.position = state.transform().unmap_point(start);
        }
        Ok(())
    }

    // ====================================================================
    // Arcs
    // ====================================================================

    /// Circular arc from `(x0,y0)` to `(x1,y1)` about `(xc,yc)`, sweeping
    /// at most 180°.
    pub fn arc(&mut self, xc: f64, yc: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        self.check_open("arc")?;
        self.arc_primitive(
            StashedArcKind::Circular,
            PointD::new(xc, yc),
            PointD::new(x0, y0),
            PointD::new(x1, y1),
        )
    }

    /// Quarter ellipse about `(xc,yc)` whose vectors to `(x0,y0)` and
    /// `(x1,y1)` are conjugate semi-diameters.
    pub fn ellarc(&mut self, xc: f64, yc: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        self.check_open("ellarc")?;
        self.arc_primitive(
            StashedArcKind::Elliptic,
            PointD::new(xc, yc),
            PointD::new(x0, y0),
            PointD::new(x1, y1),
        )
    }

    fn arc_primitive(
        &mut self,
        kind: StashedArcKind,
        center: PointD,
        p0: PointD,
        p1: PointD,
    ) -> Result<()> {
        self.begin_contiguous(p0)?;

        if !Self::frame(&self.stack)?.attributes.points_connected {
            self.flush_stash()?;
            self.append_line(p1)?;
            return self.maybe_auto_flush();
        }

        self.flush_stash()?;
        let state = Self::frame_mut(&mut self.stack)?;
        if !state.immediate && state.path.is_empty() {
            state.stash_arc(StashedArc {
                kind,
                center,
                p0,
                p1,
            });
            state.position = p1;
            return Ok(());
        }

        self.draw_arc_now(kind, center, p0, p1)?;
        self.maybe_auto_flush()
    }

    /// Draw an arc natively or append its tessellation to the path.
    fn draw_arc_now(
        &mut self,
        kind: StashedArcKind,
        center: PointD,
        p0: PointD,
        p1: PointD,
    ) -> Result<()> {
        let geometry = match kind {
            StashedArcKind::Circular => circular_arc_geometry(center, p0, p1),
            StashedArcKind::Elliptic => elliptic_arc_geometry(center, p0, p1),
        };
        let geometry = match geometry {
            Ok(g) => g,
            Err(e) => {
                tracing::debug!(error = %e, "drawing arc as a line");
                return self.append_line(p1);
            }
        };

        let state = Self::frame(&self.stack)?;
        let t = *state.transform();
        let u = p0 - geometry.center;
        let v = p1 - geometry.center;
        let d0 = t.map_point(p0);
        let d1 = t.map_point(p1);

        if state.path.is_empty() {
            let capability = self
                .backend
                .query_arc_capability(t.axes_preserved(), t.is_uniform());
            let native = capability.permits(t.axes_preserved(), t.is_uniform())
                && !(kind == StashedArcKind::Elliptic
                    && capability == ArcCapability::AxisPreservingOnly
                    && !axis_aligned(u, v));
            if native {
                let arc = NativeArc {
                    shape: match kind {
                        StashedArcKind::Circular => ArcShape::Circular,
                        StashedArcKind::Elliptic => ArcShape::Elliptic,
                    },
                    center: t.map_point(geometry.center),
                    p0: d0,
                    p1: d1,
                    counterclockwise: geometry.counterclockwise != (t.determinant() < 0.0),
                };
                let attributes = state.attributes;
                tracing::debug!(shape = ?arc.shape, polygonal = state.polygonal, "emit native arc");
                self.backend.emit_native_arc(&arc, &attributes)?;
                Self::frame_mut(&mut self.stack)?.position = p1;
                return Ok(());
            }
        }

        let (turn, tag) = match kind {
            StashedArcKind::Circular => (
                circular_arc_matrix(geometry.counterclockwise, &t),
                SegmentKind::CircularArc,
            ),
            StashedArcKind::Elliptic => (
                elliptic_arc_matrix(t.map_vector(u), t.map_vector(v)),
                SegmentKind::EllipticArc,
            ),
        };
        let Some(turn) = turn else {
            tracing::debug!("singular arc matrix, drawing arc as a line");
            return self.append_line(p1);
        };
        let points = tessellate_arc(d0, d1, &turn, &geometry.kind.chord_row(), t.point_equality());
        let state = Self::frame_mut(&mut self.stack)?;
        tracing::trace!(
            segments = points.len(),
            kind = ?geometry.kind,
            polygonal = state.polygonal,
            "tessellated arc"
        );

        if state.path.is_empty() {
            state.path.begin(d0);
        }
        state.path.extend(points, tag);
        state.position = p1;
        Ok(())
    }

    /// Full circle, drawn as its own closed path.
    pub fn circle(&mut self, xc: f64, yc: f64, r: f64) -> Result<()> {
        self.check_open("circle")?;
        self.ellipse(xc, yc, r, r, 0.0)
    }

    /// Full ellipse with semi-axes `rx`, `ry`, the first rotated `angle`
    /// degrees from the x axis. Drawn as a closed path of four quarter
    /// elliptic arcs; the cursor ends at the center.
    ///
    /// Full ellipses are never offered to the backend as native arcs, even
    /// under [`ArcCapability::Any`] with no path open.
    pub fn ellipse(&mut self, xc: f64, yc: f64, rx: f64, ry: f64, angle: f64) -> Result<()> {
        self.check_open("ellipse")?;
        self.end_path_inner()?;

        let center = PointD::new(xc, yc);
        let (s, c) = deg2rad(angle).sin_cos();
        let u = PointD::new(rx * c, rx * s);
        let v = PointD::new(-ry * s, ry * c);
        let corners = [center + u, center + v, center - u, center - v, center + u];

        let state = Self::frame_mut(&mut self.stack)?;
        state.position = corners[0];
        let connected = state.attributes.points_connected;
        let start = state.device_position();
        state.path.begin(start);

        for pair in corners.windows(2) {
            if connected {
                self.draw_arc_now(StashedArcKind::Elliptic, center, pair[0], pair[1])?;
            } else {
                self.append_line(pair[1])?;
            }
        }

        Self::frame_mut(&mut self.stack)?.path.close();
        self.end_path_inner()?;
        Self::frame_mut(&mut self.stack)?.position = center;
        Ok(())
    }

    // ====================================================================
    // Bezier curves
    // ====================================================================

    /// Quadratic Bezier from `(x0,y0)` to `(x2,y2)` with control point
    /// `(x1,y1)`.
    pub fn bezier2(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        self.check_open("bezier2")?;
        let p = [PointD::new(x0, y0), PointD::new(x1, y1), PointD::new(x2, y2)];
        self.bezier_primitive(&p, SegmentKind::Quadratic)
    }

    /// Cubic Bezier from `(x0,y0)` to `(x3,y3)` with control points
    /// `(x1,y1)` and `(x2,y2)`.
    #[allow(clippy::too_many_arguments)]
    pub fn bezier3(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    ) -> Result<()> {
        self.check_open("bezier3")?;
        let p = [
            PointD::new(x0, y0),
            PointD::new(x1, y1),
            PointD::new(x2, y2),
            PointD::new(x3, y3),
        ];
        self.bezier_primitive(&p, SegmentKind::Cubic)
    }

    fn bezier_primitive(&mut self, control: &[PointD], tag: SegmentKind) -> Result<()> {
        let (first, last) = match (control.first(), control.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return Ok(()),
        };
        self.begin_contiguous(first)?;
        self.flush_stash()?;

        let state = Self::frame_mut(&mut self.stack)?;
        if !state.attributes.points_connected {
            self.append_line(last)?;
            return self.maybe_auto_flush();
        }

        // Affine maps carry control polygons to control polygons.
        let t = *state.transform();
        let d: Vec<PointD> = control.iter().map(|p| t.map_point(*p)).collect();
        let points = match tag {
            SegmentKind::Cubic => self.flattener.cubic(d[0], d[1], d[2], d[3]),
            _ => self.flattener.quadratic(d[0], d[1], d[2]),
        };
        tracing::trace!(segments = points.len(), ?tag, "flattened curve");

        if state.path.is_empty() {
            state.path.begin(d[0]);
        }
        state.path.extend(points, tag);
        state.position = last;
        self.maybe_auto_flush()
    }

    // ====================================================================
    // Markers
    // ====================================================================

    /// Single point marker at `(x,y)`, drawn on its own.
    pub fn point(&mut self, x: f64, y: f64) -> Result<()> {
        self.check_open("point")?;
        self.end_path_inner()?;
        let state = Self::frame_mut(&mut self.stack)?;
        state.position = PointD::new(x, y);
        let d = state.device_position();
        let attributes = state.attributes;
        self.backend.emit_marker(d, &attributes)?;
        Ok(())
    }

    // ====================================================================
    // Attributes
    // ====================================================================

    fn set_attribute<F>(&mut self, op: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut DrawingState),
    {
        self.check_open(op)?;
        self.end_path_inner()?;
        f(Self::frame_mut(&mut self.stack)?);
        Ok(())
    }

    /// Line width in user units; a negative width restores the default.
    pub fn set_line_width(&mut self, width: f64) -> Result<()> {
        let width = if width < 0.0 {
            self.config.default_line_width
        } else {
            width
        };
        self.set_attribute("set_line_width", |s| s.set_line_width(width))
    }

    pub fn set_join_mode(&mut self, join: JoinMode) -> Result<()> {
        self.set_attribute("set_join_mode", |s| s.attributes.join = join)
    }

    pub fn set_cap_mode(&mut self, cap: CapMode) -> Result<()> {
        self.set_attribute("set_cap_mode", |s| s.attributes.cap = cap)
    }

    /// Miter limit; non-positive restores the default, values below 1 are
    /// raised to 1.
    pub fn set_miter_limit(&mut self, limit: f64) -> Result<()> {
        let limit = if limit <= 0.0 {
            DEFAULT_MITER_LIMIT
        } else {
            limit.max(1.0)
        };
        self.set_attribute("set_miter_limit", |s| s.attributes.miter_limit = limit)
    }

    /// Fill level: 0 is unfilled, larger levels are clamped to 0xffff.
    pub fn set_fill_type(&mut self, level: u32) -> Result<()> {
        let level = level.min(MAX_FILL_TYPE);
        self.set_attribute("set_fill_type", |s| s.attributes.fill_type = level)
    }

    /// Fill rule, read when a path is emitted.
    pub fn set_fill_rule(&mut self, rule: FillRule) -> Result<()> {
        self.check_open("set_fill_rule")?;
        Self::frame_mut(&mut self.stack)?.attributes.fill_rule = rule;
        Ok(())
    }

    /// `false` draws the vertices of each path as separate markers.
    pub fn set_points_connected(&mut self, connected: bool) -> Result<()> {
        self.set_attribute("set_points_connected", |s| {
            s.attributes.points_connected = connected
        })
    }

    // ====================================================================
    // Save / restore
    // ====================================================================

    /// Push a frame with the current attributes, cursor and transform.
    /// A stashed arc is drawn first; the open path stays with the parent.
    pub fn save_state(&mut self) -> Result<()> {
        self.check_open("save_state")?;
        self.flush_stash()?;
        if let Some(stack) = self.stack.as_mut() {
            stack.push();
        }
        Ok(())
    }

    /// End the top frame's path and pop it.
    pub fn restore_state(&mut self) -> Result<()> {
        self.check_open("restore_state")?;
        if self.depth() <= 1 {
            return Err(PlotError::InvalidOperation(
                "restore_state: no saved drawing state".into(),
            ));
        }
        self.end_path_inner()?;
        match self.stack.as_mut() {
            Some(stack) => stack.pop().map(|_| ()),
            None => Err(not_open()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

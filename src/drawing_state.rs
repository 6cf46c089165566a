//! Drawing state and the save/restore stack.
//!
//! One [`DrawingState`] is one stack frame: cursor, transform, the path
//! being built, a possibly stashed arc, and the line/fill attributes that
//! are passed through to the backend with every emission.

use crate::basics::{iround, PointD};
use crate::error::{PlotError, Result};
use crate::path_buffer::PathBuffer;
use crate::trans_affine::TransAffine;

/// Default miter limit: miters are cut off below about 11°.
pub const DEFAULT_MITER_LIMIT: f64 = 10.4334305246;

/// Largest fill level; `fill_type` values above it are clamped.
pub const MAX_FILL_TYPE: u32 = 0xffff;

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    #[default]
    Miter,
    Round,
    Bevel,
    Triangular,
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapMode {
    #[default]
    Butt,
    Round,
    Projecting,
    Triangular,
}

/// Filling rule for closed paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

/// Line and fill attributes, stored verbatim and handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attributes {
    /// Line width in user units.
    pub line_width: f64,
    /// Line width in device units, derived from `line_width` and the
    /// current transform.
    pub device_line_width: f64,
    pub join: JoinMode,
    pub cap: CapMode,
    pub miter_limit: f64,
    /// 0 means unfilled; 1..=0xffff is a fill level.
    pub fill_type: u32,
    pub fill_rule: FillRule,
    /// `false` renders the vertices of a path as separate markers.
    pub points_connected: bool,
}

impl Attributes {
    pub fn new(line_width: f64) -> Self {
        Self {
            line_width,
            device_line_width: line_width,
            join: JoinMode::default(),
            cap: CapMode::default(),
            miter_limit: DEFAULT_MITER_LIMIT,
            fill_type: 0,
            fill_rule: FillRule::default(),
            points_connected: true,
        }
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.fill_type != 0
    }
}

/// Which arc primitive a stash holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StashedArcKind {
    Circular,
    Elliptic,
}

/// An arc call whose rendering has been deferred (user coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StashedArc {
    pub kind: StashedArcKind,
    pub center: PointD,
    pub p0: PointD,
    pub p1: PointD,
}

/// One frame of the drawing-state stack.
#[derive(Debug, Clone)]
pub struct DrawingState {
    /// Cursor in user coordinates.
    pub position: PointD,
    transform: TransAffine,
    pub path: PathBuffer,
    stash: Option<StashedArc>,
    /// Arcs are drawn at once instead of being stashed.
    pub immediate: bool,
    /// Set only while a stashed arc is being flushed, when a polyline
    /// fallback is expected. Advisory: it is reported in the arc's trace
    /// events and never changes how the arc is drawn.
    pub polygonal: bool,
    pub attributes: Attributes,
}

impl DrawingState {
    pub fn new(transform: TransAffine, attributes: Attributes, immediate: bool) -> Self {
        let mut state = Self {
            position: PointD::default(),
            transform,
            path: PathBuffer::new(transform.point_equality()),
            stash: None,
            immediate,
            polygonal: false,
            attributes,
        };
        state.update_device_line_width();
        state
    }

    /// A new frame for `save_state`: same attributes, cursor and transform,
    /// no path and no stash.
    pub fn child(&self) -> Self {
        Self {
            position: self.position,
            transform: self.transform,
            path: PathBuffer::new(self.transform.point_equality()),
            stash: None,
            immediate: self.immediate,
            polygonal: false,
            attributes: self.attributes,
        }
    }

    #[inline]
    pub fn transform(&self) -> &TransAffine {
        &self.transform
    }

    /// Replace the transform and re-derive the device line width.
    pub fn set_transform(&mut self, transform: TransAffine) {
        self.transform = transform;
        self.update_device_line_width();
    }

    /// Set the user line width and re-derive the device line width.
    pub fn set_line_width(&mut self, width: f64) {
        self.attributes.line_width = width;
        self.update_device_line_width();
    }

    fn update_device_line_width(&mut self) {
        let w = self.attributes.line_width * self.transform.min_singular_value();
        self.attributes.device_line_width = if self.transform.point_equality().is_raster() {
            iround(w).max(1) as f64
        } else {
            w
        };
    }

    /// Current cursor mapped to the device frame.
    pub fn device_position(&self) -> PointD {
        self.transform.map_point(self.position)
    }

    #[inline]
    pub fn has_stash(&self) -> bool {
        self.stash.is_some()
    }

    #[inline]
    pub fn stash(&self) -> Option<&StashedArc> {
        self.stash.as_ref()
    }

    /// Defer an arc. A path must not be in progress.
    pub fn stash_arc(&mut self, arc: StashedArc) {
        debug_assert!(self.path.is_empty());
        self.stash = Some(arc);
    }

    /// Remove and return the stashed arc, if any.
    pub fn take_stash(&mut self) -> Option<StashedArc> {
        self.stash.take()
    }
}

/// Stack of drawing states; the bottom frame is never popped.
#[derive(Debug, Clone)]
pub struct StateStack {
    states: Vec<DrawingState>,
}

impl StateStack {
    pub fn new(bottom: DrawingState) -> Self {
        Self {
            states: vec![bottom],
        }
    }

    /// Number of frames, at least 1.
    #[inline]
    pub fn depth(&self) -> usize {
        self.states.len()
    }

    pub fn top(&self) -> &DrawingState {
        // The bottom frame is never removed.
        &self.states[self.states.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut DrawingState {
        let n = self.states.len();
        &mut self.states[n - 1]
    }

    /// Push a copy of the top frame's attributes.
    pub fn push(&mut self) {
        let child = self.top().child();
        self.states.push(child);
    }

    /// Pop and return the top frame.
    pub fn pop(&mut self) -> Result<DrawingState> {
        if self.states.len() <= 1 {
            return Err(PlotError::InvalidOperation(
                "restore_state: no saved drawing state".into(),
            ));
        }
        self.states
            .pop()
            .ok_or_else(|| PlotError::InvalidOperation("restore_state: empty stack".into()))
    }
}

// ============================================================================
// Tests
// ============================================================================

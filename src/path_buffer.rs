//! Path buffer: the in-progress path of one drawing state.
//!
//! Points are stored in device coordinates, each tagged with the kind of
//! primitive that produced it. A buffer is either empty or holds an open
//! path beginning at its first point; [`PathBuffer::finish`] drains it into
//! a [`Path`] ready for emission.

use crate::basics::{PointD, PointEquality};

/// Primitive that produced a path point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Straight segment, also used for the starting point of a path.
    Line,
    CircularArc,
    EllipticArc,
    Quadratic,
    Cubic,
}

/// A device-frame point of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub point: PointD,
    pub kind: SegmentKind,
}

impl PathPoint {
    pub fn new(point: PointD, kind: SegmentKind) -> Self {
        Self { point, kind }
    }
}

/// A finished path handed to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub points: Vec<PathPoint>,
    /// First and last points are the same device point.
    pub closed: bool,
}

impl Path {
    /// Device coordinates only, in drawing order.
    pub fn coordinates(&self) -> impl Iterator<Item = PointD> + '_ {
        self.points.iter().map(|p| p.point)
    }
}

/// Growable storage for the path currently being built.
#[derive(Debug, Clone, Default)]
pub struct PathBuffer {
    points: Vec<PathPoint>,
    equality: PointEquality,
}

impl PathBuffer {
    /// Create an empty buffer comparing points under `equality`.
    pub fn new(equality: PointEquality) -> Self {
        Self {
            points: Vec::new(),
            equality,
        }
    }

    /// Discard any content and start a new path at `start`.
    pub fn begin(&mut self, start: PointD) {
        self.points.clear();
        self.points.push(PathPoint::new(start, SegmentKind::Line));
    }

    /// Append a point. A point that is the same device point as the current
    /// last point is dropped, so a path never contains zero-length steps.
    ///
    /// Returns `true` if the point was stored. Appending to an empty buffer
    /// starts a path there.
    pub fn push(&mut self, point: PointD, kind: SegmentKind) -> bool {
        match self.points.last() {
            None => {
                self.begin(point);
                true
            }
            Some(last) if self.equality.same(last.point, point) => false,
            Some(_) => {
                self.points.push(PathPoint::new(point, kind));
                true
            }
        }
    }

    /// Append every point of `points` with the same tag.
    pub fn extend<I>(&mut self, points: I, kind: SegmentKind)
    where
        I: IntoIterator<Item = PointD>,
    {
        for p in points {
            self.push(p, kind);
        }
    }

    /// Number of stored points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<PointD> {
        self.points.first().map(|p| p.point)
    }

    pub fn last(&self) -> Option<PointD> {
        self.points.last().map(|p| p.point)
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn equality(&self) -> PointEquality {
        self.equality
    }

    /// Returns `true` if the path ends where it began.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() > 1 => self.equality.same(a.point, b.point),
            _ => false,
        }
    }

    /// Append the starting point unless the path is already closed.
    /// Has no effect on empty or single-point buffers.
    pub fn close(&mut self) {
        if self.points.len() > 1 && !self.is_closed() {
            let start = self.points[0].point;
            self.points.push(PathPoint::new(start, SegmentKind::Line));
        }
    }

    /// Drop all points (keeps allocated memory).
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Drain the buffer. A buffer with fewer than two points yields `None`
    /// and is simply emptied.
    pub fn finish(&mut self) -> Option<Path> {
        if self.points.len() < 2 {
            self.points.clear();
            return None;
        }
        let closed = self.is_closed();
        Some(Path {
            points: std::mem::take(&mut self.points),
            closed,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

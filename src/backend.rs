//! Backend interface.
//!
//! A backend is the per-format half of a plotter: it receives finished,
//! device-frame geometry and answers one capability question. No geometry
//! flows back into the core.

use crate::basics::PointD;
use crate::drawing_state::Attributes;
use crate::error::BackendError;
use crate::path_buffer::Path;

/// Native arc support a backend declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcCapability {
    /// Arcs are always tessellated.
    None,
    /// Native arcs only while the transform is uniform.
    UniformOnly,
    /// Native arcs only while the transform preserves the axes.
    AxisPreservingOnly,
    /// Native arcs under any transform.
    Any,
}

impl ArcCapability {
    /// Returns `true` if a native arc may be used under a transform with
    /// the given classification.
    pub fn permits(self, axes_preserved: bool, uniform: bool) -> bool {
        match self {
            ArcCapability::None => false,
            ArcCapability::UniformOnly => uniform,
            ArcCapability::AxisPreservingOnly => axes_preserved,
            ArcCapability::Any => true,
        }
    }
}

/// Shape of a native arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcShape {
    Circular,
    /// Quarter ellipse; `p0 − center` and `p1 − center` are conjugate
    /// semi-diameters.
    Elliptic,
}

/// A native arc in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeArc {
    pub shape: ArcShape,
    pub center: PointD,
    pub p0: PointD,
    pub p1: PointD,
    /// Sweep direction as seen in the device frame.
    pub counterclockwise: bool,
}

/// Output backend consumed by [`PlotterCore`](crate::plotter::PlotterCore).
pub trait BackendCapability {
    /// Native arc support under a transform with this classification.
    fn query_arc_capability(&self, axes_preserved: bool, uniform: bool) -> ArcCapability;

    /// Consume a finished path with at least two points.
    fn emit_path(&mut self, path: &Path, attributes: &Attributes) -> Result<(), BackendError>;

    /// Consume an isolated arc the backend draws itself.
    fn emit_native_arc(
        &mut self,
        arc: &NativeArc,
        attributes: &Attributes,
    ) -> Result<(), BackendError>;

    /// Consume a single point marker (a dot `device_line_width` across).
    fn emit_marker(&mut self, point: PointD, attributes: &Attributes) -> Result<(), BackendError>;
}

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Path {
        path: Path,
        attributes: Attributes,
    },
    NativeArc {
        arc: NativeArc,
        attributes: Attributes,
    },
    Marker {
        point: PointD,
        attributes: Attributes,
    },
}

/// Backend that stores every emission in order.
///
/// Serves as the shared base that format encoders embed: an encoder keeps
/// one of these by value, replays or inspects `emissions`, and overrides
/// only the calls whose behavior differs.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    capability: ArcCapability,
    pub emissions: Vec<Emission>,
}

impl RecordingBackend {
    pub fn new(capability: ArcCapability) -> Self {
        Self {
            capability,
            emissions: Vec::new(),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.emissions.iter().filter_map(|e| match e {
            Emission::Path { path, .. } => Some(path),
            _ => None,
        })
    }

    pub fn native_arcs(&self) -> impl Iterator<Item = &NativeArc> + '_ {
        self.emissions.iter().filter_map(|e| match e {
            Emission::NativeArc { arc, .. } => Some(arc),
            _ => None,
        })
    }

    pub fn markers(&self) -> impl Iterator<Item = PointD> + '_ {
        self.emissions.iter().filter_map(|e| match e {
            Emission::Marker { point, .. } => Some(*point),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.emissions.clear();
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(ArcCapability::None)
    }
}

impl BackendCapability for RecordingBackend {
    fn query_arc_capability(&self, _axes_preserved: bool, _uniform: bool) -> ArcCapability {
        self.capability
    }

    fn emit_path(&mut self, path: &Path, attributes: &Attributes) -> Result<(), BackendError> {
        self.emissions.push(Emission::Path {
            path: path.clone(),
            attributes: *attributes,
        });
        Ok(())
    }

    fn emit_native_arc(
        &mut self,
        arc: &NativeArc,
        attributes: &Attributes,
    ) -> Result<(), BackendError> {
        self.emissions.push(Emission::NativeArc {
            arc: *arc,
            attributes: *attributes,
        });
        Ok(())
    }

    fn emit_marker(&mut self, point: PointD, attributes: &Attributes) -> Result<(), BackendError> {
        self.emissions.push(Emission::Marker {
            point,
            attributes: *attributes,
        });
        Ok(())
    }
}

/// Wraps a backend and withholds native arcs, so every arc is tessellated
/// while all emissions still reach `inner`.
#[derive(Debug, Clone, Default)]
pub struct PolylineOnly<B> {
    pub inner: B,
}

impl<B: BackendCapability> PolylineOnly<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

impl<B: BackendCapability> BackendCapability for PolylineOnly<B> {
    fn query_arc_capability(&self, _axes_preserved: bool, _uniform: bool) -> ArcCapability {
        ArcCapability::None
    }

    fn emit_path(&mut self, path: &Path, attributes: &Attributes) -> Result<(), BackendError> {
        self.inner.emit_path(path, attributes)
    }

    fn emit_native_arc(
        &mut self,
        arc: &NativeArc,
        _attributes: &Attributes,
    ) -> Result<(), BackendError> {
        Err(BackendError::new(format!(
            "native arcs are not supported (arc centered at {:?})",
            arc.center
        )))
    }

    fn emit_marker(&mut self, point: PointD, attributes: &Attributes) -> Result<(), BackendError> {
        self.inner.emit_marker(point, attributes)
    }
}

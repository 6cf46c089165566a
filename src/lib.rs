//! # vecplot
//!
//! Device-independent core of a vector plotter. Clients draw in a user
//! coordinate space; the core maps geometry into the device frame,
//! accumulates paths, decides between native and tessellated arcs, and hands
//! finished geometry to a per-format backend.
//!
//! ## Architecture
//!
//! 1. **Transform** ([`trans_affine`]) maps user to device coordinates and
//!    classifies the map (uniform, axis-preserving, reflecting).
//! 2. **Drawing state** ([`drawing_state`]) holds the cursor, attributes
//!    and the path being built ([`path_buffer`]) for each saved frame.
//! 3. **Curves** are either drawn natively by the backend or flattened:
//!    arcs by chord bisection ([`tessellator`], [`chord_table`]), Bezier
//!    curves by adaptive subdivision ([`curves`]).
//! 4. **Backend** ([`backend`]) receives paths, native arcs and markers.
//!
//! [`plotter::PlotterCore`] drives all of the above.
//!
//! ```
//! use vecplot::{ArcCapability, PlotterConfig, PlotterCore, RecordingBackend};
//!
//! let mut backend = RecordingBackend::new(ArcCapability::None);
//! {
//!     let mut plotter = PlotterCore::new(&mut backend, PlotterConfig::default());
//!     plotter.open()?;
//!     plotter.box_(0.1, 0.1, 0.9, 0.9)?;
//!     plotter.close()?;
//! }
//! assert_eq!(backend.paths().count(), 1);
//! # Ok::<(), vecplot::PlotError>(())
//! ```

// Foundation
pub mod basics;
pub mod error;
pub mod trans_affine;

// Curve approximation
pub mod chord_table;
pub mod curves;
pub mod tessellator;

// Paths and state
pub mod drawing_state;
pub mod path_buffer;

// Engine
pub mod backend;
pub mod config;
pub mod plotter;

pub use backend::{
    ArcCapability, ArcShape, BackendCapability, Emission, NativeArc, PolylineOnly,
    RecordingBackend,
};
pub use basics::{PointD, PointEquality};
pub use config::PlotterConfig;
pub use drawing_state::{Attributes, CapMode, FillRule, JoinMode};
pub use error::{BackendError, PlotError, Result};
pub use path_buffer::{Path, PathPoint, SegmentKind};
pub use plotter::PlotterCore;
pub use trans_affine::TransAffine;

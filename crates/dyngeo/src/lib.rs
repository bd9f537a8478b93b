//! Constraint-update and intersection engine for dynamic geometry.
//!
//! Cross-refs live in doc comments:
//! each module header lists the modules it calls into and is called from.
//!
//! Layers (bottom-up)
//! - `cfg`: tolerances and fixed numeric constants.
//! - `coords`: dual user/screen coordinates and the viewport map.
//! - `numerics`: bracketed root finding, Newton fallbacks, quadrature.
//! - `locus`: lines, circles, conics, arcs, parametric curves.
//! - `intersect`: pairwise intersections with stable branch selection.
//! - `graph`: element arena, creation contract, topological update walk.
//!
//! API Policy
//! - The graph is single-threaded and synchronous; every walk runs to
//!   completion. Closures stored in the graph are `Send + Sync`, so a whole
//!   graph may be moved to another thread.
//! - Structural mistakes return `GraphError`; geometric non-existence is a
//!   `None` value and never an error.

pub mod api;
pub mod cfg;
pub mod coords;
pub mod error;
pub mod graph;
pub mod intersect;
pub mod locus;
pub mod numerics;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::GeomCfg;
pub use error::GraphError;
pub use nalgebra::{Matrix3 as Mat3, Vector2 as Vec2};

/// Common exports for building and driving constructions.
pub mod prelude {
    pub use crate::coords::{CoordSpace, Coords, Viewport};
    pub use crate::graph::{ElementClass, ElementKind, Evaluator, Graph, NodeId, PointFn};
    pub use crate::intersect::Branch;
    pub use crate::locus::{CurveFn, Locus};
    pub use crate::{GeomCfg, GraphError};
    pub use nalgebra::{Matrix3 as Mat3, Vector2 as Vec2};
}

//! Curated API surface for host applications and tools.
//!
//! Important
//! - Prefer these re-exports over reaching into module paths; module layout
//!   may change between versions while these names stay.

// Coordinates and configuration
pub use crate::cfg::{GeomCfg, DIFF_STEP, JITTER_SEED, SIMPSON_NODES};
pub use crate::coords::{normalize, CoordSpace, Coords, Viewport};
// Graph and creation contract
pub use crate::error::GraphError;
pub use crate::graph::{
    Diagnostics, ElementClass, ElementKind, Evaluator, Geometry, Graph, NodeId, NodeState, PointFn, Rule,
};
// Loci and intersections
pub use crate::intersect::{
    branch_count, candidates, meet, other_intersection, segment_crossing, Branch, BranchCount, Meet,
};
pub use crate::locus::{Circle, CircleArc, Conic, Curve, CurveFn, Line, Locus, LocusClass};
// Numerics
pub use crate::numerics::{arc_length, derivative, newton2, root, simpson, Root2Outcome, RootOutcome, Seed};

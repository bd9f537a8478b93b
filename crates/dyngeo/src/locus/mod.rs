//! Geometric primitives that intersections operate on.
//!
//! Purpose
//! - Normalized algebraic descriptions of every locus class: lines in
//!   homogeneous stdform, circles, conics as symmetric 3×3 matrices over
//!   `[w, x, y]`, circular arcs, and parametric curves.
//!
//! Conventions
//! - Line stdform `[c, a, b]` means `c + a·x + b·y = 0` with `a² + b² = 1`;
//!   its direction `(b, −a)` points from the first defining point to the
//!   second.
//! - Conic `M` means `pᵀ M p = 0` for `p = [1, x, y]`.
//! - Arcs run counter-clockwise from `start` through `sweep` radians.
//!
//! Code cross-refs: `intersect` (consumers), `conic::split_degenerate`.

pub mod conic;
mod types;

pub use conic::{adjugate, split_degenerate};
pub use types::{Circle, CircleArc, Conic, Curve, CurveFn, Line, Locus, LocusClass};

#[cfg(test)]
mod tests;

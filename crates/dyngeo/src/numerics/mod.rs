//! Scalar numerics used by intersections and curve sampling.
//!
//! - `root`: bracketed inverse-quadratic/bisection search, or a bracket hunt
//!   followed by Newton iteration when only a guess is known.
//! - `newton2`: two-variable Newton step for `F(s, t) = 0` (curve × curve).
//! - `derivative`, `simpson`, `arc_length`: difference quotient, composite
//!   Simpson quadrature, and the arc length that sizes curve scans.
//!
//! Every loop is capped by `GeomCfg::max_iter`; callers receive the best
//! estimate plus a `converged` flag and decide what non-convergence means.
//!
//! Code cross-refs: `intersect::curves`, `intersect::conics::conic_conic`.

mod solvers;

pub use solvers::{
    arc_length, derivative, newton2, root, simpson, Root2Outcome, RootOutcome, Seed,
};

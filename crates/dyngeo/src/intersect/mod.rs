//! Intersections between pairs of loci with deterministic branch selection.
//!
//! Purpose
//! - Dispatch on the class pair of two loci and return the root selected by a
//!   fixed `Branch`. The ordering of roots within each family is canonical, so
//!   a point created with a given index stays on the same geometric branch as
//!   its parents move.
//!
//! Families
//! - Algebraic pairs (lines, circles, conics, arcs) fill fixed slots; a slot
//!   without a real root is `None` but keeps its position.
//! - A line meets a circle or conic in slot 0 at the larger line parameter,
//!   whatever the sign of the conic matrix.
//! - Conic pairs fill slots counter-clockwise around the first conic's center
//!   from the positive x axis. Roots keep their slot while the count stays
//!   the same and none crosses that axis.
//! - Curve × locus roots are ordered by the curve parameter; curve × curve
//!   roots are grouped into clusters of equal first parameter.
//!
//! Bounds
//! - Segment/ray bounds clip only when `always_intersect` is off. Arc spans
//!   always clip. Clipping happens after branch selection, so hiding one root
//!   never renumbers another.
//!
//! Code cross-refs: `locus` (inputs), `numerics` (pencil root, curve scans),
//! `graph::update` (caller; counts non-convergence).

mod conics;
mod curves;
mod lines;

pub use lines::segment_crossing;

use nalgebra::Vector2;
use tracing::warn;

use crate::cfg::GeomCfg;
use crate::locus::{Circle, Locus, LocusClass};

/// Branch index of an intersection point, fixed at creation.
///
/// `i` selects the slot (or the `i`-th root / `t1` cluster for curves); `j`
/// is only read for curve × curve pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Branch {
    pub i: usize,
    pub j: usize,
}

impl Branch {
    pub const fn new(i: usize) -> Self {
        Self { i, j: 0 }
    }
}

/// Number of selectable branches for a class pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchCount {
    Fixed(usize),
    /// Curves: any index is accepted; missing roots are non-existent.
    Unbounded,
}

impl BranchCount {
    pub fn admits(&self, branch: Branch) -> bool {
        match *self {
            // the single line × line root ignores the index
            BranchCount::Fixed(1) => true,
            BranchCount::Fixed(n) => branch.i < n,
            BranchCount::Unbounded => true,
        }
    }
}

/// Selectable branches for the ordered class pair.
pub fn branch_count(a: LocusClass, b: LocusClass) -> BranchCount {
    use LocusClass::*;
    match (a, b) {
        (Curve, _) | (_, Curve) => BranchCount::Unbounded,
        (Line, Line) => BranchCount::Fixed(1),
        (Line, _) | (_, Line) => BranchCount::Fixed(2),
        (Circle | Arc, Circle | Arc) => BranchCount::Fixed(2),
        _ => BranchCount::Fixed(4),
    }
}

/// Result of a branch query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Meet {
    pub point: Option<Vector2<f64>>,
    /// False when an iterative solver hit its cap; `point` is then `None` or
    /// the best estimate that passed the residual check.
    pub converged: bool,
}

impl Meet {
    fn none(converged: bool) -> Self {
        Self {
            point: None,
            converged,
        }
    }
}

/// Roots of a pair in canonical order.
#[derive(Clone, Debug, PartialEq)]
enum Roots {
    Slots(Vec<Option<Vector2<f64>>>),
    Ordered(Vec<Vector2<f64>>),
    Clustered(Vec<Vec<Vector2<f64>>>),
}

impl Roots {
    fn select(&self, branch: Branch) -> Option<Vector2<f64>> {
        match self {
            Roots::Slots(s) if s.len() == 1 => s[0],
            Roots::Slots(s) => s.get(branch.i).copied().flatten(),
            Roots::Ordered(r) => r.get(branch.i).copied(),
            Roots::Clustered(c) => c.get(branch.i).and_then(|k| k.get(branch.j)).copied(),
        }
    }

    fn all(self) -> Vec<Vector2<f64>> {
        match self {
            Roots::Slots(s) => s.into_iter().flatten().collect(),
            Roots::Ordered(r) => r,
            Roots::Clustered(c) => c.into_iter().flatten().collect(),
        }
    }
}

struct Solved {
    roots: Roots,
    converged: bool,
}

fn exact(slots: Vec<Option<Vector2<f64>>>) -> Solved {
    Solved {
        roots: Roots::Slots(slots),
        converged: true,
    }
}

/// Supporting circle of circles and arcs.
fn circle_of(l: &Locus) -> Option<Circle> {
    match l {
        Locus::Circle(c) => Some(*c),
        Locus::Arc(a) => Some(a.circle),
        _ => None,
    }
}

fn matrix_of(l: &Locus) -> Option<nalgebra::Matrix3<f64>> {
    match l {
        Locus::Conic(c) => Some(c.m),
        _ => circle_of(l).map(|c| c.matrix()),
    }
}

fn solve(a: &Locus, b: &Locus, cfg: &GeomCfg) -> Solved {
    match (a, b) {
        (Locus::Line(l1), Locus::Line(l2)) => exact(vec![lines::line_line(l1, l2, cfg.eps)]),
        (Locus::Line(l), other) | (other, Locus::Line(l)) if !matches!(other, Locus::Curve(_)) => {
            let m = matrix_of(other).unwrap_or_else(nalgebra::Matrix3::zeros);
            exact(conics::line_conic(l, &m, cfg).to_vec())
        }
        (Locus::Curve(c1), Locus::Curve(c2)) => {
            let (clusters, converged) = curves::curve_curve(c1, c2, cfg);
            Solved {
                roots: Roots::Clustered(clusters),
                converged,
            }
        }
        (Locus::Curve(c), other) | (other, Locus::Curve(c)) => {
            let (roots, converged) = curves::curve_locus(c, other, cfg);
            Solved {
                roots: Roots::Ordered(roots),
                converged,
            }
        }
        _ => match (circle_of(a), circle_of(b)) {
            (Some(c1), Some(c2)) => exact(conics::circle_circle(&c1, &c2, cfg).to_vec()),
            _ => {
                let (ma, mb) = match (matrix_of(a), matrix_of(b)) {
                    (Some(ma), Some(mb)) => (ma, mb),
                    _ => return exact(Vec::new()),
                };
                let (slots, converged) = conics::conic_conic(&ma, &mb, cfg);
                Solved {
                    roots: Roots::Slots(slots.to_vec()),
                    converged,
                }
            }
        },
    }
}

/// Whether `p` is inside the bounds of both loci.
fn admitted(a: &Locus, b: &Locus, p: Vector2<f64>, always_intersect: bool, eps: f64) -> bool {
    let inside = |l: &Locus| match l {
        Locus::Line(_) if always_intersect => true,
        _ => l.admits(p, eps),
    };
    inside(a) && inside(b)
}

fn report(a: &Locus, b: &Locus, converged: bool) {
    if !converged {
        warn!(first = ?a.class(), second = ?b.class(), "intersection solver hit its iteration cap");
    }
}

/// Intersection of `a` and `b` on the given branch.
pub fn meet(a: &Locus, b: &Locus, branch: Branch, always_intersect: bool, cfg: &GeomCfg) -> Meet {
    let solved = solve(a, b, cfg);
    report(a, b, solved.converged);
    let point = solved
        .roots
        .select(branch)
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .filter(|&p| admitted(a, b, p, always_intersect, cfg.eps));
    Meet {
        point,
        converged: solved.converged,
    }
}

/// All real intersections of `a` and `b` inside their bounds, in canonical order.
pub fn candidates(a: &Locus, b: &Locus, always_intersect: bool, cfg: &GeomCfg) -> (Vec<Vector2<f64>>, bool) {
    let solved = solve(a, b, cfg);
    report(a, b, solved.converged);
    let points = solved
        .roots
        .all()
        .into_iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .filter(|&p| admitted(a, b, p, always_intersect, cfg.eps))
        .collect();
    (points, solved.converged)
}

/// The intersection of `a` and `b` that is not `reference`.
///
/// Picks the nearest candidate farther than `eps` from `reference`; when every
/// candidate coincides with it (tangency), the coincident one is returned.
pub fn other_intersection(
    a: &Locus,
    b: &Locus,
    reference: Vector2<f64>,
    always_intersect: bool,
    cfg: &GeomCfg,
) -> Meet {
    let (points, converged) = candidates(a, b, always_intersect, cfg);
    let dist = |p: Vector2<f64>| (p - reference).norm();
    let mut distinct: Option<Vector2<f64>> = None;
    let mut coincident: Option<Vector2<f64>> = None;
    for p in points {
        let slot = if dist(p) > cfg.eps { &mut distinct } else { &mut coincident };
        if slot.map_or(true, |q| dist(p) < dist(q)) {
            *slot = Some(p);
        }
    }
    match distinct.or(coincident) {
        Some(p) => Meet {
            point: Some(p),
            converged,
        },
        None => Meet::none(converged),
    }
}

#[cfg(test)]
mod tests;

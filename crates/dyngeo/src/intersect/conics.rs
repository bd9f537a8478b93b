use std::f64::consts::TAU;

use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};

use crate::cfg::GeomCfg;
use crate::locus::conic::{is_degenerate, pencil_cubic, split_degenerate};
use crate::locus::{Circle, Line};
use crate::numerics::{root, Seed};

/// Line × conic: roots of `A t² + B t + C` along `foot + t·dir`.
///
/// Slot 0 takes the root with the larger `t` (further along the direction
/// from the line's first point to its second), slot 1 the smaller one. The
/// order does not depend on the sign of `m`. A vanishing `A` leaves the single
/// root `−C / B` in slot 0.
pub(super) fn line_conic(line: &Line, m: &Matrix3<f64>, cfg: &GeomCfg) -> [Option<Vector2<f64>>; 2] {
    let foot = line.foot();
    let dir = line.direction();
    let f = Vector3::new(1.0, foot.x, foot.y);
    let d = Vector3::new(0.0, dir.x, dir.y);
    let md = m * d;
    let a = d.dot(&md);
    let b = 2.0 * f.dot(&md);
    let c = f.dot(&(m * f));
    let at = |t: f64| Some(foot + dir * t);

    let scale = m.amax();
    if !(scale > 0.0) {
        return [None, None];
    }
    let tol = cfg.root_tol();
    if a.abs() <= tol * scale {
        if b.abs() <= tol * scale {
            return [None, None];
        }
        return [at(-c / b), None];
    }

    let mut disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        let rel = disc / (b * b + (4.0 * a * c).abs()).max(f64::MIN_POSITIVE);
        if rel < -tol {
            return [None, None];
        }
        disc = 0.0;
    }
    let sq = a.signum() * disc.sqrt();
    [at((-b + sq) / (2.0 * a)), at((-b - sq) / (2.0 * a))]
}

/// Circle × circle via the radical line, measured against the first circle.
pub(super) fn circle_circle(c1: &Circle, c2: &Circle, cfg: &GeomCfg) -> [Option<Vector2<f64>>; 2] {
    let eps = cfg.eps;
    for (point, other) in [(c1, c2), (c2, c1)] {
        if point.radius <= eps {
            let on = other.contains(point.center, eps);
            let p = on.then_some(point.center);
            return [p, p];
        }
    }
    let (m1, m2) = (c1.matrix(), c2.matrix());
    let radical = Vector3::new(
        m1[(0, 0)] - m2[(0, 0)],
        2.0 * (m1[(0, 1)] - m2[(0, 1)]),
        2.0 * (m1[(0, 2)] - m2[(0, 2)]),
    );
    match Line::from_stdform(radical, eps) {
        Some(line) => line_conic(&line, &m1, cfg),
        // concentric
        None => [None, None],
    }
}

/// Center of a central conic (`None` for parabolas and line pairs with
/// parallel lines).
fn center(m: &Matrix3<f64>, eps: f64) -> Option<Vector2<f64>> {
    let q = Matrix2::new(m[(1, 1)], m[(1, 2)], m[(2, 1)], m[(2, 2)]);
    let scale = m.amax();
    if q.determinant().abs() <= eps * scale * scale {
        return None;
    }
    q.try_inverse().map(|inv| -(inv * Vector2::new(m[(1, 0)], m[(2, 0)])))
}

/// Real roots of a line pair `(g, h)` met with `conic`.
fn pair_with(lines: (Vector3<f64>, Vector3<f64>), conic: &Matrix3<f64>, cfg: &GeomCfg) -> Vec<Vector2<f64>> {
    let meet = |l: Vector3<f64>| {
        let n = l.norm();
        if !(n > 0.0) {
            return [None, None];
        }
        Line::from_stdform(l / n, cfg.eps).map_or([None, None], |line| line_conic(&line, conic, cfg))
    };
    let [g0, g1] = meet(lines.0);
    let [h0, h1] = meet(lines.1);
    [g0, g1, h0, h1]
        .into_iter()
        .flatten()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect()
}

/// Fills four slots in counter-clockwise order around `pivot`, starting from
/// the positive x direction. The order depends on the roots alone.
fn by_angle(mut roots: Vec<Vector2<f64>>, pivot: Vector2<f64>) -> [Option<Vector2<f64>>; 4] {
    let angle = |p: &Vector2<f64>| {
        let d = p - pivot;
        let a = d.y.atan2(d.x);
        if a < 0.0 {
            a + TAU
        } else {
            a
        }
    };
    roots.sort_by(|p, q| angle(p).total_cmp(&angle(q)));
    let mut slots = [None; 4];
    for (slot, p) in slots.iter_mut().zip(roots) {
        *slot = Some(p);
    }
    slots
}

/// Conic × conic by the pencil method.
///
/// Finds a real `λ` with `det(λA + B) = 0`, splits the degenerate member into
/// two lines and meets each with `A`. When either input is already degenerate
/// it is split directly. Roots are ordered by angle around the center of `A`
/// (of `B` when `A` has none, else the origin). The boolean reports solver
/// convergence.
pub(super) fn conic_conic(a: &Matrix3<f64>, b: &Matrix3<f64>, cfg: &GeomCfg) -> ([Option<Vector2<f64>>; 4], bool) {
    const NONE: [Option<Vector2<f64>>; 4] = [None; 4];
    let (sa, sb) = (a.amax(), b.amax());
    if !(sa > 0.0 && sb > 0.0) {
        return (NONE, true);
    }
    let (a, b) = (a / sa, b / sb);
    let eps = cfg.eps;
    let pivot = center(&a, eps).or_else(|| center(&b, eps)).unwrap_or_else(Vector2::zeros);

    if is_degenerate(&b, eps) {
        let roots = split_degenerate(&b, eps).map_or_else(Vec::new, |gh| pair_with(gh, &a, cfg));
        return (by_angle(roots, pivot), true);
    }
    if is_degenerate(&a, eps) {
        let roots = split_degenerate(&a, eps).map_or_else(Vec::new, |gh| pair_with(gh, &b, cfg));
        return (by_angle(roots, pivot), true);
    }

    let [c0, c1, c2, c3] = pencil_cubic(&a, &b);
    let bound = 1.0 + [c0, c1, c2].iter().map(|c| (c / c3).abs()).fold(0.0, f64::max);
    let cubic = |l: f64| ((c3 * l + c2) * l + c1) * l + c0;
    let lambda = root(cubic, Seed::Bracket(-bound, bound), cfg);
    if !lambda.converged {
        return (NONE, false);
    }
    let d = a * lambda.x + b;
    let roots = split_degenerate(&d, eps).map_or_else(Vec::new, |gh| pair_with(gh, &a, cfg));
    (by_angle(roots, pivot), true)
}

use nalgebra::Vector2;

use super::lines::segment_crossing;
use crate::cfg::GeomCfg;
use crate::locus::{Curve, Locus};
use crate::numerics::{newton2, root, Seed};

/// Evenly spaced parameters over the curve domain, sized by arc length.
fn samples(curve: &Curve, cfg: &GeomCfg) -> Vec<f64> {
    let n = cfg.samples_for_length(curve.length());
    let h = (curve.t_max - curve.t_min) / n as f64;
    (0..=n).map(|k| curve.t_min + k as f64 * h).collect()
}

/// Curve × implicit locus: sign changes of `locus(curve(t))` refined by `root`.
///
/// Roots are ordered by `t`; touching zeros without a sign change are only
/// found when they fall on a sample.
pub(super) fn curve_locus(curve: &Curve, locus: &Locus, cfg: &GeomCfg) -> (Vec<Vector2<f64>>, bool) {
    let objective = |t: f64| locus.implicit(curve.point(t)).unwrap_or(f64::NAN);
    let ts = samples(curve, cfg);
    let values: Vec<f64> = ts.iter().map(|&t| objective(t)).collect();

    let mut roots: Vec<f64> = Vec::new();
    let mut converged = true;
    for k in 0..ts.len() {
        let (t0, f0) = (ts[k], values[k]);
        if f0 == 0.0 {
            roots.push(t0);
            continue;
        }
        let Some((&t1, &f1)) = ts.get(k + 1).zip(values.get(k + 1)) else {
            break;
        };
        if f0 * f1 < 0.0 {
            let r = root(objective, Seed::Bracket(t0, t1), cfg);
            if r.fx.abs() < cfg.eps {
                roots.push(r.x);
            } else {
                converged = false;
            }
        }
    }

    let mut points: Vec<Vector2<f64>> = Vec::with_capacity(roots.len());
    for t in roots {
        let p = curve.point(t);
        if points.last().map_or(true, |q| (p - q).norm() > cfg.eps) {
            points.push(p);
        }
    }
    (points, converged)
}

/// Curve × curve: polyline crossings seed a two-variable Newton solve.
///
/// Roots are sorted by `(t1, t2)` and grouped into clusters of equal `t1`
/// (within `eps`), so a self-touching first curve keeps its crossings apart.
pub(super) fn curve_curve(c1: &Curve, c2: &Curve, cfg: &GeomCfg) -> (Vec<Vec<Vector2<f64>>>, bool) {
    let s1 = samples(c1, cfg);
    let s2 = samples(c2, cfg);
    let p1: Vec<Vector2<f64>> = s1.iter().map(|&t| c1.point(t)).collect();
    let p2: Vec<Vector2<f64>> = s2.iter().map(|&t| c2.point(t)).collect();
    let in_domain = |c: &Curve, t: f64| t >= c.t_min - cfg.eps && t <= c.t_max + cfg.eps;
    let gap = |s: f64, t: f64| {
        let d = c1.point(s) - c2.point(t);
        (d.x, d.y)
    };

    let mut found: Vec<(f64, f64)> = Vec::new();
    let mut converged = true;
    for a in 0..p1.len().saturating_sub(1) {
        for b in 0..p2.len().saturating_sub(1) {
            let Some((u, v)) = segment_crossing(p1[a], p1[a + 1], p2[b], p2[b + 1]) else {
                continue;
            };
            let seed = (s1[a] + u * (s1[a + 1] - s1[a]), s2[b] + v * (s2[b + 1] - s2[b]));
            let r = newton2(gap, seed, cfg);
            if !r.converged {
                converged = false;
                continue;
            }
            if in_domain(c1, r.s) && in_domain(c2, r.t) {
                found.push((r.s, r.t));
            }
        }
    }

    found.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.total_cmp(&y.1)));
    found.dedup_by(|x, y| (x.0 - y.0).abs() <= cfg.eps && (x.1 - y.1).abs() <= cfg.eps);

    let mut clusters: Vec<(f64, Vec<Vector2<f64>>)> = Vec::new();
    for (s, _) in found {
        let p = c1.point(s);
        match clusters.last_mut() {
            Some((t1, members)) if (s - *t1).abs() <= cfg.eps => members.push(p),
            _ => clusters.push((s, vec![p])),
        }
    }
    (clusters.into_iter().map(|(_, m)| m).collect(), converged)
}

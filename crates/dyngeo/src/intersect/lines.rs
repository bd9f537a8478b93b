use nalgebra::Vector2;

use crate::locus::Line;

/// Meeting point of two lines; `None` when parallel (or identical).
pub(super) fn line_line(l1: &Line, l2: &Line, eps: f64) -> Option<Vector2<f64>> {
    let h = l1.stdform.cross(&l2.stdform);
    // |h[0]| is the sine of the angle between unit normals
    if !(h[0].abs() > eps) {
        return None;
    }
    Some(Vector2::new(h[1] / h[0], h[2] / h[0]))
}

/// Crossing of segments `p0p1` and `q0q1` as parameters `(s, t) ∈ [0, 1]²`.
///
/// Collinear overlaps report no crossing.
pub fn segment_crossing(
    p0: Vector2<f64>,
    p1: Vector2<f64>,
    q0: Vector2<f64>,
    q1: Vector2<f64>,
) -> Option<(f64, f64)> {
    let r = p1 - p0;
    let d = q1 - q0;
    let denom = r.perp(&d);
    if denom == 0.0 {
        return None;
    }
    let w = q0 - p0;
    let s = w.perp(&d) / denom;
    let t = w.perp(&r) / denom;
    ((0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)).then_some((s, t))
}

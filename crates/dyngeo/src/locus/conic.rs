//! Matrix helpers for conics: adjugate, pencil determinant, degenerate split.

use nalgebra::{Matrix3, Vector3};

/// Classical adjugate (transpose of the cofactor matrix).
pub fn adjugate(m: &Matrix3<f64>) -> Matrix3<f64> {
    let c = |r0: usize, r1: usize, c0: usize, c1: usize| m[(r0, c0)] * m[(r1, c1)] - m[(r0, c1)] * m[(r1, c0)];
    Matrix3::new(
        c(1, 2, 1, 2),
        -c(0, 2, 1, 2),
        c(0, 1, 1, 2),
        -c(1, 2, 0, 2),
        c(0, 2, 0, 2),
        -c(0, 1, 0, 2),
        c(1, 2, 0, 1),
        -c(0, 2, 0, 1),
        c(0, 1, 0, 1),
    )
}

/// Coefficients `[c0, c1, c2, c3]` of `det(λA + B) = c3 λ³ + c2 λ² + c1 λ + c0`.
///
/// `c0` and `c3` are the determinants of `B` and `A`; the middle terms come
/// from evaluating the determinant at `λ = ±1`.
pub fn pencil_cubic(a: &Matrix3<f64>, b: &Matrix3<f64>) -> [f64; 4] {
    let c0 = b.determinant();
    let c3 = a.determinant();
    let fp = (a + b).determinant();
    let fm = (b - a).determinant();
    let c2 = 0.5 * (fp + fm) - c0;
    let c1 = 0.5 * (fp - fm) - c3;
    [c0, c1, c2, c3]
}

/// Whether `m` is singular relative to its own scale.
pub fn is_degenerate(m: &Matrix3<f64>, eps: f64) -> bool {
    let scale = m.amax();
    scale == 0.0 || (m / scale).determinant().abs() <= eps * eps
}

/// Splits a degenerate conic into two homogeneous lines `g`, `h` with
/// `D ∝ g hᵀ + h gᵀ`.
///
/// A rank-one matrix is a double line and returns the same line twice.
/// Returns `None` for the zero matrix and for line pairs that are complex
/// conjugates (no real points beyond at most their meeting point).
pub fn split_degenerate(d: &Matrix3<f64>, eps: f64) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let scale = d.amax();
    if !(scale > 0.0) {
        return None;
    }
    let d = d / scale;
    let tol = eps * eps;
    let adj = adjugate(&d);

    let i = (0..3)
        .max_by(|&p, &q| adj[(p, p)].abs().total_cmp(&adj[(q, q)].abs()))
        .unwrap_or(0);
    let a_ii = adj[(i, i)];

    if a_ii.abs() <= tol {
        // rank one: D = ±l lᵀ
        let k = (0..3)
            .max_by(|&p, &q| d[(p, p)].abs().total_cmp(&d[(q, q)].abs()))
            .unwrap_or(0);
        let dkk = d[(k, k)];
        if dkk.abs() <= tol {
            return None;
        }
        let l: Vector3<f64> = d.row(k).transpose() / dkk.abs().sqrt();
        return Some((l, l));
    }
    if a_ii > tol {
        return None;
    }

    let beta = (-a_ii).sqrt();
    let p: Vector3<f64> = adj.column(i) / beta;
    let mp = Matrix3::new(0.0, p.z, -p.y, -p.z, 0.0, p.x, p.y, -p.x, 0.0);
    let c = d + mp;

    let (mut r, mut col, mut best) = (0, 0, -1.0);
    for rr in 0..3 {
        for cc in 0..3 {
            if c[(rr, cc)].abs() > best {
                best = c[(rr, cc)].abs();
                r = rr;
                col = cc;
            }
        }
    }
    let g: Vector3<f64> = c.row(r).transpose();
    let h: Vector3<f64> = c.column(col).into_owned();
    Some((g, h))
}

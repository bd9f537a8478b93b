//! Root finding, differentiation and quadrature.
use nalgebra::{Matrix2, Vector2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cfg::{GeomCfg, DIFF_STEP, JITTER_SEED, SIMPSON_NODES};

/// Starting information for `root`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Seed {
    /// A single estimate; a bracket is searched around it first.
    Guess(f64),
    /// Interval endpoints, expected (not required) to enclose a sign change.
    Bracket(f64, f64),
}

/// Best estimate of a scalar root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootOutcome {
    pub x: f64,
    pub fx: f64,
    pub iterations: usize,
    /// The bracket collapsed below tolerance, or the residual reached `eps²`.
    pub converged: bool,
}

/// Best estimate of a root of `F(s, t) = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Root2Outcome {
    pub s: f64,
    pub t: f64,
    pub residual: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Scalar root of `f`.
///
/// With a sign-changing bracket this runs the inverse-quadratic/bisection
/// iteration. From a guess it first probes a fixed set of offsets for a sign
/// change; failing that (or given a bracket without a sign change) it falls
/// back to Newton iteration from the better endpoint.
pub fn root<F: Fn(f64) -> f64>(f: F, seed: Seed, cfg: &GeomCfg) -> RootOutcome {
    let (a, fa, b, fb) = match seed {
        Seed::Bracket(a, b) => (a, f(a), b, f(b)),
        Seed::Guess(x0) => {
            let f0 = f(x0);
            match probe_bracket(&f, x0, f0) {
                Some((b, fb)) if b < x0 => (b, fb, x0, f0),
                Some((b, fb)) => (x0, f0, b, fb),
                None => return newton(&f, x0, cfg),
            }
        }
    };
    if fa * fb <= 0.0 {
        bracketed(&f, a, fa, b, fb, cfg)
    } else if fa.abs() <= fb.abs() {
        newton(&f, a, cfg)
    } else {
        newton(&f, b, cfg)
    }
}

/// Probe offsets around `x0` for a sign change of `f`.
fn probe_bracket<F: Fn(f64) -> f64>(f: &F, x0: f64, f0: f64) -> Option<(f64, f64)> {
    let base = if x0 == 0.0 { 1.0 } else { x0 };
    let probes = [
        0.9 * base,
        1.1 * base,
        base - 1.0,
        base + 1.0,
        0.5 * base,
        1.5 * base,
        -base,
        2.0 * base,
        -10.0 * base,
        10.0 * base,
    ];
    probes.into_iter().find_map(|b| {
        let fb = f(b);
        (f0 * fb <= 0.0).then_some((b, fb))
    })
}

/// Bracketed search with inverse quadratic interpolation and bisection fallback.
fn bracketed<F: Fn(f64) -> f64>(
    f: &F,
    mut a: f64,
    mut fa: f64,
    mut b: f64,
    mut fb: f64,
    cfg: &GeomCfg,
) -> RootOutcome {
    let tol = cfg.root_tol();
    if fa == 0.0 {
        return RootOutcome {
            x: a,
            fx: 0.0,
            iterations: 0,
            converged: true,
        };
    }
    let mut c = a;
    let mut fc = fa;
    for iter in 0..cfg.max_iter {
        let prev_step = b - a;
        // keep b as the best approximation
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol_act = 2.0 * f64::EPSILON * b.abs() + 0.5 * tol;
        let mut new_step = (c - b) * 0.5;
        if new_step.abs() <= tol_act || fb == 0.0 {
            return RootOutcome {
                x: b,
                fx: fb,
                iterations: iter,
                converged: true,
            };
        }

        if prev_step.abs() >= tol_act && fa.abs() > fb.abs() {
            let cb = c - b;
            let mut p;
            let mut q;
            if a == c {
                // secant
                let t1 = fb / fa;
                p = cb * t1;
                q = 1.0 - t1;
            } else {
                // inverse quadratic
                let qa = fa / fc;
                let t1 = fb / fc;
                let t2 = fb / fa;
                p = t2 * (cb * qa * (qa - t1) - (b - a) * (t1 - 1.0));
                q = (qa - 1.0) * (t1 - 1.0) * (t2 - 1.0);
            }
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if p < 0.75 * cb * q - (tol_act * q).abs() * 0.5 && p < (prev_step * q * 0.5).abs() {
                new_step = p / q;
            }
        }

        if new_step.abs() < tol_act {
            new_step = if new_step > 0.0 { tol_act } else { -tol_act };
        }

        a = b;
        fa = fb;
        b += new_step;
        fb = f(b);
        if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
            c = a;
            fc = fa;
        }
    }
    RootOutcome {
        x: b,
        fx: fb,
        iterations: cfg.max_iter,
        converged: fb.abs() <= tol,
    }
}

/// Newton iteration with numeric derivative; flat spots get a seeded jitter.
fn newton<F: Fn(f64) -> f64>(f: &F, x0: f64, cfg: &GeomCfg) -> RootOutcome {
    let tol = cfg.root_tol();
    let df = derivative(f);
    let mut rng = StdRng::seed_from_u64(JITTER_SEED);
    let mut x = x0;
    let mut fx = f(x);
    for iter in 0..cfg.max_iter {
        if fx.abs() <= tol {
            return RootOutcome {
                x,
                fx,
                iterations: iter,
                converged: true,
            };
        }
        if !fx.is_finite() {
            break;
        }
        let d = df(x);
        if d.abs() > tol {
            x -= fx / d;
        } else {
            x += rng.gen::<f64>() * 0.2 - 0.1;
        }
        fx = f(x);
    }
    RootOutcome {
        x,
        fx,
        iterations: cfg.max_iter,
        converged: fx.abs() <= tol,
    }
}

/// Symmetric difference quotient with a fixed step.
pub fn derivative<F: Fn(f64) -> f64>(f: F) -> impl Fn(f64) -> f64 {
    move |x| (f(x + DIFF_STEP) - f(x - DIFF_STEP)) / (2.0 * DIFF_STEP)
}

/// Composite Simpson rule over `[a, b]` with `SIMPSON_NODES` subintervals.
pub fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64) -> f64 {
    let n = SIMPSON_NODES;
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for k in 1..n {
        let w = if k % 2 == 1 { 4.0 } else { 2.0 };
        sum += w * f(a + k as f64 * h);
    }
    sum * h / 3.0
}

/// Arc length of `t ↦ (x(t), y(t))` on `[a, b]`.
pub fn arc_length<X, Y>(x: X, y: Y, a: f64, b: f64) -> f64
where
    X: Fn(f64) -> f64,
    Y: Fn(f64) -> f64,
{
    let dx = derivative(x);
    let dy = derivative(y);
    simpson(|t| dx(t).hypot(dy(t)), a, b)
}

/// Newton iteration for `F(s, t) = (0, 0)` with a central-difference Jacobian.
pub fn newton2<F>(f: F, seed: (f64, f64), cfg: &GeomCfg) -> Root2Outcome
where
    F: Fn(f64, f64) -> (f64, f64),
{
    let tol = cfg.root_tol();
    let h = DIFF_STEP;
    let (mut s, mut t) = seed;
    let (mut e, mut g) = f(s, t);
    for iter in 0..cfg.max_iter {
        let residual = e.hypot(g);
        if residual <= tol {
            return Root2Outcome {
                s,
                t,
                residual,
                iterations: iter,
                converged: true,
            };
        }
        if !residual.is_finite() {
            break;
        }
        let (es1, gs1) = f(s + h, t);
        let (es0, gs0) = f(s - h, t);
        let (et1, gt1) = f(s, t + h);
        let (et0, gt0) = f(s, t - h);
        let jac = Matrix2::new(
            (es1 - es0) / (2.0 * h),
            (et1 - et0) / (2.0 * h),
            (gs1 - gs0) / (2.0 * h),
            (gt1 - gt0) / (2.0 * h),
        );
        let Some(inv) = jac.try_inverse() else {
            break;
        };
        let step = inv * Vector2::new(e, g);
        s -= step.x;
        t -= step.y;
        (e, g) = f(s, t);
    }
    let residual = e.hypot(g);
    Root2Outcome {
        s,
        t,
        residual,
        iterations: cfg.max_iter,
        converged: residual <= tol,
    }
}

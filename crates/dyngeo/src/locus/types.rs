//! Locus types: lines, circles, conics, arcs, curves.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use nalgebra::{Matrix3, Matrix6, Vector2, Vector3};

use crate::numerics::arc_length;

/// Coordinate function of a parametric curve: `(t, parent points) ↦ value`.
///
/// The slice holds the current positions of the curve's parent points, in
/// creation order; it is the only graph state the function can read.
pub type CurveFn = Arc<dyn Fn(f64, &[Vector2<f64>]) -> f64 + Send + Sync>;

/// Algebraic class used by the intersection dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocusClass {
    Line,
    Circle,
    Conic,
    Arc,
    Curve,
}

/// Straight line, optionally bounded to a segment or ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    /// `[c, a, b]`, unit normal `(a, b)`.
    pub stdform: Vector3<f64>,
    pub p1: Vector2<f64>,
    pub p2: Vector2<f64>,
    /// Extends beyond `p1`.
    pub straight_first: bool,
    /// Extends beyond `p2`.
    pub straight_last: bool,
}

impl Line {
    /// Infinite line through two points; `None` if they coincide within `eps`.
    pub fn through(p1: Vector2<f64>, p2: Vector2<f64>, eps: f64) -> Option<Self> {
        let h1 = Vector3::new(1.0, p1.x, p1.y);
        let h2 = Vector3::new(1.0, p2.x, p2.y);
        let l = h1.cross(&h2);
        let n = l[1].hypot(l[2]);
        if !(n > eps) {
            return None;
        }
        Some(Self {
            stdform: l / n,
            p1,
            p2,
            straight_first: true,
            straight_last: true,
        })
    }

    pub fn segment(p1: Vector2<f64>, p2: Vector2<f64>, eps: f64) -> Option<Self> {
        Self::through(p1, p2, eps).map(|l| l.with_bounds(false, false))
    }

    /// Ray starting at `p1` through `p2`.
    pub fn ray(p1: Vector2<f64>, p2: Vector2<f64>, eps: f64) -> Option<Self> {
        Self::through(p1, p2, eps).map(|l| l.with_bounds(false, true))
    }

    /// Line from a homogeneous stdform; defining points are the foot of the
    /// normal from the origin and one unit step along the direction.
    pub fn from_stdform(l: Vector3<f64>, eps: f64) -> Option<Self> {
        let n = l[1].hypot(l[2]);
        if !(n > eps) {
            return None;
        }
        let stdform = l / n;
        let foot = Vector2::new(stdform[1], stdform[2]) * -stdform[0];
        let dir = Vector2::new(stdform[2], -stdform[1]);
        Some(Self {
            stdform,
            p1: foot,
            p2: foot + dir,
            straight_first: true,
            straight_last: true,
        })
    }

    #[inline]
    pub fn with_bounds(mut self, straight_first: bool, straight_last: bool) -> Self {
        self.straight_first = straight_first;
        self.straight_last = straight_last;
        self
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        !self.straight_first || !self.straight_last
    }

    #[inline]
    pub fn normal(&self) -> Vector2<f64> {
        Vector2::new(self.stdform[1], self.stdform[2])
    }

    /// Unit direction `(b, −a)`.
    #[inline]
    pub fn direction(&self) -> Vector2<f64> {
        Vector2::new(self.stdform[2], -self.stdform[1])
    }

    /// Point of the line closest to the origin.
    #[inline]
    pub fn foot(&self) -> Vector2<f64> {
        self.normal() * -self.stdform[0]
    }

    /// Signed distance of `p` from the line.
    #[inline]
    pub fn eval(&self, p: Vector2<f64>) -> f64 {
        self.stdform[0] + self.stdform[1] * p.x + self.stdform[2] * p.y
    }

    /// Position of `p` along `p1 → p2` (0 at `p1`, 1 at `p2`).
    pub fn param_of(&self, p: Vector2<f64>) -> f64 {
        let d = self.p2 - self.p1;
        (p - self.p1).dot(&d) / d.norm_squared()
    }

    /// Whether a segment parameter lies inside the bounds (with slack `eps`).
    #[inline]
    pub fn admits_param(&self, s: f64, eps: f64) -> bool {
        (self.straight_first || s >= -eps) && (self.straight_last || s <= 1.0 + eps)
    }

    /// Orthogonal projection onto the infinite line.
    #[inline]
    pub fn project(&self, p: Vector2<f64>) -> Vector2<f64> {
        p - self.normal() * self.eval(p)
    }
}

/// Circle by center and radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vector2<f64>,
    pub radius: f64,
}

impl Circle {
    #[inline]
    pub fn new(center: Vector2<f64>, radius: f64) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }

    /// Circumcircle; `None` for (nearly) collinear points.
    pub fn through_three(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>, eps: f64) -> Option<Self> {
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        if !(d.abs() > eps) {
            return None;
        }
        let (a2, b2, c2) = (a.norm_squared(), b.norm_squared(), c.norm_squared());
        let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
        let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
        let center = Vector2::new(ux, uy);
        Some(Self::new(center, (a - center).norm()))
    }

    /// `x² + y² − 2cx·x − 2cy·y + |c|² − r² = 0` as a symmetric matrix.
    pub fn matrix(&self) -> Matrix3<f64> {
        let (cx, cy) = (self.center.x, self.center.y);
        Matrix3::new(
            cx * cx + cy * cy - self.radius * self.radius,
            -cx,
            -cy,
            -cx,
            1.0,
            0.0,
            -cy,
            0.0,
            1.0,
        )
    }

    #[inline]
    pub fn contains(&self, p: Vector2<f64>, eps: f64) -> bool {
        ((p - self.center).norm() - self.radius).abs() < eps
    }

    /// Nearest point on the circle; `None` when `p` is the center.
    pub fn project(&self, p: Vector2<f64>, eps: f64) -> Option<Vector2<f64>> {
        let d = p - self.center;
        let n = d.norm();
        (n > eps).then(|| self.center + d * (self.radius / n))
    }

    /// Angle of `p` seen from the center, in `(−π, π]`.
    #[inline]
    pub fn angle_of(&self, p: Vector2<f64>) -> f64 {
        (p.y - self.center.y).atan2(p.x - self.center.x)
    }
}

/// Conic `pᵀ M p = 0`, `M` symmetric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Conic {
    pub m: Matrix3<f64>,
}

impl Conic {
    /// Symmetrizes `m`.
    pub fn new(m: Matrix3<f64>) -> Self {
        Self {
            m: (m + m.transpose()) * 0.5,
        }
    }

    /// `a x² + b xy + c y² + d x + e y + f = 0`.
    pub fn from_coefficients(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self::new(Matrix3::new(
            f,
            0.5 * d,
            0.5 * e,
            0.5 * d,
            a,
            0.5 * b,
            0.5 * e,
            0.5 * b,
            c,
        ))
    }

    /// Conic through five points via the null vector of the design matrix.
    ///
    /// Returns `None` unless the null space is one-dimensional (four collinear
    /// points or repeated points leave a pencil of solutions).
    pub fn through_five(points: &[Vector2<f64>; 5], eps: f64) -> Option<Self> {
        let mut design = Matrix6::<f64>::zeros();
        for (row, p) in points.iter().enumerate() {
            design[(row, 0)] = p.x * p.x;
            design[(row, 1)] = p.x * p.y;
            design[(row, 2)] = p.y * p.y;
            design[(row, 3)] = p.x;
            design[(row, 4)] = p.y;
            design[(row, 5)] = 1.0;
        }
        let svd = design.svd(false, true);
        let v_t = svd.v_t?;
        let mut order: Vec<usize> = (0..6).collect();
        order.sort_by(|&i, &j| {
            svd.singular_values[i]
                .partial_cmp(&svd.singular_values[j])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let scale = svd.singular_values.max().max(1.0);
        // The padding row makes one singular value zero; a second zero means
        // the five points do not pin down a unique conic.
        if svd.singular_values[order[1]] <= eps * eps * scale {
            return None;
        }
        let k = v_t.row(order[0]);
        // The null vector's sign is arbitrary; fix it so that the quadratic
        // part has non-negative trace (ties go to the largest coefficient).
        let trace = k[0] + k[2];
        let lead = if trace.abs() > eps {
            trace
        } else {
            k.iter().copied().fold(0.0, |m: f64, v| if v.abs() > m.abs() { v } else { m })
        };
        let s = if lead < 0.0 { -1.0 } else { 1.0 };
        Some(Self::from_coefficients(s * k[0], s * k[1], s * k[2], s * k[3], s * k[4], s * k[5]))
    }

    #[inline]
    pub fn eval(&self, p: Vector2<f64>) -> f64 {
        let h = Vector3::new(1.0, p.x, p.y);
        h.dot(&(self.m * h))
    }

    /// Whether the quadratic part is a multiple of `x² + y²`.
    pub fn is_circle(&self, eps: f64) -> bool {
        let q = self.m.fixed_view::<2, 2>(1, 1);
        q[(0, 0)].abs() > eps && (q[(0, 0)] - q[(1, 1)]).abs() <= eps * q[(0, 0)].abs() && q[(0, 1)].abs() <= eps * q[(0, 0)].abs()
    }

    /// `p` satisfies the equation up to `eps`, scaled by the matrix norm.
    pub fn contains(&self, p: Vector2<f64>, eps: f64) -> bool {
        let scale = self.m.norm().max(f64::MIN_POSITIVE) * (1.0 + p.norm_squared());
        self.eval(p).abs() <= eps * scale
    }
}

impl From<Circle> for Conic {
    fn from(c: Circle) -> Self {
        Self { m: c.matrix() }
    }
}

/// Counter-clockwise arc of a circle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleArc {
    pub circle: Circle,
    /// Start angle (radians).
    pub start: f64,
    /// Angular extent in `(0, 2π]`.
    pub sweep: f64,
}

impl CircleArc {
    /// Arc around `center`, radius `|start − center|`, from the direction of
    /// `start` to the direction of `end`.
    pub fn from_points(center: Vector2<f64>, start: Vector2<f64>, end: Vector2<f64>, eps: f64) -> Option<Self> {
        let radius = (start - center).norm();
        if !(radius > eps) || !((end - center).norm() > eps) {
            return None;
        }
        let circle = Circle::new(center, radius);
        let a0 = circle.angle_of(start);
        let a1 = circle.angle_of(end);
        let mut sweep = (a1 - a0).rem_euclid(TAU);
        if sweep <= eps / radius {
            sweep = TAU;
        }
        Some(Self {
            circle,
            start: a0,
            sweep,
        })
    }

    /// Whether the direction `theta` falls inside the span (angular slack `eps / r`).
    pub fn contains_angle(&self, theta: f64, eps: f64) -> bool {
        let slack = eps / self.circle.radius.max(eps);
        let d = (theta - self.start).rem_euclid(TAU);
        d <= self.sweep + slack || d >= TAU - slack
    }

    /// Point on the supporting circle and inside the span.
    pub fn admits(&self, p: Vector2<f64>, eps: f64) -> bool {
        self.contains_angle(self.circle.angle_of(p), eps)
    }

    pub fn start_point(&self) -> Vector2<f64> {
        self.circle.center + Vector2::new(self.start.cos(), self.start.sin()) * self.circle.radius
    }

    pub fn end_point(&self) -> Vector2<f64> {
        let a = self.start + self.sweep;
        self.circle.center + Vector2::new(a.cos(), a.sin()) * self.circle.radius
    }
}

/// Parametric curve `t ↦ (x(t), y(t))` on `[t_min, t_max]`.
#[derive(Clone)]
pub struct Curve {
    x_fn: CurveFn,
    y_fn: CurveFn,
    params: Vec<Vector2<f64>>,
    pub t_min: f64,
    pub t_max: f64,
}

impl Curve {
    pub fn new(x_fn: CurveFn, y_fn: CurveFn, t_min: f64, t_max: f64, params: Vec<Vector2<f64>>) -> Self {
        let (t_min, t_max) = if t_min <= t_max { (t_min, t_max) } else { (t_max, t_min) };
        Self {
            x_fn,
            y_fn,
            params,
            t_min,
            t_max,
        }
    }

    #[inline]
    pub fn x(&self, t: f64) -> f64 {
        (self.x_fn)(t, &self.params)
    }

    #[inline]
    pub fn y(&self, t: f64) -> f64 {
        (self.y_fn)(t, &self.params)
    }

    #[inline]
    pub fn point(&self, t: f64) -> Vector2<f64> {
        Vector2::new(self.x(t), self.y(t))
    }

    /// Parent positions the coordinate functions were evaluated against.
    pub fn params(&self) -> &[Vector2<f64>] {
        &self.params
    }

    /// Arc length over the whole domain.
    pub fn length(&self) -> f64 {
        arc_length(|t| self.x(t), |t| self.y(t), self.t_min, self.t_max)
    }
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.x_fn, &other.x_fn)
            && Arc::ptr_eq(&self.y_fn, &other.y_fn)
            && self.params == other.params
            && self.t_min == other.t_min
            && self.t_max == other.t_max
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curve")
            .field("t_min", &self.t_min)
            .field("t_max", &self.t_max)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Any locus an intersection can be taken with.
#[derive(Clone, Debug, PartialEq)]
pub enum Locus {
    Line(Line),
    Circle(Circle),
    Conic(Conic),
    Arc(CircleArc),
    Curve(Curve),
}

impl Locus {
    pub fn class(&self) -> LocusClass {
        match self {
            Locus::Line(_) => LocusClass::Line,
            Locus::Circle(_) => LocusClass::Circle,
            Locus::Conic(_) => LocusClass::Conic,
            Locus::Arc(_) => LocusClass::Arc,
            Locus::Curve(_) => LocusClass::Curve,
        }
    }

    /// Implicit equation value at `p`, where one exists (not for curves).
    pub fn implicit(&self, p: Vector2<f64>) -> Option<f64> {
        match self {
            Locus::Line(l) => Some(l.eval(p)),
            Locus::Circle(c) => Some((p - c.center).norm_squared() - c.radius * c.radius),
            Locus::Arc(a) => Some((p - a.circle.center).norm_squared() - a.circle.radius * a.circle.radius),
            Locus::Conic(c) => Some(c.eval(p)),
            Locus::Curve(_) => None,
        }
    }

    /// Whether a point already known to satisfy the implicit equation is inside
    /// the locus bounds (segment/ray parameter, arc span).
    pub fn admits(&self, p: Vector2<f64>, eps: f64) -> bool {
        match self {
            Locus::Line(l) => !l.is_bounded() || l.admits_param(l.param_of(p), eps),
            Locus::Arc(a) => a.admits(p, eps),
            _ => true,
        }
    }
}

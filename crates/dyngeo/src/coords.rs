//! Dual user/screen coordinates.
//!
//! Purpose
//! - `Coords` holds one position both as homogeneous user coordinates
//!   `[w, x, y]` and as homogeneous screen coordinates `[w, sx, sy]`.
//! - `Viewport` is the affine user→screen map: origin in device pixels,
//!   pixels per user unit on each axis, and a flipped vertical axis.
//!
//! Conventions
//! - `w = 1` marks a finite point, `w = 0` an ideal point (a direction).
//!   `from_user` normalizes with the caller's epsilon; below it the point
//!   stays ideal instead of dividing by a tiny `w`.
//! - Stored screen coordinates are sub-pixel; rounding is a view
//!   (`to_screen(true)`) used by redraw paths that need integer pixels.
//! - Values are `Copy` and replaced wholesale on every recomputation.

use nalgebra::{Vector2, Vector3};

/// Affine user↔screen mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Screen position of the user origin (pixels).
    pub origin_x: f64,
    pub origin_y: f64,
    /// Pixels per user unit.
    pub unit_x: f64,
    pub unit_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin_x: 250.0,
            origin_y: 250.0,
            unit_x: 50.0,
            unit_y: 50.0,
        }
    }
}

impl Viewport {
    #[inline]
    pub fn new(origin_x: f64, origin_y: f64, unit_x: f64, unit_y: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            unit_x,
            unit_y,
        }
    }

    /// Finite origin and finite, non-zero units.
    pub fn is_valid(&self) -> bool {
        [self.origin_x, self.origin_y, self.unit_x, self.unit_y]
            .iter()
            .all(|v| v.is_finite())
            && self.unit_x != 0.0
            && self.unit_y != 0.0
    }

    /// Homogeneous user → screen.
    #[inline]
    pub fn user_to_screen(&self, u: Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            u[0],
            u[0] * self.origin_x + u[1] * self.unit_x,
            u[0] * self.origin_y - u[2] * self.unit_y,
        )
    }

    /// Screen → finite user point.
    #[inline]
    pub fn screen_to_user(&self, sx: f64, sy: f64) -> Vector3<f64> {
        Vector3::new(
            1.0,
            (sx - self.origin_x) / self.unit_x,
            (self.origin_y - sy) / self.unit_y,
        )
    }
}

/// Which representation a distance or tolerance refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordSpace {
    User,
    Screen,
}

/// One position in both coordinate systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coords {
    user: Vector3<f64>,
    screen: Vector3<f64>,
}

impl Coords {
    /// Homogeneous user coordinates; normalized with `eps`.
    pub fn from_user(w: f64, x: f64, y: f64, vp: &Viewport, eps: f64) -> Self {
        let user = normalize(Vector3::new(w, x, y), eps);
        Self {
            user,
            screen: vp.user_to_screen(user),
        }
    }

    /// Finite user point `(x, y)`.
    #[inline]
    pub fn from_xy(x: f64, y: f64, vp: &Viewport) -> Self {
        let user = Vector3::new(1.0, x, y);
        Self {
            user,
            screen: vp.user_to_screen(user),
        }
    }

    #[inline]
    pub fn from_point(p: Vector2<f64>, vp: &Viewport) -> Self {
        Self::from_xy(p.x, p.y, vp)
    }

    /// Screen position (pixels); user coordinates are derived.
    pub fn from_screen(sx: f64, sy: f64, vp: &Viewport) -> Self {
        Self {
            user: vp.screen_to_user(sx, sy),
            screen: Vector3::new(1.0, sx, sy),
        }
    }

    /// Renderer-facing sentinel for a point that does not exist: `[0, NaN, NaN]`.
    pub fn non_existent() -> Self {
        let v = Vector3::new(0.0, f64::NAN, f64::NAN);
        Self { user: v, screen: v }
    }

    /// Same user position under another viewport.
    #[inline]
    pub fn reproject(&self, vp: &Viewport) -> Self {
        Self {
            user: self.user,
            screen: vp.user_to_screen(self.user),
        }
    }

    #[inline]
    pub fn user(&self) -> Vector3<f64> {
        self.user
    }

    /// Homogeneous screen coordinates, optionally rounded to device pixels.
    pub fn to_screen(&self, round: bool) -> Vector3<f64> {
        if round {
            self.screen.map(f64::round)
        } else {
            self.screen
        }
    }

    /// User coordinates recomputed from the screen representation.
    pub fn to_user(&self, vp: &Viewport) -> Vector3<f64> {
        if self.is_ideal() {
            return self.user;
        }
        vp.screen_to_user(self.screen[1], self.screen[2])
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.user[1]
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.user[2]
    }

    #[inline]
    pub fn is_ideal(&self) -> bool {
        self.user[0] == 0.0
    }

    /// Affine part of a finite point.
    #[inline]
    pub fn xy(&self) -> Vector2<f64> {
        Vector2::new(self.user[1], self.user[2])
    }

    /// Euclidean distance in the requested space; `+∞` if either point is ideal.
    pub fn distance(&self, other: &Coords, space: CoordSpace) -> f64 {
        if self.is_ideal() || other.is_ideal() {
            return f64::INFINITY;
        }
        let (a, b) = match space {
            CoordSpace::User => (self.user, other.user),
            CoordSpace::Screen => (self.screen, other.screen),
        };
        ((a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
    }
}

/// Divide by `w` when `|w| > eps`; otherwise mark the point ideal.
pub fn normalize(u: Vector3<f64>, eps: f64) -> Vector3<f64> {
    if u[0].abs() > eps {
        Vector3::new(1.0, u[1] / u[0], u[2] / u[0])
    } else {
        Vector3::new(0.0, u[1], u[2])
    }
}

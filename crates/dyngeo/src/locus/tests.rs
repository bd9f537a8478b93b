use super::*;
use nalgebra::{matrix, vector, Matrix3, Vector2, Vector3};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::sync::Arc;

const EPS: f64 = 1e-4;

fn parallel(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    a.cross(b).norm() <= 1e-9 * a.norm() * b.norm()
}

#[test]
fn line_stdform_is_normalized_and_oriented() {
    let l = Line::through(vector![1.0, 1.0], vector![4.0, 5.0], EPS).unwrap();
    assert!((l.stdform[1].hypot(l.stdform[2]) - 1.0).abs() < 1e-12);
    let d = l.direction();
    assert!((d - vector![0.6, 0.8]).norm() < 1e-12);
    assert!(l.eval(vector![1.0, 1.0]).abs() < 1e-12);
    assert!(l.eval(vector![4.0, 5.0]).abs() < 1e-12);
    // foot is on the line and orthogonal to the direction
    let f = l.foot();
    assert!(l.eval(f).abs() < 1e-12);
    assert!(f.dot(&d).abs() < 1e-12);
}

#[test]
fn line_through_coincident_points_is_none() {
    let p = vector![2.0, -3.0];
    assert!(Line::through(p, p, EPS).is_none());
    assert!(Line::through(p, p + vector![1e-6, 0.0], EPS).is_none());
}

#[test]
fn line_from_stdform_roundtrips_geometry() {
    let l = Line::from_stdform(Vector3::new(-6.0, 0.0, 3.0), EPS).unwrap(); // y = 2
    assert!((l.foot() - vector![0.0, 2.0]).norm() < 1e-12);
    assert!(l.eval(l.p2).abs() < 1e-12);
    assert!(Line::from_stdform(Vector3::new(1.0, 0.0, 0.0), EPS).is_none());
}

#[test]
fn projection_and_bounds() {
    let seg = Line::segment(vector![0.0, 0.0], vector![2.0, 0.0], EPS).unwrap();
    assert!(seg.is_bounded());
    assert!((seg.project(vector![1.5, 3.0]) - vector![1.5, 0.0]).norm() < 1e-12);
    assert!((seg.param_of(vector![1.0, 7.0]) - 0.5).abs() < 1e-12);
    assert!(seg.admits_param(1.0, EPS));
    assert!(!seg.admits_param(1.01, EPS));
    assert!(!seg.admits_param(-0.01, EPS));

    let ray = Line::ray(vector![0.0, 0.0], vector![2.0, 0.0], EPS).unwrap();
    assert!(ray.admits_param(50.0, EPS));
    assert!(!ray.admits_param(-0.5, EPS));

    let locus = Locus::Line(seg);
    assert!(locus.admits(vector![1.0, 0.0], EPS));
    assert!(!locus.admits(vector![3.0, 0.0], EPS));
}

#[test]
fn circle_matrix_vanishes_on_circle() {
    let c = Circle::new(vector![1.0, -2.0], 3.0);
    let conic = Conic::from(c);
    for k in 0..8 {
        let a = k as f64 * TAU / 8.0;
        let p = c.center + vector![a.cos(), a.sin()] * 3.0;
        assert!(conic.eval(p).abs() < 1e-9);
        assert!(c.contains(p, EPS));
    }
    assert!(conic.is_circle(EPS));
    assert!(conic.eval(c.center) < 0.0);
}

#[test]
fn circumcircle_of_right_triangle() {
    let c = Circle::through_three(vector![0.0, 0.0], vector![4.0, 0.0], vector![0.0, 3.0], EPS).unwrap();
    assert!((c.center - vector![2.0, 1.5]).norm() < 1e-12);
    assert!((c.radius - 2.5).abs() < 1e-12);
    assert!(Circle::through_three(vector![0.0, 0.0], vector![1.0, 1.0], vector![2.0, 2.0], EPS).is_none());
}

#[test]
fn circle_projection_handles_center() {
    let c = Circle::new(vector![0.0, 0.0], 2.0);
    let p = c.project(vector![3.0, 4.0], EPS).unwrap();
    assert!((p - vector![1.2, 1.6]).norm() < 1e-12);
    assert!(c.project(vector![0.0, 0.0], EPS).is_none());
}

#[test]
fn conic_through_five_points_of_an_ellipse() {
    let s = 2f64.sqrt();
    let pts = [
        vector![2.0, 0.0],
        vector![-2.0, 0.0],
        vector![0.0, 1.0],
        vector![0.0, -1.0],
        vector![s, s / 2.0],
    ];
    let c = Conic::through_five(&pts, EPS).unwrap();
    assert!(c.contains(vector![-s, -s / 2.0], EPS));
    assert!(!c.contains(vector![1.0, 1.0], EPS));
    assert!(!c.is_circle(EPS));
    // sign fixed: positive quadratic part, negative inside
    assert!(c.m[(1, 1)] > 0.0 && c.m[(2, 2)] > 0.0);
    assert!(c.eval(Vector2::zeros()) < 0.0);
}

#[test]
fn conic_through_four_collinear_points_is_ambiguous() {
    let pts = [
        vector![0.0, 0.0],
        vector![1.0, 0.0],
        vector![2.0, 0.0],
        vector![3.0, 0.0],
        vector![0.0, 1.0],
    ];
    assert!(Conic::through_five(&pts, EPS).is_none());
}

#[test]
fn conic_new_symmetrizes() {
    let c = Conic::new(matrix![1.0, 2.0, 0.0; 0.0, 1.0, 4.0; 0.0, 0.0, 1.0]);
    assert_eq!(c.m, c.m.transpose());
    assert!((c.m[(0, 1)] - 1.0).abs() < 1e-15);
}

#[test]
fn adjugate_times_matrix_is_determinant() {
    let m = matrix![2.0, -1.0, 0.5; 3.0, 4.0, 1.0; -2.0, 0.0, 5.0];
    let prod = m * adjugate(&m);
    let expected = Matrix3::identity() * m.determinant();
    assert!((prod - expected).norm() < 1e-9);
}

#[test]
fn pencil_cubic_matches_direct_determinant() {
    let a = Circle::new(vector![0.0, 0.0], 2.0).matrix();
    let b = Conic::from_coefficients(1.0, 0.3, 2.0, -1.0, 0.5, -3.0).m;
    let [c0, c1, c2, c3] = conic::pencil_cubic(&a, &b);
    for &lambda in &[-2.0f64, -0.5, 0.25, 1.7] {
        let direct = (a * lambda + b).determinant();
        let poly = ((c3 * lambda + c2) * lambda + c1) * lambda + c0;
        assert!((direct - poly).abs() < 1e-9, "λ={lambda}");
    }
}

#[test]
fn split_line_pair_recovers_both_lines() {
    let g = Vector3::new(-1.0, 1.0, 0.0); // x = 1
    let h = Vector3::new(-2.0, 0.0, 1.0); // y = 2
    let d = g * h.transpose() + h * g.transpose();
    assert!(conic::is_degenerate(&d, EPS));
    let (l1, l2) = split_degenerate(&(d * -3.0), EPS).unwrap();
    assert!((parallel(&l1, &g) && parallel(&l2, &h)) || (parallel(&l1, &h) && parallel(&l2, &g)));
}

#[test]
fn split_double_line() {
    let l = Vector3::new(-1.0, 0.6, 0.8);
    let d = l * l.transpose();
    let (a, b) = split_degenerate(&d, EPS).unwrap();
    assert!(parallel(&a, &l));
    assert!(parallel(&b, &l));
}

#[test]
fn split_complex_pair_has_no_real_lines() {
    // x² + y² = 0
    let d = Matrix3::from_diagonal(&Vector3::new(0.0, 1.0, 1.0));
    assert!(split_degenerate(&d, EPS).is_none());
    assert!(split_degenerate(&Matrix3::zeros(), EPS).is_none());
}

#[test]
fn arc_span_is_counter_clockwise() {
    let arc = CircleArc::from_points(vector![0.0, 0.0], vector![1.0, 0.0], vector![0.0, 5.0], EPS).unwrap();
    assert!((arc.circle.radius - 1.0).abs() < 1e-12);
    assert!((arc.sweep - FRAC_PI_2).abs() < 1e-12);
    assert!(arc.contains_angle(0.3, EPS));
    assert!(!arc.contains_angle(PI, EPS));
    assert!(!arc.contains_angle(-0.3, EPS));
    assert!((arc.end_point() - vector![0.0, 1.0]).norm() < 1e-12);

    // clockwise order of the same points gives the complementary span
    let rev = CircleArc::from_points(vector![0.0, 0.0], vector![0.0, 1.0], vector![5.0, 0.0], EPS).unwrap();
    assert!((rev.sweep - 1.5 * PI).abs() < 1e-12);
    assert!(rev.contains_angle(PI, EPS));
    assert!(!rev.contains_angle(0.3, EPS));
}

#[test]
fn arc_with_equal_directions_is_full_circle() {
    let arc = CircleArc::from_points(vector![0.0, 0.0], vector![2.0, 0.0], vector![3.0, 0.0], EPS).unwrap();
    assert!((arc.sweep - TAU).abs() < 1e-12);
    assert!(arc.contains_angle(2.0, EPS));
}

#[test]
fn curve_reads_parent_positions() {
    let x: CurveFn = Arc::new(|t, p: &[Vector2<f64>]| p[0].x + t.cos());
    let y: CurveFn = Arc::new(|t, p: &[Vector2<f64>]| p[0].y + t.sin());
    let c = Curve::new(x.clone(), y.clone(), TAU, 0.0, vec![vector![3.0, 1.0]]);
    assert_eq!((c.t_min, c.t_max), (0.0, TAU));
    assert!((c.point(0.0) - vector![4.0, 1.0]).norm() < 1e-12);
    assert!((c.length() - TAU).abs() < 1e-6);

    let same = Curve::new(x.clone(), y.clone(), 0.0, TAU, vec![vector![3.0, 1.0]]);
    let moved = Curve::new(x, y, 0.0, TAU, vec![vector![0.0, 0.0]]);
    assert_eq!(c, same);
    assert_ne!(c, moved);
    assert_eq!(Locus::Curve(c).class(), LocusClass::Curve);
}

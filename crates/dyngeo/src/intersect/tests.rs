use super::*;
use crate::locus::{Circle, CircleArc, Conic, Curve, CurveFn, Line};
use nalgebra::{vector, Vector2, Vector3};
use proptest::prelude::*;
use std::sync::Arc;

fn cfg() -> GeomCfg {
    GeomCfg::default()
}

fn line(p: [f64; 2], q: [f64; 2]) -> Locus {
    Locus::Line(Line::through(vector![p[0], p[1]], vector![q[0], q[1]], 1e-4).unwrap())
}

fn circle(cx: f64, cy: f64, r: f64) -> Locus {
    Locus::Circle(Circle::new(vector![cx, cy], r))
}

fn at(a: &Locus, b: &Locus, i: usize) -> Option<Vector2<f64>> {
    meet(a, b, Branch::new(i), false, &cfg()).point
}

fn close(p: Option<Vector2<f64>>, x: f64, y: f64) -> bool {
    p.map_or(false, |p| (p - vector![x, y]).norm() < 1e-6)
}

fn on_circle(p: Vector2<f64>, c: &Locus) -> bool {
    c.implicit(p).map_or(false, |v| v.abs() < 1e-6)
}

fn parabola() -> Curve {
    let x: CurveFn = Arc::new(|t, _: &[Vector2<f64>]| t);
    let y: CurveFn = Arc::new(|t, _: &[Vector2<f64>]| t * t - 1.0);
    Curve::new(x, y, -2.0, 2.0, Vec::new())
}

#[test]
fn parallel_lines_never_meet() {
    let a = line([-2.0, -1.0], [2.0, -1.0]);
    let b = line([1.0, 2.0], [-1.0, 2.0]);
    for i in 0..4 {
        let m = meet(&a, &b, Branch::new(i), true, &cfg());
        assert!(m.point.is_none());
        assert!(m.converged);
    }
}

#[test]
fn crossing_lines_meet_once_for_any_index() {
    let a = line([0.0, 0.0], [2.0, 2.0]);
    let b = line([0.0, 2.0], [2.0, 0.0]);
    assert!(close(at(&a, &b, 0), 1.0, 1.0));
    assert!(close(at(&a, &b, 3), 1.0, 1.0));
    assert_eq!(branch_count(LocusClass::Line, LocusClass::Line), BranchCount::Fixed(1));
}

#[test]
fn segments_clip_unless_always_intersect() {
    let a = Locus::Line(Line::segment(vector![0.0, 0.0], vector![1.0, 1.0], 1e-4).unwrap());
    let b = line([0.0, 4.0], [4.0, 0.0]);
    assert!(at(&a, &b, 0).is_none());
    let m = meet(&a, &b, Branch::new(0), true, &cfg());
    assert!(close(m.point, 2.0, 2.0));

    let ray = Locus::Line(Line::ray(vector![0.0, 0.0], vector![1.0, 1.0], 1e-4).unwrap());
    assert!(close(at(&ray, &b, 0), 2.0, 2.0));
    let backwards = Locus::Line(Line::ray(vector![0.0, 0.0], vector![-1.0, -1.0], 1e-4).unwrap());
    assert!(at(&backwards, &b, 0).is_none());
}

#[test]
fn line_circle_branches_follow_direction() {
    let l = line([-5.0, 0.0], [5.0, 0.0]);
    let c = circle(0.0, 0.0, 2.0);
    assert!(close(at(&l, &c, 0), 2.0, 0.0));
    assert!(close(at(&l, &c, 1), -2.0, 0.0));
    // argument order does not change the branch assignment
    assert!(close(at(&c, &l, 0), 2.0, 0.0));
    // reversing the line swaps the branches
    let r = line([5.0, 0.0], [-5.0, 0.0]);
    assert!(close(at(&r, &c, 0), -2.0, 0.0));
    assert!(close(at(&r, &c, 1), 2.0, 0.0));
    assert!(at(&l, &c, 2).is_none());
}

#[test]
fn tangent_line_gives_double_root() {
    let l = line([-5.0, 2.0], [5.0, 2.0]);
    let c = circle(0.0, 0.0, 2.0);
    assert!(close(at(&l, &c, 0), 0.0, 2.0));
    assert!(close(at(&l, &c, 1), 0.0, 2.0));
    let miss = line([-5.0, 2.1], [5.0, 2.1]);
    assert!(at(&miss, &c, 0).is_none());
}

#[test]
fn two_circles_meet_on_radical_line() {
    let a = circle(0.0, 0.0, 3.0);
    let b = circle(2.0, 2.0, 3.0);
    let p = at(&a, &b, 0).unwrap();
    let q = at(&a, &b, 1).unwrap();
    assert!((p - q).norm() > 1.0);
    for s in [p, q] {
        assert!(on_circle(s, &a) && on_circle(s, &b));
    }
    let mid = (p + q) * 0.5;
    assert!((mid.x + mid.y - 2.0).abs() < 1e-9);
}

#[test]
fn concentric_and_far_circles_do_not_meet() {
    let a = circle(0.0, 0.0, 3.0);
    assert!(at(&a, &circle(0.0, 0.0, 1.0), 0).is_none());
    assert!(at(&a, &circle(10.0, 0.0, 1.0), 0).is_none());
    assert!(at(&a, &circle(10.0, 0.0, 1.0), 1).is_none());
}

#[test]
fn zero_radius_circle_meets_at_its_center() {
    let a = circle(3.0, 0.0, 0.0);
    let b = circle(0.0, 0.0, 3.0);
    assert!(close(at(&a, &b, 0), 3.0, 0.0));
    assert!(close(at(&b, &a, 1), 3.0, 0.0));
    assert!(at(&circle(2.0, 0.0, 0.0), &b, 0).is_none());
}

#[test]
fn circle_branch_is_continuous_under_small_moves() {
    let a = circle(0.0, 0.0, 3.0);
    let mut prev = at(&a, &circle(2.0, 2.0, 3.0), 0).unwrap();
    for k in 1..=50 {
        let dx = k as f64 * 0.01;
        let p = at(&a, &circle(2.0 + dx, 2.0 - dx, 3.0), 0).unwrap();
        assert!((p - prev).norm() < 0.05, "jump at step {k}");
        prev = p;
    }
}

#[test]
fn ellipse_and_circle_meet_in_four_points() {
    let e = Locus::Conic(Conic::from_coefficients(0.25, 0.0, 1.0, 0.0, 0.0, -1.0));
    let c = circle(0.0, 0.0, 1.5);
    assert_eq!(branch_count(LocusClass::Conic, LocusClass::Circle), BranchCount::Fixed(4));
    let pts: Vec<Vector2<f64>> = (0..4).filter_map(|i| at(&e, &c, i)).collect();
    assert_eq!(pts.len(), 4);
    for p in &pts {
        assert!((p.x * p.x - 5.0 / 3.0).abs() < 1e-6, "{p:?}");
        assert!(on_circle(*p, &c));
    }
    for i in 0..4 {
        for j in i + 1..4 {
            assert!((pts[i] - pts[j]).norm() > 0.1);
        }
    }
}

#[test]
fn line_conic_slots_ignore_matrix_sign() {
    let m = Conic::from_coefficients(0.25, 0.0, 1.0, 0.0, 0.0, -1.0).m;
    let pos = Locus::Conic(Conic::new(m));
    let neg = Locus::Conic(Conic::new(-m));
    let axis = line([-5.0, 0.0], [5.0, 0.0]);
    for i in 0..2 {
        assert_eq!(at(&axis, &pos, i), at(&axis, &neg, i));
    }
    // slot 0 is further along the line's direction
    assert!(close(at(&axis, &neg, 0), 2.0, 0.0));
    assert!(close(at(&axis, &neg, 1), -2.0, 0.0));
    let back = line([5.0, 0.0], [-5.0, 0.0]);
    assert!(close(at(&back, &pos, 0), -2.0, 0.0));
}

#[test]
fn conic_circle_branches_are_continuous_under_small_moves() {
    let m = Conic::from_coefficients(0.25, 0.0, 1.0, 0.0, 0.0, -1.0).m;
    let e = Locus::Conic(Conic::new(m));
    let slots = |e: &Locus, dx: f64| -> Vec<Vector2<f64>> {
        (0..4).map(|i| at(e, &circle(dx, 0.0, 1.5), i).unwrap()).collect()
    };
    let flipped = slots(&Locus::Conic(Conic::new(-m)), 0.0);
    let mut prev = slots(&e, 0.0);
    for i in 0..4 {
        assert!((flipped[i] - prev[i]).norm() < 1e-6, "slot {i} depends on the matrix sign");
    }
    // counter-clockwise around the ellipse center, from the positive x axis
    assert!(prev[0].x > 0.0 && prev[0].y > 0.0);
    assert!(prev[1].x < 0.0 && prev[1].y > 0.0);
    assert!(prev[2].x < 0.0 && prev[2].y < 0.0);
    assert!(prev[3].x > 0.0 && prev[3].y < 0.0);
    for k in 1..=40 {
        let next = slots(&e, k as f64 * 0.005);
        for i in 0..4 {
            assert!((next[i] - prev[i]).norm() < 0.05, "slot {i} jumps at step {k}");
        }
        prev = next;
    }
}

#[test]
fn disjoint_conics_have_no_real_points() {
    let e = Locus::Conic(Conic::from_coefficients(0.25, 0.0, 1.0, 0.0, 0.0, -1.0));
    let far = Locus::Conic(Conic::from(Circle::new(vector![10.0, 0.0], 1.0)));
    for i in 0..4 {
        let m = meet(&e, &far, Branch::new(i), false, &cfg());
        assert!(m.point.is_none());
        assert!(m.converged);
    }
}

#[test]
fn degenerate_conic_is_split_directly() {
    // (x - 1)(y - 2) = 0 against the circle x² + y² = 9
    let g = Vector3::new(-1.0, 1.0, 0.0);
    let h = Vector3::new(-2.0, 0.0, 1.0);
    let pair = Locus::Conic(Conic::new(g * h.transpose() + h * g.transpose()));
    let c = Locus::Conic(Conic::from(Circle::new(Vector2::zeros(), 3.0)));
    let pts: Vec<Vector2<f64>> = (0..4).filter_map(|i| at(&c, &pair, i)).collect();
    assert_eq!(pts.len(), 4);
    for p in pts {
        assert!((p.norm() - 3.0).abs() < 1e-6);
        assert!((p.x - 1.0).abs() < 1e-6 || (p.y - 2.0).abs() < 1e-6);
    }
}

#[test]
fn arc_keeps_only_its_span() {
    let arc = Locus::Arc(CircleArc::from_points(Vector2::zeros(), vector![1.0, 0.0], vector![0.0, 1.0], 1e-4).unwrap());
    let diag = line([0.0, 0.0], [1.0, 1.0]);
    let h = 0.5f64.sqrt();
    assert!(close(at(&diag, &arc, 0), h, h));
    // the opposite root lies on the supporting circle but outside the span
    assert!(at(&diag, &arc, 1).is_none());
    // arcs clip even with always_intersect
    assert!(meet(&diag, &arc, Branch::new(1), true, &cfg()).point.is_none());
}

#[test]
fn other_intersection_skips_the_reference() {
    let a = circle(0.0, 0.0, 3.0);
    let b = circle(2.0, 2.0, 3.0);
    let p = at(&a, &b, 0).unwrap();
    let q = at(&a, &b, 1).unwrap();
    let other = other_intersection(&a, &b, p, false, &cfg());
    assert!((other.point.unwrap() - q).norm() < 1e-9);

    // tangency: the only candidate coincides with the reference
    let t1 = circle(0.0, 0.0, 1.0);
    let t2 = circle(2.0, 0.0, 1.0);
    let touch = other_intersection(&t1, &t2, vector![1.0, 0.0], false, &cfg());
    assert!(close(touch.point, 1.0, 0.0));

    let none = other_intersection(&t1, &circle(9.0, 0.0, 1.0), vector![1.0, 0.0], false, &cfg());
    assert!(none.point.is_none());
}

#[test]
fn curve_and_line_roots_are_ordered_by_parameter() {
    let c = Locus::Curve(parabola());
    let axis = line([-5.0, 0.0], [5.0, 0.0]);
    assert!(close(at(&c, &axis, 0), -1.0, 0.0));
    assert!(close(at(&axis, &c, 1), 1.0, 0.0));
    assert!(at(&c, &axis, 2).is_none());
    assert_eq!(branch_count(LocusClass::Curve, LocusClass::Line), BranchCount::Unbounded);
}

#[test]
fn curve_and_circle() {
    let c = Locus::Curve(parabola());
    let r2 = circle(0.0, 0.0, 2f64.sqrt());
    // t² + (t² − 1)² = 2 → t² = golden ratio
    let phi = (1.0 + 5f64.sqrt()) / 2.0;
    let t = phi.sqrt();
    assert!(close(at(&c, &r2, 0), -t, phi - 1.0));
    assert!(close(at(&c, &r2, 1), t, phi - 1.0));
    assert!(at(&c, &r2, 2).is_none());
}

#[test]
fn curve_and_curve_cross_once() {
    let x1: CurveFn = Arc::new(|t, _: &[Vector2<f64>]| t);
    let y1: CurveFn = Arc::new(|t, _: &[Vector2<f64>]| t);
    let x2: CurveFn = Arc::new(|t, p: &[Vector2<f64>]| p[0].x + t);
    let y2: CurveFn = Arc::new(|t, p: &[Vector2<f64>]| p[0].y - t);
    let a = Locus::Curve(Curve::new(x1, y1, -2.0, 2.0, Vec::new()));
    let b = Locus::Curve(Curve::new(x2, y2, -2.0, 2.0, vec![vector![0.0, 1.0]]));
    let m = meet(&a, &b, Branch { i: 0, j: 0 }, false, &cfg());
    assert!(m.converged);
    assert!(close(m.point, 0.5, 0.5));
    assert!(meet(&a, &b, Branch { i: 0, j: 1 }, false, &cfg()).point.is_none());
    assert!(meet(&a, &b, Branch { i: 1, j: 0 }, false, &cfg()).point.is_none());
}

#[test]
fn curve_pair_clusters_follow_first_parameter() {
    let x1: CurveFn = Arc::new(|t, _: &[Vector2<f64>]| t);
    let y1: CurveFn = Arc::new(|_t: f64, _: &[Vector2<f64>]| 0.0);
    // figure eight through the origin twice; meets the x axis at -2, 0, 0, 2
    let x2: CurveFn = Arc::new(|t: f64, _: &[Vector2<f64>]| 2.0 * t.sin());
    let y2: CurveFn = Arc::new(|t: f64, _: &[Vector2<f64>]| (2.0 * t).sin());
    let axis = Locus::Curve(Curve::new(x1, y1, -2.93, 3.0, Vec::new()));
    let eight = Locus::Curve(Curve::new(x2, y2, -1.0, 5.5, Vec::new()));
    let pick = |i: usize, j: usize| meet(&axis, &eight, Branch { i, j }, false, &cfg());

    let first = pick(0, 0);
    assert!(first.converged);
    assert!(close(first.point, -2.0, 0.0));
    assert!(pick(0, 1).point.is_none());
    // the self-crossing of the eight is one cluster holding two roots
    assert!(close(pick(1, 0).point, 0.0, 0.0));
    assert!(close(pick(1, 1).point, 0.0, 0.0));
    assert!(pick(1, 2).point.is_none());
    assert!(close(pick(2, 0).point, 2.0, 0.0));
    assert!(pick(3, 0).point.is_none());
    let (all, _) = candidates(&axis, &eight, false, &cfg());
    assert_eq!(all.len(), 4);
}

#[test]
fn segment_crossing_parameters() {
    let r = segment_crossing(vector![0.0, 0.0], vector![2.0, 0.0], vector![1.0, -1.0], vector![1.0, 3.0]).unwrap();
    assert!((r.0 - 0.5).abs() < 1e-12 && (r.1 - 0.25).abs() < 1e-12);
    assert!(segment_crossing(vector![0.0, 0.0], vector![1.0, 0.0], vector![2.0, -1.0], vector![2.0, 1.0]).is_none());
    assert!(segment_crossing(vector![0.0, 0.0], vector![1.0, 0.0], vector![0.0, 1.0], vector![1.0, 1.0]).is_none());
}

#[test]
fn branch_counts_per_pair() {
    use LocusClass::*;
    assert_eq!(branch_count(Line, Circle), BranchCount::Fixed(2));
    assert_eq!(branch_count(Arc, Line), BranchCount::Fixed(2));
    assert_eq!(branch_count(Circle, Arc), BranchCount::Fixed(2));
    assert_eq!(branch_count(Conic, Conic), BranchCount::Fixed(4));
    assert!(!BranchCount::Fixed(2).admits(Branch::new(2)));
    assert!(BranchCount::Fixed(1).admits(Branch::new(7)));
}

proptest! {
    #[test]
    fn circle_pair_roots_lie_on_both(
        cx in -5.0f64..5.0, cy in -5.0f64..5.0,
        r1 in 0.5f64..4.0, r2 in 0.5f64..4.0,
    ) {
        let a = circle(0.0, 0.0, r1);
        let b = circle(cx, cy, r2);
        let (points, converged) = candidates(&a, &b, false, &cfg());
        prop_assert!(converged);
        prop_assert!(points.len() <= 2);
        for p in points {
            let da = (p.norm() - r1).abs();
            let db = ((p - vector![cx, cy]).norm() - r2).abs();
            prop_assert!(da < 1e-3 && db < 1e-3, "{:?} off by {} / {}", p, da, db);
        }
    }
}

//! Criterion benchmarks for update walks.
//! Shapes: midpoint chains (depth n) and fans (n intersections over one pair of circles).
//! Results: by default under target/criterion; to store under data/bench, run:
//!   CARGO_TARGET_DIR=data/bench cargo bench -p dyngeo

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dyngeo::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn chain(n: usize) -> (Graph, NodeId) {
    let mut g = Graph::default();
    let root = g.create(ElementKind::FreePoint { x: 0.0, y: 0.0 }, &[]).unwrap();
    let anchor = g.create(ElementKind::FreePoint { x: 1.0, y: 1.0 }, &[]).unwrap();
    let mut last = root;
    for _ in 0..n {
        last = g.create(ElementKind::Midpoint, &[last, anchor]).unwrap();
    }
    (g, root)
}

fn fan(n: usize) -> (Graph, NodeId) {
    let mut g = Graph::default();
    let a = g.create(ElementKind::FreePoint { x: 0.0, y: 0.0 }, &[]).unwrap();
    let b = g.create(ElementKind::FreePoint { x: 2.0, y: 1.0 }, &[]).unwrap();
    let ca = g.create(ElementKind::CircleByRadius(3.0), &[a]).unwrap();
    let cb = g.create(ElementKind::CircleByRadius(2.5), &[b]).unwrap();
    for k in 0..n {
        g.create(ElementKind::intersection(k % 2), &[ca, cb]).unwrap();
    }
    (g, b)
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    for &n in &[10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("chain", n), &n, |bch, &n| {
            let (mut g, root) = chain(n);
            let mut rng = StdRng::seed_from_u64(41);
            bch.iter(|| {
                g.set_position(root, rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)).unwrap();
                g.notify_changed(&[root]).unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("fan", n), &n, |bch, &n| {
            let (mut g, moved) = fan(n);
            let mut rng = StdRng::seed_from_u64(42);
            bch.iter(|| {
                g.set_position(moved, rng.gen_range(1.0..3.0), rng.gen_range(0.0..2.0)).unwrap();
                g.notify_changed(&[moved]).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_update);
criterion_main!(benches);

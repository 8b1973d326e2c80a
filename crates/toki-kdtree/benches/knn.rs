//! Benchmarks for k-NN queries against a brute-force scan baseline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use toki_kdtree::KdTree;
use toki_metric::squared_distance;

const DIMS: usize = 3;
const K: usize = 10;

fn build_tree(n: usize) -> (KdTree<usize>, Vec<Vec<f64>>) {
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    let mut tree = KdTree::new(DIMS).unwrap();
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let point: Vec<f64> = (0..DIMS).map(|_| rng.gen_range(-1_000.0..1_000.0)).collect();
        tree.add(&point, i).unwrap();
        points.push(point);
    }
    (tree, points)
}

fn bench_nearest_neighbors(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_neighbors");

    for n in [1_000, 10_000, 100_000].iter() {
        let (tree, _) = build_tree(*n);
        let query = [12.5, -340.0, 777.0];
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bencher, _| {
            bencher.iter(|| {
                tree.nearest_neighbors(black_box(&query), K)
                    .unwrap()
                    .count()
            })
        });
    }

    group.finish();
}

fn bench_brute_force(c: &mut Criterion) {
    let mut group = c.benchmark_group("brute_force_scan");

    for n in [1_000, 10_000, 100_000].iter() {
        let (_, points) = build_tree(*n);
        let query = [12.5, -340.0, 777.0];
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bencher, _| {
            bencher.iter(|| {
                let mut distances: Vec<f64> = points
                    .iter()
                    .map(|p| squared_distance(black_box(&query), p))
                    .collect();
                distances.sort_by(|a, b| a.partial_cmp(b).unwrap());
                distances.truncate(K);
                distances
            })
        });
    }

    group.finish();
}

fn bench_moving_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_point");

    for n in [1_000, 10_000].iter() {
        let (mut tree, points) = build_tree(*n);
        let mut step = 0usize;
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bencher, _| {
            bencher.iter(|| {
                step = (step + 1) % points.len();
                let mut moved = points[step].clone();
                moved[0] += 1.0;
                tree.move_point(black_box(&moved), &step).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_nearest_neighbors,
    bench_brute_force,
    bench_moving_workload
);
criterion_main!(benches);

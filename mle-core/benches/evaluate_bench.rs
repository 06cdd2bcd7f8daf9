//! Benchmarks for point evaluation.
//!
//! Run with: `cargo bench --bench evaluate_bench`
//!
//! Measures single transform samples, single points at various depths, and
//! parallel grid evaluation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mle_core::solver::{DenseLuSolver, DenseQrSolver, Solver};
use mle_core::system::{NormalizedStack, TransformSample};
use mle_core::{Analysis, EvaluationPoint, LayerStack, LoadSpec};

fn reference_stack(n_layers: usize) -> LayerStack {
    let mut builder = LayerStack::builder();
    for i in 0..n_layers - 1 {
        builder = builder.layer(5500.0 / (i + 1) as f64, 0.35, 0.04 + 0.05 * i as f64).bonded();
    }
    builder.half_space(50.0, 0.35).build().unwrap()
}

fn load() -> LoadSpec {
    LoadSpec::new(0.667, 0.1125).unwrap()
}

/// One assembled and solved interface system per backend and stack size.
fn bench_transform_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_sample");

    for n_layers in [2, 3, 5, 8] {
        let geometry = NormalizedStack::new(&reference_stack(n_layers), 0.1125);
        let backends: [(&str, Box<dyn Solver>); 2] = [
            ("lu", Box::new(DenseLuSolver::default())),
            ("qr", Box::new(DenseQrSolver::default())),
        ];
        for (name, solver) in &backends {
            group.bench_with_input(BenchmarkId::new(*name, n_layers), &n_layers, |b, _| {
                b.iter(|| TransformSample::solve(black_box(2.5), &geometry, solver.as_ref()))
            });
        }
    }

    group.finish();
}

/// Full evaluation of a single point at increasing depth.
fn bench_single_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_point");
    let analysis = Analysis::with_defaults(reference_stack(3), load()).unwrap();

    for depth in [0.0, 0.04, 0.19, 0.6] {
        let point = EvaluationPoint::new(0.0, depth);
        group.bench_with_input(
            BenchmarkId::new("on_axis", format!("z_{:.2}", depth)),
            &point,
            |b, p| b.iter(|| analysis.evaluate(black_box(p))),
        );
    }

    group.finish();
}

/// Parallel grid of 5 offsets × 6 depths.
fn bench_grid(c: &mut Criterion) {
    let analysis = Analysis::with_defaults(reference_stack(3), load()).unwrap();
    let offsets = [0.0, 0.05, 0.1, 0.2, 0.4];
    let depths = [0.02, 0.04, 0.1, 0.19, 0.3, 0.6];

    c.bench_function("grid_5x6", |b| {
        b.iter(|| analysis.evaluate_grid(black_box(&offsets), black_box(&depths)))
    });
}

criterion_group!(benches, bench_transform_sample, bench_single_point, bench_grid);
criterion_main!(benches);

//! Benchmarks for statevector engine operations
//!
//! Compares the dense matrix path with the diagonal and specialized
//! multi-controlled kernels, and measures probability and sampling cost
//! across state sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use num_complex::Complex64;
use qvec_state::QubitVector;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn hadamard() -> Vec<Complex64> {
    let h = std::f64::consts::FRAC_1_SQRT_2;
    vec![c(h, 0.0), c(h, 0.0), c(h, 0.0), c(-h, 0.0)]
}

fn rotation_x(theta: f64) -> Vec<Complex64> {
    let (cos, sin) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    vec![c(cos, 0.0), c(0.0, -sin), c(0.0, -sin), c(cos, 0.0)]
}

fn phase_diagonal(theta: f64) -> Vec<Complex64> {
    vec![c(1.0, 0.0), c(theta.cos(), theta.sin())]
}

fn superposition(num_qubits: usize) -> QubitVector {
    let mut qv = QubitVector::new(num_qubits).unwrap();
    let had = hadamard();
    for q in 0..num_qubits {
        qv.apply_matrix(&[q], &had).unwrap();
    }
    qv
}

fn bench_single_qubit_matrix(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("single_qubit_matrix");
    for num_qubits in [10, 14, 18] {
        group.throughput(Throughput::Elements(1 << num_qubits));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_qubits),
            &num_qubits,
            |bench, &num_qubits| {
                let mut qv = superposition(num_qubits);
                let rx = rotation_x(0.3);
                bench.iter(|| {
                    qv.apply_matrix(black_box(&[num_qubits / 2]), &rx).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_diagonal_vs_dense(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("diagonal_vs_dense_z");
    for num_qubits in [10, 14, 18] {
        group.throughput(Throughput::Elements(1 << num_qubits));
        group.bench_with_input(
            BenchmarkId::new("diagonal", num_qubits),
            &num_qubits,
            |bench, &num_qubits| {
                let mut qv = superposition(num_qubits);
                let diag = phase_diagonal(0.7);
                bench.iter(|| {
                    qv.apply_diagonal_matrix(black_box(&[0]), &diag).unwrap();
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("dense", num_qubits),
            &num_qubits,
            |bench, &num_qubits| {
                let mut qv = superposition(num_qubits);
                let rx = rotation_x(0.7);
                bench.iter(|| {
                    qv.apply_matrix(black_box(&[0]), &rx).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_specialized_vs_dense_cx(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("cx_kernel");
    // Column-major CX for the dense comparison path.
    let mut cx = vec![c(0.0, 0.0); 16];
    cx[0] = c(1.0, 0.0);
    cx[3 + 4] = c(1.0, 0.0);
    cx[2 + 8] = c(1.0, 0.0);
    cx[1 + 12] = c(1.0, 0.0);

    for num_qubits in [10, 14, 18] {
        group.throughput(Throughput::Elements(1 << num_qubits));
        group.bench_with_input(
            BenchmarkId::new("mcx", num_qubits),
            &num_qubits,
            |bench, &num_qubits| {
                let mut qv = superposition(num_qubits);
                bench.iter(|| {
                    qv.apply_mcx(black_box(&[0, num_qubits - 1])).unwrap();
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("dense", num_qubits),
            &num_qubits,
            |bench, &num_qubits| {
                let mut qv = superposition(num_qubits);
                bench.iter(|| {
                    qv.apply_matrix(black_box(&[0, num_qubits - 1]), &cx).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_probabilities(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("probabilities");
    for num_qubits in [10, 14, 18] {
        group.throughput(Throughput::Elements(1 << num_qubits));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_qubits),
            &num_qubits,
            |bench, &num_qubits| {
                let qv = superposition(num_qubits);
                let qubits = [1, num_qubits - 2];
                bench.iter(|| qv.probabilities_for(black_box(&qubits)).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_sample_measure(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sample_measure");
    let rnds: Vec<f64> = (0..1024).map(|i| (i as f64 + 0.5) / 1024.0).collect();
    for num_qubits in [10, 14, 18] {
        group.throughput(Throughput::Elements(rnds.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_qubits),
            &num_qubits,
            |bench, &num_qubits| {
                let qv = superposition(num_qubits);
                bench.iter(|| qv.sample_measure(black_box(&rnds)));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_single_qubit_matrix,
    bench_diagonal_vs_dense,
    bench_specialized_vs_dense_cx,
    bench_probabilities,
    bench_sample_measure
);
criterion_main!(benches);

//! End-to-end scenarios for the statevector engine

use approx::assert_relative_eq;
use num_complex::Complex64;
use qvec_state::{QubitVector, StateError};
use std::f64::consts::FRAC_1_SQRT_2;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn hadamard() -> Vec<Complex64> {
    let h = FRAC_1_SQRT_2;
    vec![c(h, 0.0), c(h, 0.0), c(h, 0.0), c(-h, 0.0)]
}

fn cx_matrix() -> Vec<Complex64> {
    // Column-major CX, control = first register qubit.
    let mut m = vec![c(0.0, 0.0); 16];
    m[0] = c(1.0, 0.0);
    m[3 + 4] = c(1.0, 0.0);
    m[2 + 8] = c(1.0, 0.0);
    m[1 + 12] = c(1.0, 0.0);
    m
}

#[test]
fn bell_pair_preparation() {
    let mut qv = QubitVector::new(2).unwrap();
    qv.apply_matrix(&[0], &hadamard()).unwrap();
    qv.apply_mcx(&[0, 1]).unwrap();

    let h = FRAC_1_SQRT_2;
    assert_relative_eq!(qv[0].re, h, epsilon = 1e-15);
    assert_relative_eq!(qv[1].norm(), 0.0, epsilon = 1e-15);
    assert_relative_eq!(qv[2].norm(), 0.0, epsilon = 1e-15);
    assert_relative_eq!(qv[3].re, h, epsilon = 1e-15);

    let probs = qv.probabilities();
    assert_relative_eq!(probs[0], 0.5, epsilon = 1e-12);
    assert_relative_eq!(probs[3], 0.5, epsilon = 1e-12);
}

#[test]
fn phase_kickback() {
    let h = FRAC_1_SQRT_2;
    let mut qv = QubitVector::new(2).unwrap();
    qv.initialize_from_vector(&[c(h, 0.0), c(h, 0.0), c(0.0, 0.0), c(0.0, 0.0)])
        .unwrap();

    // Target bit is zero everywhere: mcz is a no-op.
    qv.apply_mcz(&[0, 1]).unwrap();
    assert_relative_eq!(qv[0].re, h, epsilon = 1e-15);
    assert_relative_eq!(qv[1].re, h, epsilon = 1e-15);

    // After CX the |11> amplitude is populated and mcz flips its sign.
    qv.apply_mcx(&[0, 1]).unwrap();
    qv.apply_mcz(&[0, 1]).unwrap();
    assert_relative_eq!(qv[0].re, h, epsilon = 1e-15);
    assert_relative_eq!(qv[3].re, -h, epsilon = 1e-15);
}

#[test]
fn diagonal_fast_path_z() {
    let h = FRAC_1_SQRT_2;
    let mut qv = QubitVector::new(1).unwrap();
    qv.initialize_from_vector(&[c(h, 0.0), c(h, 0.0)]).unwrap();

    let z = vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)];
    qv.apply_matrix(&[0], &z).unwrap();

    assert_relative_eq!(qv[0].re, h, epsilon = 1e-15);
    assert_relative_eq!(qv[1].re, -h, epsilon = 1e-15);
    assert_relative_eq!(qv.norm(), 1.0, epsilon = 1e-12);
}

#[test]
fn sampling_tail() {
    let mut qv = QubitVector::new(2).unwrap();
    qv.initialize_from_vector(&[c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)])
        .unwrap();
    assert_eq!(qv.sample_measure(&[0.0, 0.5, 0.999]), vec![3, 3, 3]);
}

#[test]
fn checkpoint_trial_and_revert() {
    let mut qv = QubitVector::new(3).unwrap();
    qv.initialize();
    qv.apply_mcx(&[0]).unwrap();
    qv.checkpoint().unwrap();

    qv.apply_mcx(&[1]).unwrap();
    qv.revert(false).unwrap();

    // Back to the post-first-X state.
    assert_relative_eq!(qv[1].re, 1.0, epsilon = 1e-15);
    for k in [0, 2, 3, 4, 5, 6, 7] {
        assert_relative_eq!(qv[k].norm(), 0.0, epsilon = 1e-15);
    }

    // The checkpoint was consumed.
    assert!(matches!(
        qv.inner_product(),
        Err(StateError::MissingCheckpoint)
    ));
}

#[test]
fn checkpoint_inner_product_equals_norm_after_revert_keep() {
    let mut qv = QubitVector::new(2).unwrap();
    qv.apply_matrix(&[0], &hadamard()).unwrap();
    qv.checkpoint().unwrap();
    qv.apply_mcx(&[0, 1]).unwrap();
    qv.revert(true).unwrap();

    let ip = qv.inner_product().unwrap();
    assert_relative_eq!(ip.re, qv.norm(), epsilon = 1e-12);
    assert_relative_eq!(ip.im, 0.0, epsilon = 1e-12);
}

#[test]
fn fusion_matches_stepwise_application() {
    let regs = vec![vec![0], vec![0, 1], vec![1, 2]];
    let mats = vec![hadamard(), cx_matrix(), cx_matrix()];

    let mut fused = QubitVector::new(3).unwrap();
    fused.apply_matrix_sequence(&regs, &mats).unwrap();

    let mut stepped = QubitVector::new(3).unwrap();
    for (reg, mat) in regs.iter().zip(&mats) {
        stepped.apply_matrix(reg, mat).unwrap();
    }

    for k in 0..8 {
        assert_relative_eq!(fused[k].re, stepped[k].re, epsilon = 8.0 * 8.0 * f64::EPSILON);
        assert_relative_eq!(fused[k].im, stepped[k].im, epsilon = 8.0 * 8.0 * f64::EPSILON);
    }
}

#[test]
fn identity_application_is_bit_exact_single_threaded() {
    let mut qv = QubitVector::new(3).unwrap();
    for q in 0..3 {
        qv.apply_matrix(&[q], &hadamard()).unwrap();
    }
    let before = qv.vector();

    let mut eye4 = vec![c(0.0, 0.0); 16];
    for i in 0..4 {
        eye4[i + 4 * i] = c(1.0, 0.0);
    }
    qv.apply_matrix(&[2, 0], &eye4).unwrap();
    assert_eq!(qv.vector(), before);
}

#[test]
fn unitary_preserves_norm() {
    let mut qv = QubitVector::new(4).unwrap();
    let theta: f64 = 0.3;
    // RX(theta), column-major.
    let rx = vec![
        c((theta / 2.0).cos(), 0.0),
        c(0.0, -(theta / 2.0).sin()),
        c(0.0, -(theta / 2.0).sin()),
        c((theta / 2.0).cos(), 0.0),
    ];
    let before = qv.norm();
    for q in 0..4 {
        qv.apply_matrix(&[q], &rx).unwrap();
        qv.apply_mcx(&[q, (q + 1) % 4]).unwrap();
    }
    assert_relative_eq!(qv.norm(), before, epsilon = 16.0 * 16.0 * f64::EPSILON);
}

#[test]
fn unitary_followed_by_adjoint_is_identity() {
    let mut qv = QubitVector::new(2).unwrap();
    qv.apply_matrix(&[0], &hadamard()).unwrap();
    qv.apply_mcx(&[0, 1]).unwrap();
    let before = qv.vector();

    let theta: f64 = 1.1;
    let u = vec![
        c((theta / 2.0).cos(), 0.0),
        c(0.0, -(theta / 2.0).sin()),
        c(0.0, -(theta / 2.0).sin()),
        c((theta / 2.0).cos(), 0.0),
    ];
    // Adjoint of RX(theta) is RX(-theta).
    let u_dag = vec![u[0], u[1].conj(), u[2].conj(), u[3]];

    qv.apply_matrix(&[1], &u).unwrap();
    qv.apply_matrix(&[1], &u_dag).unwrap();

    for k in 0..4 {
        assert_relative_eq!(qv[k].re, before[k].re, epsilon = 4.0 * 4.0 * f64::EPSILON);
        assert_relative_eq!(qv[k].im, before[k].im, epsilon = 4.0 * 4.0 * f64::EPSILON);
    }
}

#[test]
fn double_mcx_is_exact_identity() {
    let mut qv = QubitVector::new(3).unwrap();
    for q in 0..3 {
        qv.apply_matrix(&[q], &hadamard()).unwrap();
    }
    let before = qv.vector();
    qv.apply_mcx(&[1]).unwrap();
    qv.apply_mcx(&[1]).unwrap();
    assert_eq!(qv.vector(), before);
}

#[test]
fn mcz_flips_exactly_the_all_ones_amplitude() {
    let n = 4;
    let mut qv = QubitVector::new(n).unwrap();
    let amp = 1.0 / (16f64).sqrt();
    qv.initialize_from_vector(&vec![c(amp, 0.0); 16]).unwrap();

    let qubits = [0, 2, 3];
    qv.apply_mcz(&qubits).unwrap();

    let flipped: usize = qubits.iter().map(|&q| 1usize << q).sum();
    for k in 0..16 {
        let expected = if k == flipped { -amp } else { amp };
        assert_relative_eq!(qv[k].re, expected, epsilon = 1e-15);
    }
}

#[test]
fn diagonal_equals_dense_diagonal() {
    let mut a = QubitVector::new(3).unwrap();
    let mut b = QubitVector::new(3).unwrap();
    for q in 0..3 {
        a.apply_matrix(&[q], &hadamard()).unwrap();
        b.apply_matrix(&[q], &hadamard()).unwrap();
    }

    let d: Vec<Complex64> = (0..8)
        .map(|i| {
            let phi = i as f64 * 0.7;
            c(phi.cos(), phi.sin())
        })
        .collect();
    a.apply_diagonal_matrix(&[0, 1, 2], &d).unwrap();

    let mut dense = vec![c(0.0, 0.0); 64];
    for i in 0..8 {
        dense[i + 8 * i] = d[i];
    }
    b.apply_matrix(&[0, 1, 2], &dense).unwrap();

    for k in 0..8 {
        assert_relative_eq!(a[k].re, b[k].re, epsilon = 8.0 * f64::EPSILON);
        assert_relative_eq!(a[k].im, b[k].im, epsilon = 8.0 * f64::EPSILON);
    }
}

#[test]
fn parallel_execution_matches_sequential() {
    let n = 8;
    let mut seq = QubitVector::new(n).unwrap();
    let mut par = QubitVector::new(n).unwrap();
    par.set_parallel_threads(4).unwrap();
    par.set_parallel_threshold(4);

    let theta: f64 = 0.9;
    let ry = vec![
        c((theta / 2.0).cos(), 0.0),
        c((theta / 2.0).sin(), 0.0),
        c(-(theta / 2.0).sin(), 0.0),
        c((theta / 2.0).cos(), 0.0),
    ];
    for qv in [&mut seq, &mut par] {
        for q in 0..n {
            qv.apply_matrix(&[q], &hadamard()).unwrap();
            qv.apply_matrix(&[(q + 3) % n], &ry).unwrap();
            qv.apply_mcx(&[q, (q + 1) % n]).unwrap();
        }
        qv.apply_mcz(&[0, 4, 7]).unwrap();
    }

    for k in 0..seq.size() {
        assert_relative_eq!(seq[k].re, par[k].re, epsilon = 1e-12);
        assert_relative_eq!(seq[k].im, par[k].im, epsilon = 1e-12);
    }

    // Reductions agree to tolerance as well.
    assert_relative_eq!(seq.norm(), par.norm(), epsilon = 1e-12);
    let seq_marg = seq.probabilities_for(&[1, 5]).unwrap();
    let par_marg = par.probabilities_for(&[1, 5]).unwrap();
    for m in 0..4 {
        assert_relative_eq!(seq_marg[m], par_marg[m], epsilon = 1e-12);
    }
}

#[test]
fn resize_then_reinitialize() {
    let mut qv = QubitVector::new(2).unwrap();
    qv.apply_matrix(&[0], &hadamard()).unwrap();
    qv.set_num_qubits(3).unwrap();
    qv.initialize();
    assert_eq!(qv.size(), 8);
    assert_relative_eq!(qv.probability(0), 1.0, epsilon = 1e-15);
    assert_relative_eq!(qv.norm(), 1.0, epsilon = 1e-15);
}

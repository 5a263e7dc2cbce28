//! Gate-fusion helpers: qubit reordering and matrix expansion
//!
//! A short chain of 1- and 2-qubit gates can be collapsed into one k-qubit
//! matrix on the union of its qubits, trading a handful of small
//! matrix-matrix products for all but one full-state pass. The helpers here
//! reorder a packed matrix to ascending qubit order ([`sort_matrix`]) and
//! embed it into the larger sorted qubit space ([`expand_matrix`]);
//! [`QubitVector::apply_matrix_sequence`] drives them.

use crate::error::{Result, StateError};
use crate::indexing::bit;
use crate::state::QubitVector;
use num_complex::Complex64;

/// Swap the rows and columns of a packed `dim × dim` matrix that correspond
/// to exchanging qubits `idx1` and `idx2` of its index space.
pub(crate) fn swap_cols_and_rows(idx1: usize, idx2: usize, mat: &mut [Complex64], dim: usize) {
    let mask1 = bit(idx1);
    let mask2 = bit(idx2);

    for first in 0..dim {
        if (first & mask1) != 0 && (first & mask2) == 0 {
            let second = (first ^ mask1) | mask2;
            for i in 0..dim {
                mat.swap(first * dim + i, second * dim + i);
            }
            for i in 0..dim {
                mat.swap(i * dim + first, i * dim + second);
            }
        }
    }
}

/// Permute a vectorized k-qubit matrix so that its qubits, currently in
/// `src` order, appear in `sorted` order. This is a conjugation by the
/// induced basis permutation.
///
/// # Errors
/// Returns [`StateError::ReorderMismatch`] if `sorted` is not a permutation
/// of `src` (internal bug guard).
pub(crate) fn sort_matrix(
    src: &[usize],
    sorted: &[usize],
    mat: &[Complex64],
) -> Result<Vec<Complex64>> {
    let dim = bit(src.len());
    let mut ret = mat.to_vec();
    let mut current = src.to_vec();

    while current != sorted {
        let mut from = 0;
        while from < current.len() && current[from] == sorted[from] {
            from += 1;
        }
        if from == current.len() {
            break;
        }
        let mut to = from + 1;
        while to < current.len() && current[from] != sorted[to] {
            to += 1;
        }
        if to == current.len() {
            return Err(StateError::ReorderMismatch {
                src: src.to_vec(),
                sorted: sorted.to_vec(),
            });
        }
        swap_cols_and_rows(from, to, &mut ret, dim);
        current.swap(from, to);
    }

    Ok(ret)
}

/// Embed a small matrix on `src_qubits` into the space of
/// `dst_sorted_qubits` (which must contain every source qubit, in ascending
/// order), acting as the identity on the extra qubits.
///
/// Supports 1- and 2-qubit sources; larger sources are an open extension
/// point and are rejected.
///
/// # Errors
/// Returns [`StateError::UnsupportedExpansion`] for ≥3 source qubits and
/// [`StateError::ReorderMismatch`] if a source qubit is missing from the
/// destination set.
pub(crate) fn expand_matrix(
    src_qubits: &[usize],
    dst_sorted_qubits: &[usize],
    vmat: &[Complex64],
) -> Result<Vec<Complex64>> {
    let dst_dim = bit(dst_sorted_qubits.len());
    let src_dim = bit(src_qubits.len());
    let mut u = vec![Complex64::new(0.0, 0.0); dst_dim * dst_dim];
    let mut filled = vec![false; dst_dim];

    let position = |qubit: usize| -> Result<usize> {
        dst_sorted_qubits
            .iter()
            .position(|&q| q == qubit)
            .ok_or_else(|| StateError::ReorderMismatch {
                src: src_qubits.to_vec(),
                sorted: dst_sorted_qubits.to_vec(),
            })
    };

    match src_qubits.len() {
        1 => {
            let delta = bit(position(src_qubits[0])?);

            for i in 0..dst_dim {
                if filled[i] {
                    continue;
                }
                u[i + i * dst_dim] = vmat[0];
                u[i + (i + delta) * dst_dim] = vmat[src_dim];
                u[(i + delta) + i * dst_dim] = vmat[1];
                u[(i + delta) + (i + delta) * dst_dim] = vmat[1 + src_dim];
                filled[i] = true;
                filled[i + delta] = true;
            }
        }
        2 => {
            let mut sorted_src = src_qubits.to_vec();
            sorted_src.sort_unstable();
            let sorted_vmat = sort_matrix(src_qubits, &sorted_src, vmat)?;

            let low_delta = bit(position(sorted_src[0])?);
            let high_delta = bit(position(sorted_src[1])?);
            let offsets = [0, low_delta, high_delta, low_delta + high_delta];

            for i in 0..dst_dim {
                if filled[i] {
                    continue;
                }
                for (row, &row_off) in offsets.iter().enumerate() {
                    for (col, &col_off) in offsets.iter().enumerate() {
                        u[(i + row_off) + (i + col_off) * dst_dim] =
                            sorted_vmat[row + col * src_dim];
                    }
                }
                for &off in &offsets {
                    filled[i + off] = true;
                }
            }
        }
        n => {
            return Err(StateError::UnsupportedExpansion { num_qubits: n });
        }
    }

    Ok(u)
}

impl QubitVector {
    /// Apply a sequence of matrices, fusing them into a single operator when
    /// possible.
    ///
    /// When every register has at most two qubits, the matrices are embedded
    /// into the sorted union of all participating qubits, multiplied
    /// left-to-right and applied as one k-qubit matrix, trading one
    /// full-state pass per gate for a single pass. Any register above two
    /// qubits disables fusion
    /// and the matrices are applied one by one. An empty sequence is a no-op.
    ///
    /// # Errors
    /// Returns an error if `regs` and `mats` differ in length, or on any
    /// qubit/matrix precondition violation.
    pub fn apply_matrix_sequence(
        &mut self,
        regs: &[Vec<usize>],
        mats: &[Vec<Complex64>],
    ) -> Result<()> {
        if mats.is_empty() {
            return Ok(());
        }
        if regs.len() != mats.len() {
            return Err(StateError::DimensionMismatch {
                expected: regs.len(),
                actual: mats.len(),
            });
        }
        for (reg, mat) in regs.iter().zip(mats) {
            self.check_qubits(reg)?;
            self.check_matrix(mat, reg.len())?;
        }

        if regs.iter().any(|reg| reg.len() > 2) {
            for (reg, mat) in regs.iter().zip(mats) {
                self.apply_matrix(reg, mat)?;
            }
            return Ok(());
        }

        let mut sorted_qubits: Vec<usize> = Vec::new();
        for reg in regs {
            for &qubit in reg {
                if !sorted_qubits.contains(&qubit) {
                    sorted_qubits.push(qubit);
                }
            }
        }
        sorted_qubits.sort_unstable();

        let dim = bit(sorted_qubits.len());
        let mut fused = expand_matrix(&regs[0], &sorted_qubits, &mats[0])?;
        for (reg, mat) in regs.iter().zip(mats).skip(1) {
            let expanded = expand_matrix(reg, &sorted_qubits, mat)?;
            let mut product = vec![Complex64::new(0.0, 0.0); fused.len()];
            for i in 0..dim {
                for j in 0..dim {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for k in 0..dim {
                        acc += expanded[i + k * dim] * fused[k + j * dim];
                    }
                    product[i + j * dim] = acc;
                }
            }
            fused = product;
        }

        self.apply_matrix(&sorted_qubits, &fused)
    }
}

//! Norm and operator-norm reductions
//!
//! `norm` is the squared L2 norm of the state; the matrix and diagonal
//! variants return ⟨ψ|A†A|ψ⟩ for an operator A applied to a qubit subset,
//! without mutating the state.

use crate::error::Result;
use crate::state::QubitVector;
use num_complex::Complex64;

/// Accumulate `Σ_i ‖Σ_j M[i + dim·j] · a[inds[j]]‖²` for one block.
#[inline]
fn matrix_norm_block(
    dim: usize,
    mat: &[Complex64],
    data: &[Complex64],
    inds: &[usize],
    val: &mut f64,
) {
    for i in 0..dim {
        let mut vi = Complex64::new(0.0, 0.0);
        for j in 0..dim {
            vi += mat[i + dim * j] * data[inds[j]];
        }
        *val += vi.norm_sqr();
    }
}

#[inline]
fn diagonal_norm_block(dim: usize, diag: &[Complex64], data: &[Complex64], inds: &[usize], val: &mut f64) {
    for i in 0..dim {
        let vi = diag[i] * data[inds[i]];
        *val += vi.norm_sqr();
    }
}

impl QubitVector {
    /// Squared norm of the state: `Σ_k |a[k]|²`.
    pub fn norm(&self) -> f64 {
        let data = self.data.as_slice();
        self.reduce_all(|k, re, _im| *re += data[k].norm_sqr()).re
    }

    /// Norm of the vector obtained by applying the column-major k-qubit
    /// matrix `mat` to the state: the expectation value ⟨ψ|M†M|ψ⟩.
    ///
    /// # Errors
    /// Returns an error on an invalid qubit index or a matrix length other
    /// than `4^k`.
    pub fn norm_matrix(&self, qubits: &[usize], mat: &[Complex64]) -> Result<f64> {
        self.check_qubits(qubits)?;
        self.check_matrix(mat, qubits.len())?;
        let data = self.data.as_slice();

        let val = match qubits.len() {
            1 => return self.norm_matrix_single(qubits[0], mat),
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.reduce_blocks::<2, 4, _>(&qs, |inds, re, _| {
                    matrix_norm_block(4, mat, data, inds, re)
                })
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.reduce_blocks::<3, 8, _>(&qs, |inds, re, _| {
                    matrix_norm_block(8, mat, data, inds, re)
                })
            }
            4 => {
                let qs = [qubits[0], qubits[1], qubits[2], qubits[3]];
                self.reduce_blocks::<4, 16, _>(&qs, |inds, re, _| {
                    matrix_norm_block(16, mat, data, inds, re)
                })
            }
            n => {
                let dim = 1usize << n;
                self.reduce_blocks_dyn(qubits, |inds, re, _| {
                    matrix_norm_block(dim, mat, data, inds, re)
                })
            }
        };
        Ok(val.re)
    }

    /// Norm of the vector obtained by applying a k-qubit diagonal matrix:
    /// `Σ_i |d[i] · a[B[i]]|²` summed over all blocks.
    ///
    /// # Errors
    /// Returns an error on an invalid qubit index or a diagonal length other
    /// than `2^k`.
    pub fn norm_diagonal(&self, qubits: &[usize], diag: &[Complex64]) -> Result<f64> {
        self.check_qubits(qubits)?;
        self.check_vector(diag, qubits.len())?;
        let data = self.data.as_slice();

        let val = match qubits.len() {
            1 => return self.norm_diagonal_single(qubits[0], diag),
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.reduce_blocks::<2, 4, _>(&qs, |inds, re, _| {
                    diagonal_norm_block(4, diag, data, inds, re)
                })
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.reduce_blocks::<3, 8, _>(&qs, |inds, re, _| {
                    diagonal_norm_block(8, diag, data, inds, re)
                })
            }
            4 => {
                let qs = [qubits[0], qubits[1], qubits[2], qubits[3]];
                self.reduce_blocks::<4, 16, _>(&qs, |inds, re, _| {
                    diagonal_norm_block(16, diag, data, inds, re)
                })
            }
            n => {
                let dim = 1usize << n;
                self.reduce_blocks_dyn(qubits, |inds, re, _| {
                    diagonal_norm_block(dim, diag, data, inds, re)
                })
            }
        };
        Ok(val.re)
    }

    /// Single-qubit matrix norm with the same exact-diagonal forwarding as
    /// [`apply_matrix`](Self::apply_matrix).
    fn norm_matrix_single(&self, qubit: usize, mat: &[Complex64]) -> Result<f64> {
        let zero = Complex64::new(0.0, 0.0);
        if mat[1] == zero && mat[2] == zero {
            return self.norm_diagonal_single(qubit, &[mat[0], mat[3]]);
        }
        let data = self.data.as_slice();
        let (m0, m1, m2, m3) = (mat[0], mat[1], mat[2], mat[3]);
        let val = self.reduce_blocks::<1, 2, _>(&[qubit], |inds, re, _| {
            let v0 = m0 * data[inds[0]] + m2 * data[inds[1]];
            let v1 = m1 * data[inds[0]] + m3 * data[inds[1]];
            *re += v0.norm_sqr() + v1.norm_sqr();
        });
        Ok(val.re)
    }

    fn norm_diagonal_single(&self, qubit: usize, diag: &[Complex64]) -> Result<f64> {
        let data = self.data.as_slice();
        let (d0, d1) = (diag[0], diag[1]);
        let val = self.reduce_blocks::<1, 2, _>(&[qubit], |inds, re, _| {
            let v0 = d0 * data[inds[0]];
            let v1 = d1 * data[inds[1]];
            *re += v0.norm_sqr() + v1.norm_sqr();
        });
        Ok(val.re)
    }
}

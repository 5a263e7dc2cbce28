//! Dense, diagonal and permutation matrix application

use crate::error::{Result, StateError};
use crate::state::QubitVector;
use crate::traversal::Amps;
use num_complex::Complex64;

/// Multiply one block by a column-major `D × D` matrix.
///
/// The touched amplitudes are copied into a stack cache, zeroed in place and
/// rebuilt as the mat-vec product.
#[inline]
fn multiply_block<const D: usize>(mat: &[Complex64], inds: &[usize; D], amps: &Amps) {
    let mut cache = [Complex64::new(0.0, 0.0); D];
    for i in 0..D {
        cache[i] = amps.get(inds[i]);
        amps.set(inds[i], Complex64::new(0.0, 0.0));
    }
    for i in 0..D {
        let mut acc = Complex64::new(0.0, 0.0);
        for j in 0..D {
            acc += mat[i + D * j] * cache[j];
        }
        amps.set(inds[i], acc);
    }
}

/// Runtime-sized variant of [`multiply_block`]; the cache lives on the
/// worker's heap.
#[inline]
fn multiply_block_dyn(dim: usize, mat: &[Complex64], inds: &[usize], amps: &Amps) {
    let mut cache = vec![Complex64::new(0.0, 0.0); dim];
    for i in 0..dim {
        cache[i] = amps.get(inds[i]);
        amps.set(inds[i], Complex64::new(0.0, 0.0));
    }
    for i in 0..dim {
        let mut acc = Complex64::new(0.0, 0.0);
        for j in 0..dim {
            acc += mat[i + dim * j] * cache[j];
        }
        amps.set(inds[i], acc);
    }
}

#[inline]
fn swap_pairs(pairs: &[(usize, usize)], inds: &[usize], amps: &Amps) {
    for &(u, v) in pairs {
        amps.swap(inds[u], inds[v]);
    }
}

impl QubitVector {
    /// Apply a k-qubit matrix to the state vector.
    ///
    /// The matrix is passed as the column-major vectorization of a
    /// `2^k × 2^k` matrix: `M[i][j]` lives at `mat[i + 2^k * j]`. Kernels for
    /// k ≤ 4 run with stack-allocated blocks; larger operators use a dynamic
    /// fallback.
    ///
    /// # Errors
    /// Returns an error on an invalid qubit index or a matrix length other
    /// than `4^k`.
    ///
    /// # Example
    ///
    /// ```
    /// use qvec_state::QubitVector;
    /// use num_complex::Complex64;
    ///
    /// let mut qv = QubitVector::new(1).unwrap();
    /// let x = vec![
    ///     Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0),
    ///     Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0),
    /// ];
    /// qv.apply_matrix(&[0], &x).unwrap();
    /// assert_eq!(qv[1], Complex64::new(1.0, 0.0));
    /// ```
    pub fn apply_matrix(&mut self, qubits: &[usize], mat: &[Complex64]) -> Result<()> {
        self.check_qubits(qubits)?;
        self.check_matrix(mat, qubits.len())?;

        match qubits.len() {
            1 => self.apply_matrix_single(qubits[0], mat),
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.update_blocks::<2, 4, _>(&qs, |inds, amps| {
                    multiply_block::<4>(mat, inds, amps)
                });
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.update_blocks::<3, 8, _>(&qs, |inds, amps| {
                    multiply_block::<8>(mat, inds, amps)
                });
            }
            4 => {
                let qs = [qubits[0], qubits[1], qubits[2], qubits[3]];
                self.update_blocks::<4, 16, _>(&qs, |inds, amps| {
                    multiply_block::<16>(mat, inds, amps)
                });
            }
            n => {
                let dim = 1usize << n;
                self.update_blocks_dyn(qubits, |inds, amps| {
                    multiply_block_dyn(dim, mat, inds, amps)
                });
            }
        }
        Ok(())
    }

    /// Apply a k-qubit diagonal matrix, passed as its length-`2^k` diagonal.
    ///
    /// # Errors
    /// Returns an error on an invalid qubit index or a diagonal length other
    /// than `2^k`.
    pub fn apply_diagonal_matrix(&mut self, qubits: &[usize], diag: &[Complex64]) -> Result<()> {
        self.check_qubits(qubits)?;
        self.check_vector(diag, qubits.len())?;

        match qubits.len() {
            1 => self.apply_diagonal_single(qubits[0], diag),
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.update_blocks::<2, 4, _>(&qs, |inds, amps| {
                    for i in 0..4 {
                        amps.mul(inds[i], diag[i]);
                    }
                });
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.update_blocks::<3, 8, _>(&qs, |inds, amps| {
                    for i in 0..8 {
                        amps.mul(inds[i], diag[i]);
                    }
                });
            }
            4 => {
                let qs = [qubits[0], qubits[1], qubits[2], qubits[3]];
                self.update_blocks::<4, 16, _>(&qs, |inds, amps| {
                    for i in 0..16 {
                        amps.mul(inds[i], diag[i]);
                    }
                });
            }
            n => {
                let dim = 1usize << n;
                self.update_blocks_dyn(qubits, |inds, amps| {
                    for i in 0..dim {
                        amps.mul(inds[i], diag[i]);
                    }
                });
            }
        }
        Ok(())
    }

    /// Swap pairs of amplitudes within every block.
    ///
    /// Each pair names two positions in the `2^k` block enumeration; the
    /// corresponding amplitudes are exchanged once per block.
    ///
    /// # Errors
    /// Returns an error on an invalid qubit index or a pair position outside
    /// `[0, 2^k)`.
    pub fn apply_permutation_matrix(
        &mut self,
        qubits: &[usize],
        pairs: &[(usize, usize)],
    ) -> Result<()> {
        self.check_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        for &(u, v) in pairs {
            if u >= dim || v >= dim {
                return Err(StateError::DimensionMismatch {
                    expected: dim,
                    actual: u.max(v) + 1,
                });
            }
        }

        match qubits.len() {
            1 => {
                let qs = [qubits[0]];
                self.update_blocks::<1, 2, _>(&qs, |inds, amps| swap_pairs(pairs, inds, amps));
            }
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.update_blocks::<2, 4, _>(&qs, |inds, amps| swap_pairs(pairs, inds, amps));
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.update_blocks::<3, 8, _>(&qs, |inds, amps| swap_pairs(pairs, inds, amps));
            }
            4 => {
                let qs = [qubits[0], qubits[1], qubits[2], qubits[3]];
                self.update_blocks::<4, 16, _>(&qs, |inds, amps| swap_pairs(pairs, inds, amps));
            }
            _ => {
                self.update_blocks_dyn(qubits, |inds, amps| swap_pairs(pairs, inds, amps));
            }
        }
        Ok(())
    }

    /// Single-qubit matrix application with opportunistic diagonal dispatch.
    ///
    /// Detection is exact: the off-diagonals must be bit-zero, as produced by
    /// gate factories. Near-diagonal matrices take the dense path.
    pub(crate) fn apply_matrix_single(&mut self, qubit: usize, mat: &[Complex64]) {
        let zero = Complex64::new(0.0, 0.0);
        if mat[1] == zero && mat[2] == zero {
            self.apply_diagonal_single(qubit, &[mat[0], mat[3]]);
            return;
        }

        let (m0, m1, m2, m3) = (mat[0], mat[1], mat[2], mat[3]);
        self.update_blocks::<1, 2, _>(&[qubit], |inds, amps| {
            let cache = amps.get(inds[0]);
            amps.set(inds[0], m0 * cache + m2 * amps.get(inds[1]));
            amps.set(inds[1], m1 * cache + m3 * amps.get(inds[1]));
        });
    }

    /// Single-qubit diagonal application with fast paths.
    ///
    /// `[[1,0],[0,1]]` is a no-op, `[[1,0],[0,±i]]` reduces to a real/imag
    /// swap, `[[1,0],[0,0]]` to a store, and the mirrored `[[z,0],[0,1]]`
    /// forms are handled symmetrically. The fast paths skip a complex
    /// multiply; results are identical to the general path.
    pub(crate) fn apply_diagonal_single(&mut self, qubit: usize, diag: &[Complex64]) {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let plus_i = Complex64::new(0.0, 1.0);
        let minus_i = Complex64::new(0.0, -1.0);
        let q = [qubit];

        if diag[0] == one {
            // [[1, 0], [0, z]] forms
            if diag[1] == one {
                return;
            }
            if diag[1] == minus_i {
                self.update_blocks::<1, 2, _>(&q, |inds, amps| {
                    let a = amps.get(inds[1]);
                    amps.set(inds[1], Complex64::new(a.im, -a.re));
                });
            } else if diag[1] == plus_i {
                self.update_blocks::<1, 2, _>(&q, |inds, amps| {
                    let a = amps.get(inds[1]);
                    amps.set(inds[1], Complex64::new(-a.im, a.re));
                });
            } else if diag[1] == zero {
                self.update_blocks::<1, 2, _>(&q, |inds, amps| amps.set(inds[1], zero));
            } else {
                let d1 = diag[1];
                self.update_blocks::<1, 2, _>(&q, |inds, amps| amps.mul(inds[1], d1));
            }
        } else if diag[1] == one {
            // [[z, 0], [0, 1]] forms
            if diag[0] == minus_i {
                self.update_blocks::<1, 2, _>(&q, |inds, amps| {
                    let a = amps.get(inds[0]);
                    amps.set(inds[0], Complex64::new(a.im, -a.re));
                });
            } else if diag[0] == plus_i {
                self.update_blocks::<1, 2, _>(&q, |inds, amps| {
                    let a = amps.get(inds[0]);
                    amps.set(inds[0], Complex64::new(-a.im, a.re));
                });
            } else if diag[0] == zero {
                self.update_blocks::<1, 2, _>(&q, |inds, amps| amps.set(inds[0], zero));
            } else {
                let d0 = diag[0];
                self.update_blocks::<1, 2, _>(&q, |inds, amps| amps.mul(inds[0], d0));
            }
        } else {
            let (d0, d1) = (diag[0], diag[1]);
            self.update_blocks::<1, 2, _>(&q, |inds, amps| {
                amps.mul(inds[0], d0);
                amps.mul(inds[1], d1);
            });
        }
    }
}

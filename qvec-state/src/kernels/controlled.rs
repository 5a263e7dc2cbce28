//! Specialized multi-controlled gate kernels
//!
//! A multi-controlled gate acts as the identity unless all but the last qubit
//! are in state |1⟩; the last qubit is the target. Inside a block enumerated
//! by the full qubit list, the two amplitudes that matter sit at fixed
//! positions: `pos0 = 2^(k-1) - 1` (controls set, target clear) and
//! `pos1 = 2^k - 1` (all set). Each kernel therefore touches exactly two
//! amplitudes per block instead of paying a full matrix multiply.

use crate::error::{Result, StateError};
use crate::indexing::{bit, lowmask};
use crate::state::QubitVector;
use crate::traversal::Amps;
use num_complex::Complex64;

impl QubitVector {
    #[inline]
    fn check_controlled(&self, qubits: &[usize], required: usize) -> Result<()> {
        if qubits.len() < required {
            return Err(StateError::NotEnoughQubits {
                required,
                actual: qubits.len(),
            });
        }
        self.check_qubits(qubits)
    }

    /// Apply a multi-controlled X gate.
    ///
    /// With one qubit this is an optimized X, with two a CX, with three a
    /// Toffoli; larger control sets use the dynamic fallback.
    ///
    /// # Errors
    /// Returns an error on an empty qubit list or an invalid qubit index.
    pub fn apply_mcx(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_controlled(qubits, 1)?;
        let n = qubits.len();
        let pos0 = lowmask(n - 1);
        let pos1 = lowmask(n);

        match n {
            1 => {
                let qs = [qubits[0]];
                self.update_blocks::<1, 2, _>(&qs, |inds, amps| amps.swap(inds[pos0], inds[pos1]));
            }
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.update_blocks::<2, 4, _>(&qs, |inds, amps| amps.swap(inds[pos0], inds[pos1]));
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.update_blocks::<3, 8, _>(&qs, |inds, amps| amps.swap(inds[pos0], inds[pos1]));
            }
            _ => {
                self.update_blocks_dyn(qubits, |inds, amps| amps.swap(inds[pos0], inds[pos1]));
            }
        }
        Ok(())
    }

    /// Apply a multi-controlled Y gate.
    ///
    /// # Errors
    /// Returns an error on an empty qubit list or an invalid qubit index.
    pub fn apply_mcy(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_controlled(qubits, 1)?;
        let n = qubits.len();
        let pos0 = lowmask(n - 1);
        let pos1 = lowmask(n);
        let plus_i = Complex64::new(0.0, 1.0);
        let minus_i = Complex64::new(0.0, -1.0);

        let kernel = move |inds: &[usize], amps: &Amps| {
            let cache = amps.get(inds[pos0]);
            amps.set(inds[pos0], minus_i * amps.get(inds[pos1]));
            amps.set(inds[pos1], plus_i * cache);
        };

        match n {
            1 => {
                let qs = [qubits[0]];
                self.update_blocks::<1, 2, _>(&qs, |inds, amps| kernel(inds, amps));
            }
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.update_blocks::<2, 4, _>(&qs, |inds, amps| kernel(inds, amps));
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.update_blocks::<3, 8, _>(&qs, |inds, amps| kernel(inds, amps));
            }
            _ => self.update_blocks_dyn(qubits, kernel),
        }
        Ok(())
    }

    /// Apply a multi-controlled Z gate.
    ///
    /// Flips the sign of the single amplitude per block whose qubits are all
    /// |1⟩.
    ///
    /// # Errors
    /// Returns an error on an empty qubit list or an invalid qubit index.
    pub fn apply_mcz(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_controlled(qubits, 1)?;
        let n = qubits.len();
        let pos1 = lowmask(n);

        match n {
            1 => {
                let qs = [qubits[0]];
                self.update_blocks::<1, 2, _>(&qs, |inds, amps| {
                    amps.set(inds[pos1], -amps.get(inds[pos1]));
                });
            }
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.update_blocks::<2, 4, _>(&qs, |inds, amps| {
                    amps.set(inds[pos1], -amps.get(inds[pos1]));
                });
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.update_blocks::<3, 8, _>(&qs, |inds, amps| {
                    amps.set(inds[pos1], -amps.get(inds[pos1]));
                });
            }
            _ => {
                self.update_blocks_dyn(qubits, |inds, amps| {
                    amps.set(inds[pos1], -amps.get(inds[pos1]));
                });
            }
        }
        Ok(())
    }

    /// Apply a multi-controlled SWAP gate over the last two qubits.
    ///
    /// With two qubits this is a plain SWAP, with three a Fredkin gate.
    ///
    /// # Errors
    /// Returns an error with fewer than two qubits or an invalid index.
    pub fn apply_mcswap(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_controlled(qubits, 2)?;
        let n = qubits.len();
        let pos0 = lowmask(n - 1);
        let pos1 = pos0 + bit(n - 2);

        match n {
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.update_blocks::<2, 4, _>(&qs, |inds, amps| amps.swap(inds[pos0], inds[pos1]));
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.update_blocks::<3, 8, _>(&qs, |inds, amps| amps.swap(inds[pos0], inds[pos1]));
            }
            _ => {
                self.update_blocks_dyn(qubits, |inds, amps| amps.swap(inds[pos0], inds[pos1]));
            }
        }
        Ok(())
    }

    /// Apply a multi-controlled single-qubit unitary to the last qubit.
    ///
    /// `mat` is the column-major 2×2 matrix. Exactly-diagonal matrices are
    /// detected as in [`apply_matrix`](Self::apply_matrix) and dispatched to
    /// a multiply-only kernel.
    ///
    /// # Errors
    /// Returns an error on an empty qubit list, an invalid qubit index or a
    /// matrix length other than 4.
    pub fn apply_mcu(&mut self, qubits: &[usize], mat: &[Complex64]) -> Result<()> {
        self.check_controlled(qubits, 1)?;
        self.check_matrix(mat, 1)?;
        let n = qubits.len();
        let pos0 = lowmask(n - 1);
        let pos1 = lowmask(n);
        let zero = Complex64::new(0.0, 0.0);

        if mat[1] == zero && mat[2] == zero {
            let (d0, d1) = (mat[0], mat[3]);
            if n == 1 {
                self.apply_diagonal_single(qubits[0], &[d0, d1]);
                return Ok(());
            }
            let kernel = move |inds: &[usize], amps: &Amps| {
                amps.mul(inds[pos0], d0);
                amps.mul(inds[pos1], d1);
            };
            match n {
                2 => {
                    let qs = [qubits[0], qubits[1]];
                    self.update_blocks::<2, 4, _>(&qs, |inds, amps| kernel(inds, amps));
                }
                3 => {
                    let qs = [qubits[0], qubits[1], qubits[2]];
                    self.update_blocks::<3, 8, _>(&qs, |inds, amps| kernel(inds, amps));
                }
                _ => self.update_blocks_dyn(qubits, kernel),
            }
            return Ok(());
        }

        if n == 1 {
            self.apply_matrix_single(qubits[0], mat);
            return Ok(());
        }
        let (m0, m1, m2, m3) = (mat[0], mat[1], mat[2], mat[3]);
        let kernel = move |inds: &[usize], amps: &Amps| {
            let cache = amps.get(inds[pos0]);
            amps.set(inds[pos0], m0 * cache + m2 * amps.get(inds[pos1]));
            amps.set(inds[pos1], m1 * cache + m3 * amps.get(inds[pos1]));
        };
        match n {
            2 => {
                let qs = [qubits[0], qubits[1]];
                self.update_blocks::<2, 4, _>(&qs, |inds, amps| kernel(inds, amps));
            }
            3 => {
                let qs = [qubits[0], qubits[1], qubits[2]];
                self.update_blocks::<3, 8, _>(&qs, |inds, amps| kernel(inds, amps));
            }
            _ => self.update_blocks_dyn(qubits, kernel),
        }
        Ok(())
    }
}

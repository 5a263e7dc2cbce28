//! Dense complex statevector engine for n-qubit quantum simulation
//!
//! The engine owns a contiguous, 64-byte-aligned array of `2^n` complex
//! amplitudes and provides the primitives a simulator controller needs:
//! applying arbitrary k-qubit unitary and diagonal operators in place,
//! specialized multi-controlled gate kernels, measurement probabilities and
//! outcome sampling, checkpoint/revert semantics and a JSON serialization
//! hook. It is exact up to floating-point round-off: no approximation, no
//! truncation, no sparse representation.
//!
//! Every operation is a structured gather/scatter over the amplitude array,
//! organized in blocks of `2^k` amplitudes addressed through the bit-index
//! scheme in [`indexing`]. Kernels execute sequentially by default; enabling
//! more worker threads activates fork-join data parallelism for states above
//! a configurable qubit threshold.
//!
//! # Example
//!
//! ```
//! use qvec_state::QubitVector;
//! use num_complex::Complex64;
//!
//! // Prepare a Bell pair and sample it.
//! let mut qv = QubitVector::new(2).unwrap();
//! let h = std::f64::consts::FRAC_1_SQRT_2;
//! let hadamard = vec![
//!     Complex64::new(h, 0.0), Complex64::new(h, 0.0),
//!     Complex64::new(h, 0.0), Complex64::new(-h, 0.0),
//! ];
//! qv.apply_matrix(&[0], &hadamard).unwrap();
//! qv.apply_mcx(&[0, 1]).unwrap();
//!
//! let samples = qv.sample_measure(&[0.25, 0.75]);
//! assert_eq!(samples, vec![0, 3]);
//! ```

pub mod error;
pub mod indexing;

mod fusion;
mod kernels;
mod norms;
mod probability;
mod serialize;
mod state;
mod traversal;

pub use error::{Result, StateError};
pub use state::{QubitVector, MAX_QUBITS};

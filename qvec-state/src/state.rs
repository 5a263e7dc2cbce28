//! Dense statevector container with aligned amplitude storage
//!
//! [`QubitVector`] owns a contiguous buffer of `2^n` complex amplitudes plus
//! an optional checkpoint buffer of the same size. It exposes the full engine
//! API: initialization, k-qubit matrix and gate application, probabilities,
//! sampling, norms, checkpoint/revert and serialization. The buffers are
//! allocated with 64-byte alignment so kernels can be vectorized.

use crate::error::{Result, StateError};
use num_complex::Complex64;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ops::{Index, IndexMut};
use std::ptr::NonNull;
use std::{fmt, mem};

/// Alignment for the amplitude buffers (64 bytes, AVX-512 friendly)
const SIMD_ALIGNMENT: usize = 64;

/// Largest addressable qubit count (indexes are 64-bit)
pub const MAX_QUBITS: usize = 63;

/// Default qubit threshold above which parallel execution activates
const DEFAULT_PARALLEL_THRESHOLD: usize = 14;

/// Default coarse-index qubit size for measurement sampling
const DEFAULT_SAMPLE_INDEX_SIZE: usize = 10;

/// Heap buffer of complex amplitudes with SIMD-friendly alignment.
///
/// Allocation failure is surfaced as an error value, never an abort; the
/// buffer is always zero-initialized.
pub(crate) struct AlignedBuf {
    data: NonNull<Complex64>,
    len: usize,
    layout: Layout,
}

impl AlignedBuf {
    fn new(len: usize) -> Result<Self> {
        let size = len
            .checked_mul(mem::size_of::<Complex64>())
            .ok_or(StateError::AllocationError { size: usize::MAX })?;
        let layout = Layout::from_size_align(size, SIMD_ALIGNMENT)
            .map_err(|_| StateError::AllocationError { size })?;
        let data = unsafe {
            let ptr = alloc_zeroed(layout) as *mut Complex64;
            if ptr.is_null() {
                return Err(StateError::AllocationError { size });
            }
            NonNull::new_unchecked(ptr)
        };
        Ok(Self { data, len, layout })
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[Complex64] {
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [Complex64] {
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut Complex64 {
        self.data.as_ptr()
    }

    fn copy_from(&mut self, other: &AlignedBuf) {
        debug_assert_eq!(self.len, other.len);
        unsafe {
            std::ptr::copy_nonoverlapping(other.data.as_ptr(), self.data.as_ptr(), self.len);
        }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.data.as_ptr() as *mut u8, self.layout);
        }
    }
}

// Safety: AlignedBuf owns its allocation and hands out access only through
// the usual borrow-checked slice methods.
unsafe impl Send for AlignedBuf {}
unsafe impl Sync for AlignedBuf {}

/// Dense n-qubit statevector engine.
///
/// Owns `2^n` complex amplitudes and applies arbitrary k-qubit operators in
/// place. Nothing is assumed about the norm of the state; the caller controls
/// normalization. The engine is single-owner and non-clonable: state crosses
/// an instance boundary only through moves or [`checkpoint`](Self::checkpoint)
/// / [`revert`](Self::revert).
///
/// Operations run sequentially by default. Calling
/// [`set_parallel_threads`](Self::set_parallel_threads) with more than one
/// worker enables fork-join data parallelism for states larger than the
/// [`parallel threshold`](Self::set_parallel_threshold).
///
/// # Example
///
/// ```
/// use qvec_state::QubitVector;
/// use num_complex::Complex64;
///
/// let mut qv = QubitVector::new(2).unwrap();
/// let h = std::f64::consts::FRAC_1_SQRT_2;
/// let hadamard = vec![
///     Complex64::new(h, 0.0), Complex64::new(h, 0.0),
///     Complex64::new(h, 0.0), Complex64::new(-h, 0.0),
/// ];
/// qv.apply_matrix(&[0], &hadamard).unwrap();
/// qv.apply_mcx(&[0, 1]).unwrap();
///
/// // Bell pair: only |00> and |11> are populated.
/// let probs = qv.probabilities();
/// assert!((probs[0] - 0.5).abs() < 1e-12);
/// assert!((probs[3] - 0.5).abs() < 1e-12);
/// ```
pub struct QubitVector {
    pub(crate) num_qubits: usize,
    pub(crate) data_size: usize,
    pub(crate) data: AlignedBuf,
    pub(crate) checkpoint: Option<AlignedBuf>,
    pub(crate) parallel_threshold: usize,
    pub(crate) parallel_threads: usize,
    pub(crate) pool: Option<rayon::ThreadPool>,
    pub(crate) json_chop_threshold: f64,
    pub(crate) sample_index_size: usize,
}

impl QubitVector {
    /// Create a new statevector initialized to |0...0⟩.
    ///
    /// # Errors
    /// Returns an error if `num_qubits > 63` or allocation fails.
    pub fn new(num_qubits: usize) -> Result<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let data_size = 1usize << num_qubits;
        let mut data = AlignedBuf::new(data_size)?;
        data.as_mut_slice()[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            data_size,
            data,
            checkpoint: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            parallel_threads: 1,
            pool: None,
            json_chop_threshold: 0.0,
            sample_index_size: DEFAULT_SAMPLE_INDEX_SIZE,
        })
    }

    /// Number of qubits of the current vector.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Size of the underlying amplitude buffer (`2^n`).
    #[inline]
    pub fn size(&self) -> usize {
        self.data_size
    }

    /// Borrow the amplitude buffer.
    #[inline]
    pub fn amplitudes(&self) -> &[Complex64] {
        self.data.as_slice()
    }

    /// Copy the amplitude buffer out as a vector.
    pub fn vector(&self) -> Vec<Complex64> {
        self.data.as_slice().to_vec()
    }

    /// Resize the vector to `num_qubits` qubits.
    ///
    /// Drops any checkpoint. The amplitude contents after a resize are
    /// unspecified; call [`initialize`](Self::initialize) or one of the other
    /// initializers before use.
    ///
    /// # Errors
    /// Returns an error if `num_qubits > 63` or allocation fails.
    pub fn set_num_qubits(&mut self, num_qubits: usize) -> Result<()> {
        if num_qubits > MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        self.checkpoint = None;
        if num_qubits != self.num_qubits {
            self.data = AlignedBuf::new(1usize << num_qubits)?;
        }
        self.num_qubits = num_qubits;
        self.data_size = 1usize << num_qubits;
        Ok(())
    }

    /// Set every amplitude to zero.
    pub fn zero(&mut self) {
        self.update_all(|_, amp| *amp = Complex64::new(0.0, 0.0));
    }

    /// Initialize to the all-zeros computational basis state |0...0⟩.
    pub fn initialize(&mut self) {
        self.zero();
        self.data.as_mut_slice()[0] = Complex64::new(1.0, 0.0);
    }

    /// Initialize the vector from a custom statevector.
    ///
    /// # Errors
    /// Returns a dimension mismatch if `statevec.len() != 2^n`.
    pub fn initialize_from_vector(&mut self, statevec: &[Complex64]) -> Result<()> {
        if statevec.len() != self.data_size {
            return Err(StateError::DimensionMismatch {
                expected: self.data_size,
                actual: statevec.len(),
            });
        }
        self.data.as_mut_slice().copy_from_slice(statevec);
        Ok(())
    }

    /// Initialize the specified qubits to a desired statevector, leaving the
    /// other qubits in their current state.
    ///
    /// Assumes the qubits being initialized are in a product state with the
    /// rest of the register (e.g. they have just been reset): for every block
    /// the base amplitude is distributed as `a[B[i]] = a[B[0]] * state[i]`.
    /// The norm is preserved iff `state` is normalized and the precondition
    /// holds.
    ///
    /// # Errors
    /// Returns an error on an invalid qubit index or if
    /// `state.len() != 2^qubits.len()`.
    pub fn initialize_component(
        &mut self,
        qubits: &[usize],
        state: &[Complex64],
    ) -> Result<()> {
        self.check_qubits(qubits)?;
        self.check_vector(state, qubits.len())?;
        let dim = state.len();
        self.update_blocks_dyn(qubits, |inds, amps| {
            let cache = amps.get(inds[0]);
            for i in 0..dim {
                amps.set(inds[i], cache * state[i]);
            }
        });
        Ok(())
    }

    //-----------------------------------------------------------------------
    // Checkpoint operations
    //-----------------------------------------------------------------------

    /// Snapshot the current amplitudes into the checkpoint buffer.
    ///
    /// # Errors
    /// Returns an error if the checkpoint allocation fails.
    pub fn checkpoint(&mut self) -> Result<()> {
        if self.checkpoint.is_none() {
            self.checkpoint = Some(AlignedBuf::new(self.data_size)?);
        }
        if let Some(ckpt) = self.checkpoint.as_mut() {
            ckpt.copy_from(&self.data);
        }
        Ok(())
    }

    /// Restore the amplitudes from the checkpoint.
    ///
    /// With `keep = true` the checkpoint stays valid for further reverts;
    /// with `keep = false` it is released.
    ///
    /// # Errors
    /// Returns [`StateError::MissingCheckpoint`] if no checkpoint exists.
    pub fn revert(&mut self, keep: bool) -> Result<()> {
        let ckpt = self
            .checkpoint
            .take()
            .ok_or(StateError::MissingCheckpoint)?;
        self.data.copy_from(&ckpt);
        if keep {
            self.checkpoint = Some(ckpt);
        }
        Ok(())
    }

    /// Inner product ⟨checkpoint|state⟩ of the current state with the
    /// checkpoint state: `Σ_k a[k] · conj(C[k])`.
    ///
    /// # Errors
    /// Returns [`StateError::MissingCheckpoint`] if no checkpoint exists.
    pub fn inner_product(&self) -> Result<Complex64> {
        let ckpt = self
            .checkpoint
            .as_ref()
            .ok_or(StateError::MissingCheckpoint)?
            .as_slice();
        let data = self.data.as_slice();
        Ok(self.reduce_all(|k, re, im| {
            let z = data[k] * ckpt[k].conj();
            *re += z.re;
            *im += z.im;
        }))
    }

    //-----------------------------------------------------------------------
    // Configuration
    //-----------------------------------------------------------------------

    /// Set the maximum number of worker threads for kernel execution.
    ///
    /// A value of 1 (the default) forces sequential execution; larger values
    /// build an engine-owned worker pool used whenever the state also exceeds
    /// the parallel threshold. Zero is ignored.
    ///
    /// # Errors
    /// Returns an error if the worker pool cannot be built.
    pub fn set_parallel_threads(&mut self, threads: usize) -> Result<()> {
        if threads == 0 {
            return Ok(());
        }
        if threads == 1 {
            self.parallel_threads = 1;
            self.pool = None;
            return Ok(());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| StateError::WorkerPool {
                reason: e.to_string(),
            })?;
        self.parallel_threads = threads;
        self.pool = Some(pool);
        Ok(())
    }

    /// Maximum number of worker threads.
    #[inline]
    pub fn parallel_threads(&self) -> usize {
        self.parallel_threads
    }

    /// Set the qubit threshold for activating parallel execution.
    ///
    /// Kernels run in parallel only when `num_qubits > threshold` and more
    /// than one worker thread is configured. Zero is ignored.
    pub fn set_parallel_threshold(&mut self, threshold: usize) {
        if threshold > 0 {
            self.parallel_threshold = threshold;
        }
    }

    /// Qubit threshold for activating parallel execution.
    #[inline]
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Set the threshold below which amplitude components are chopped to zero
    /// in JSON serialization. Negative values are ignored.
    pub fn set_json_chop_threshold(&mut self, threshold: f64) {
        if threshold >= 0.0 {
            self.json_chop_threshold = threshold;
        }
    }

    /// Threshold for chopping small values in JSON serialization.
    #[inline]
    pub fn json_chop_threshold(&self) -> f64 {
        self.json_chop_threshold
    }

    /// Set the coarse-index qubit size used by
    /// [`sample_measure`](Self::sample_measure). Zero is ignored.
    pub fn set_sample_index_size(&mut self, size: usize) {
        if size > 0 {
            self.sample_index_size = size;
        }
    }

    /// Coarse-index qubit size used by measurement sampling.
    #[inline]
    pub fn sample_index_size(&self) -> usize {
        self.sample_index_size
    }

    //-----------------------------------------------------------------------
    // Precondition checks
    //-----------------------------------------------------------------------

    #[inline]
    pub(crate) fn check_qubit(&self, qubit: usize) -> Result<()> {
        if qubit >= self.num_qubits {
            return Err(StateError::InvalidQubitIndex {
                index: qubit,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn check_qubits(&self, qubits: &[usize]) -> Result<()> {
        for &qubit in qubits {
            self.check_qubit(qubit)?;
        }
        Ok(())
    }

    /// Check a diagonal or component vector against the `2^n`-entry contract.
    #[inline]
    pub(crate) fn check_vector(&self, vec: &[Complex64], nqubits: usize) -> Result<()> {
        let dim = 1usize << nqubits;
        if vec.len() != dim {
            return Err(StateError::DimensionMismatch {
                expected: dim,
                actual: vec.len(),
            });
        }
        Ok(())
    }

    /// Check a column-major dense matrix against the `2^n × 2^n` contract.
    #[inline]
    pub(crate) fn check_matrix(&self, mat: &[Complex64], nqubits: usize) -> Result<()> {
        let dim = 1usize << nqubits;
        if mat.len() != dim * dim {
            return Err(StateError::DimensionMismatch {
                expected: dim * dim,
                actual: mat.len(),
            });
        }
        Ok(())
    }
}

impl Index<usize> for QubitVector {
    type Output = Complex64;

    #[inline]
    fn index(&self, element: usize) -> &Complex64 {
        &self.data.as_slice()[element]
    }
}

impl IndexMut<usize> for QubitVector {
    #[inline]
    fn index_mut(&mut self, element: usize) -> &mut Complex64 {
        &mut self.data.as_mut_slice()[element]
    }
}

impl fmt::Debug for QubitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QubitVector")
            .field("num_qubits", &self.num_qubits)
            .field("size", &self.data_size)
            .field("checkpoint", &self.checkpoint.is_some())
            .field("parallel_threads", &self.parallel_threads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_initializes_ground_state() {
        let qv = QubitVector::new(3).unwrap();
        assert_eq!(qv.num_qubits(), 3);
        assert_eq!(qv.size(), 8);
        assert_eq!(qv[0], Complex64::new(1.0, 0.0));
        for k in 1..qv.size() {
            assert_eq!(qv[k], Complex64::new(0.0, 0.0));
        }
    }

    #[test]
    fn test_zero_qubit_vector() {
        let qv = QubitVector::new(0).unwrap();
        assert_eq!(qv.size(), 1);
        assert_eq!(qv[0], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_too_many_qubits() {
        assert!(matches!(
            QubitVector::new(64),
            Err(StateError::TooManyQubits { requested: 64, .. })
        ));
    }

    #[test]
    fn test_set_num_qubits_resizes_and_drops_checkpoint() {
        let mut qv = QubitVector::new(2).unwrap();
        qv.checkpoint().unwrap();
        qv.set_num_qubits(4).unwrap();
        assert_eq!(qv.size(), 16);
        assert!(matches!(
            qv.inner_product(),
            Err(StateError::MissingCheckpoint)
        ));
    }

    #[test]
    fn test_initialize_from_vector() {
        let mut qv = QubitVector::new(1).unwrap();
        let amps = vec![Complex64::new(0.6, 0.0), Complex64::new(0.0, 0.8)];
        qv.initialize_from_vector(&amps).unwrap();
        assert_eq!(qv.vector(), amps);
    }

    #[test]
    fn test_initialize_from_vector_wrong_length() {
        let mut qv = QubitVector::new(2).unwrap();
        let amps = vec![Complex64::new(1.0, 0.0)];
        assert!(matches!(
            qv.initialize_from_vector(&amps),
            Err(StateError::DimensionMismatch {
                expected: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_initialize_component_sets_product_state() {
        // Start in |0>|0>, put qubit 0 into (|0> + |1>)/sqrt(2).
        let mut qv = QubitVector::new(2).unwrap();
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let plus = vec![Complex64::new(h, 0.0), Complex64::new(h, 0.0)];
        qv.initialize_component(&[0], &plus).unwrap();
        assert_relative_eq!(qv[0].re, h, epsilon = 1e-15);
        assert_relative_eq!(qv[1].re, h, epsilon = 1e-15);
        assert_relative_eq!(qv[2].norm(), 0.0, epsilon = 1e-15);
        assert_relative_eq!(qv[3].norm(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_checkpoint_revert_keep() {
        let mut qv = QubitVector::new(2).unwrap();
        qv.checkpoint().unwrap();
        qv.apply_mcx(&[0]).unwrap();
        qv.revert(true).unwrap();
        assert_eq!(qv[0], Complex64::new(1.0, 0.0));
        // Checkpoint kept: inner product is still legal and equals the norm.
        let ip = qv.inner_product().unwrap();
        assert_relative_eq!(ip.re, 1.0, epsilon = 1e-15);
        assert_relative_eq!(ip.im, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_revert_discard_frees_checkpoint() {
        let mut qv = QubitVector::new(2).unwrap();
        qv.checkpoint().unwrap();
        qv.revert(false).unwrap();
        assert!(matches!(qv.revert(true), Err(StateError::MissingCheckpoint)));
        assert!(matches!(
            qv.inner_product(),
            Err(StateError::MissingCheckpoint)
        ));
    }

    #[test]
    fn test_inner_product_detects_orthogonal_states() {
        let mut qv = QubitVector::new(1).unwrap();
        qv.checkpoint().unwrap();
        qv.apply_mcx(&[0]).unwrap();
        let ip = qv.inner_product().unwrap();
        assert_relative_eq!(ip.norm(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_config_setters_ignore_invalid() {
        let mut qv = QubitVector::new(1).unwrap();
        qv.set_parallel_threshold(0);
        assert_eq!(qv.parallel_threshold(), 14);
        qv.set_json_chop_threshold(-1.0);
        assert_eq!(qv.json_chop_threshold(), 0.0);
        qv.set_sample_index_size(0);
        assert_eq!(qv.sample_index_size(), 10);
        qv.set_parallel_threads(0).unwrap();
        assert_eq!(qv.parallel_threads(), 1);
    }

    #[test]
    fn test_parallel_pool_round_trip() {
        let mut qv = QubitVector::new(4).unwrap();
        qv.set_parallel_threads(2).unwrap();
        assert_eq!(qv.parallel_threads(), 2);
        qv.set_parallel_threads(1).unwrap();
        assert_eq!(qv.parallel_threads(), 1);
    }
}

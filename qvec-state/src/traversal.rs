//! Block traversal drivers
//!
//! Every kernel in the engine is expressed as a per-block function handed to
//! one of the drivers here. The drivers are the only code that knows how to
//! enumerate blocks: an update driver visits every block base and lets the
//! function mutate the amplitudes at the block indexes, a reduction driver
//! accumulates a complex scalar into worker-private `(re, im)` pairs that are
//! summed across workers at the end.
//!
//! Execution is parallel only when the state exceeds the configured qubit
//! threshold *and* more than one worker thread is configured; otherwise the
//! drivers iterate sequentially over ascending block bases, which keeps
//! reductions bit-exact.

use crate::indexing::{indexes, indexes_static};
use crate::state::QubitVector;
use num_complex::Complex64;
use rayon::prelude::*;

/// Raw view of the amplitude buffer shared across workers.
///
/// The update drivers guarantee that concurrently executing block functions
/// receive disjoint index sets, so writes through this view never alias. The
/// per-block function must not touch indexes outside its block.
#[derive(Clone, Copy)]
pub(crate) struct Amps {
    ptr: *mut Complex64,
    len: usize,
}

unsafe impl Send for Amps {}
unsafe impl Sync for Amps {}

impl Amps {
    #[inline]
    fn new(ptr: *mut Complex64, len: usize) -> Self {
        Self { ptr, len }
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> Complex64 {
        debug_assert!(i < self.len);
        unsafe { *self.ptr.add(i) }
    }

    #[inline]
    pub(crate) fn set(&self, i: usize, value: Complex64) {
        debug_assert!(i < self.len);
        unsafe { *self.ptr.add(i) = value }
    }

    #[inline]
    pub(crate) fn mul(&self, i: usize, factor: Complex64) {
        self.set(i, self.get(i) * factor);
    }

    #[inline]
    pub(crate) fn swap(&self, i: usize, j: usize) {
        let cache = self.get(i);
        self.set(i, self.get(j));
        self.set(j, cache);
    }
}

impl QubitVector {
    /// Worker pool to use for the current operation, if parallelism is active.
    #[inline]
    pub(crate) fn active_pool(&self) -> Option<&rayon::ThreadPool> {
        if self.num_qubits > self.parallel_threshold && self.parallel_threads > 1 {
            self.pool.as_ref()
        } else {
            None
        }
    }

    /// Visit every amplitude with its index.
    pub(crate) fn update_all<F>(&mut self, func: F)
    where
        F: Fn(usize, &mut Complex64) + Send + Sync,
    {
        let QubitVector {
            ref mut data,
            ref pool,
            num_qubits,
            parallel_threshold,
            parallel_threads,
            ..
        } = *self;
        let active = num_qubits > parallel_threshold && parallel_threads > 1;
        match pool {
            Some(pool) if active => pool.install(|| {
                data.as_mut_slice()
                    .par_iter_mut()
                    .enumerate()
                    .for_each(|(k, amp)| func(k, amp));
            }),
            _ => {
                for (k, amp) in data.as_mut_slice().iter_mut().enumerate() {
                    func(k, amp);
                }
            }
        }
    }

    /// Visit every block of the given qubits with a stack-allocated index
    /// array (`D = 2^N`, N known at compile time).
    pub(crate) fn update_blocks<const N: usize, const D: usize, F>(
        &mut self,
        qubits: &[usize; N],
        func: F,
    ) where
        F: Fn(&[usize; D], &Amps) + Sync,
    {
        let end = self.data_size >> N;
        let mut sorted = *qubits;
        sorted.sort_unstable();
        let amps = Amps::new(self.data.as_mut_ptr(), self.data_size);
        match self.active_pool() {
            Some(pool) => pool.install(|| {
                (0..end).into_par_iter().for_each(|k| {
                    let inds: [usize; D] = indexes_static(qubits, &sorted, k);
                    func(&inds, &amps);
                });
            }),
            None => {
                for k in 0..end {
                    let inds: [usize; D] = indexes_static(qubits, &sorted, k);
                    func(&inds, &amps);
                }
            }
        }
    }

    /// Visit every block of the given qubits with a heap-allocated index
    /// array (qubit count known only at runtime).
    pub(crate) fn update_blocks_dyn<F>(&mut self, qubits: &[usize], func: F)
    where
        F: Fn(&[usize], &Amps) + Sync,
    {
        let end = self.data_size >> qubits.len();
        let mut sorted = qubits.to_vec();
        sorted.sort_unstable();
        let amps = Amps::new(self.data.as_mut_ptr(), self.data_size);
        match self.active_pool() {
            Some(pool) => pool.install(|| {
                (0..end).into_par_iter().for_each(|k| {
                    let inds = indexes(qubits, &sorted, k);
                    func(&inds, &amps);
                });
            }),
            None => {
                for k in 0..end {
                    let inds = indexes(qubits, &sorted, k);
                    func(&inds, &amps);
                }
            }
        }
    }

    /// Reduce over every amplitude index into a complex scalar.
    ///
    /// Each worker accumulates into private `(re, im)` doubles; partial sums
    /// are added across workers with plain floating-point addition, so the
    /// result is bit-exact only in sequential mode.
    pub(crate) fn reduce_all<F>(&self, func: F) -> Complex64
    where
        F: Fn(usize, &mut f64, &mut f64) + Send + Sync,
    {
        match self.active_pool() {
            Some(pool) => pool.install(|| {
                let (re, im) = (0..self.data_size)
                    .into_par_iter()
                    .fold(
                        || (0.0_f64, 0.0_f64),
                        |mut acc, k| {
                            func(k, &mut acc.0, &mut acc.1);
                            acc
                        },
                    )
                    .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));
                Complex64::new(re, im)
            }),
            None => {
                let mut re = 0.0;
                let mut im = 0.0;
                for k in 0..self.data_size {
                    func(k, &mut re, &mut im);
                }
                Complex64::new(re, im)
            }
        }
    }

    /// Reduce over every block of the given qubits (compile-time block size).
    pub(crate) fn reduce_blocks<const N: usize, const D: usize, F>(
        &self,
        qubits: &[usize; N],
        func: F,
    ) -> Complex64
    where
        F: Fn(&[usize; D], &mut f64, &mut f64) + Send + Sync,
    {
        let end = self.data_size >> N;
        let mut sorted = *qubits;
        sorted.sort_unstable();
        match self.active_pool() {
            Some(pool) => pool.install(|| {
                let (re, im) = (0..end)
                    .into_par_iter()
                    .fold(
                        || (0.0_f64, 0.0_f64),
                        |mut acc, k| {
                            let inds: [usize; D] = indexes_static(qubits, &sorted, k);
                            func(&inds, &mut acc.0, &mut acc.1);
                            acc
                        },
                    )
                    .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));
                Complex64::new(re, im)
            }),
            None => {
                let mut re = 0.0;
                let mut im = 0.0;
                for k in 0..end {
                    let inds: [usize; D] = indexes_static(qubits, &sorted, k);
                    func(&inds, &mut re, &mut im);
                }
                Complex64::new(re, im)
            }
        }
    }

    /// Reduce over every block of the given qubits (runtime block size).
    pub(crate) fn reduce_blocks_dyn<F>(&self, qubits: &[usize], func: F) -> Complex64
    where
        F: Fn(&[usize], &mut f64, &mut f64) + Send + Sync,
    {
        let end = self.data_size >> qubits.len();
        let mut sorted = qubits.to_vec();
        sorted.sort_unstable();
        match self.active_pool() {
            Some(pool) => pool.install(|| {
                let (re, im) = (0..end)
                    .into_par_iter()
                    .fold(
                        || (0.0_f64, 0.0_f64),
                        |mut acc, k| {
                            let inds = indexes(qubits, &sorted, k);
                            func(&inds, &mut acc.0, &mut acc.1);
                            acc
                        },
                    )
                    .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));
                Complex64::new(re, im)
            }),
            None => {
                let mut re = 0.0;
                let mut im = 0.0;
                for k in 0..end {
                    let inds = indexes(qubits, &sorted, k);
                    func(&inds, &mut re, &mut im);
                }
                Complex64::new(re, im)
            }
        }
    }
}

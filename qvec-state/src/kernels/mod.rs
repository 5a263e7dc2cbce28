//! In-place operator application kernels
//!
//! `matrix` holds the dense / diagonal / permutation paths, `controlled` the
//! specialized multi-controlled gate family. Both dispatch to compile-time
//! block sizes for small qubit counts and fall back to heap-allocated blocks
//! otherwise.

mod controlled;
mod matrix;

//! Error types for statevector operations

use thiserror::Error;

/// Errors that can occur during statevector operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Invalid qubit index
    #[error("invalid qubit index {index} for {num_qubits}-qubit state")]
    InvalidQubitIndex { index: usize, num_qubits: usize },

    /// Requested qubit count exceeds the addressable maximum
    #[error("qubit count {requested} exceeds the supported maximum of {max}")]
    TooManyQubits { requested: usize, max: usize },

    /// Vector or matrix length does not match the expected dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Operation needs more qubits than were supplied
    #[error("operation requires at least {required} qubit(s), got {actual}")]
    NotEnoughQubits { required: usize, actual: usize },

    /// `revert` or `inner_product` called without a checkpoint
    #[error("checkpoint must exist for revert() or inner_product()")]
    MissingCheckpoint,

    /// Matrix expansion requested for an unsupported source size
    #[error("matrix expansion is not supported for {num_qubits}-qubit source operations")]
    UnsupportedExpansion { num_qubits: usize },

    /// Internal guard: a qubit ordering could not be reconciled
    #[error("qubit reordering failed: {src:?} cannot be permuted into {sorted:?}")]
    ReorderMismatch { src: Vec<usize>, sorted: Vec<usize> },

    /// Memory allocation error
    #[error("failed to allocate {size} bytes for amplitude storage")]
    AllocationError { size: usize },

    /// Worker pool construction failed
    #[error("failed to build worker pool: {reason}")]
    WorkerPool { reason: String },
}

/// Result type for statevector operations
pub type Result<T> = std::result::Result<T, StateError>;

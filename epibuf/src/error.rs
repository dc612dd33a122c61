//! Errors in the library.
use thiserror::Error;

/// Errors raised by [`EpisodicBuffer`](crate::episodic_buffer::EpisodicBuffer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EpisodicBufferError {
    /// Field sets or field lengths disagree across episodes or buffers.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The operation is not possible in the current state of the buffer.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Iteration or sampling was requested on a buffer with no steps.
    #[error("The buffer has no steps")]
    EmptyBuffer,

    /// An explicit index subset refers to a step outside the buffer.
    #[error("Index {index} is out of range for a buffer with {num_steps} steps")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,

        /// Number of steps in the buffer.
        num_steps: usize,
    },

    /// A per-call parameter is not acceptable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type of the buffer operations.
pub type Result<T> = std::result::Result<T, EpisodicBufferError>;

//! Error types for the LSH sampler.

use thiserror::Error;

/// The main error type for index construction and sampling.
#[derive(Error, Debug)]
pub enum SamplerError {
    /// Invalid configuration (bad `k`, `L`, bucket width, strategy name, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Empty input where at least one element is required.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Points of differing dimension handed to a Euclidean family.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Dimension fixed by the hash family.
        expected: usize,
        /// Dimension of the offending point.
        found: usize,
    },

    /// The index or sampler state is inconsistent. Not recoverable.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for sampler operations.
pub type Result<T> = std::result::Result<T, SamplerError>;

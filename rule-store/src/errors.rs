//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rule-store operations.
#[derive(Debug, Error)]
pub enum RuleStoreError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality across records.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// A stored payload could not be mapped back to a rule.
    #[error("payload error: {0}")]
    Payload(String),
}

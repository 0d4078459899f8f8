//! Unified error type for the crate.

use thiserror::Error;

/// Errors from document loading and indexing.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Filesystem errors while reading a source document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF byte extraction failed.
    #[error("pdf extraction error: {0}")]
    Pdf(String),
}

//! Error types for the snapshot store.

use std::path::PathBuf;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while writing or managing snapshots.
///
/// Read paths never surface these: a missing or undecodable snapshot loads
/// as an empty binding set.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to write a snapshot blob.
    #[error("failed to write snapshot {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Failed to encode the binding set.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

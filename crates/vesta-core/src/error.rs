//! Error types for vesta-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for vesta-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vesta-core.
///
/// Runtime failures inside submitted session code are *not* errors at this
/// level — they come back as the `error` field of an `ExecutionResult`.
#[derive(Debug, Error)]
pub enum Error {
    /// No tabular variable with this name is registered.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// Export format string not recognized.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Export path resolves outside the sandbox data directory.
    #[error("path escapes data directory: {}", path.display())]
    PathEscapesSandbox { path: PathBuf },

    /// Table operation failed.
    #[error("table error: {0}")]
    Table(#[from] polars::error::PolarsError),

    /// Figure rasterization failed.
    #[error("render error: {0}")]
    Render(#[from] image::ImageError),

    /// Spreadsheet writer failed.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for contactpipe.
//!
//! Library crates use [`ContactPipeError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all contactpipe operations.
#[derive(Debug, thiserror::Error)]
pub enum ContactPipeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Spreadsheet fetch failed (auth, network, quota). Fatal to an ingest run.
    #[error("source error: {0}")]
    Source(String),

    /// A cell value could not be parsed (e.g., a date of birth). Callers
    /// recover locally; this never aborts a run.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Intermediate store error (serialization, corrupt file).
    #[error("store error: {0}")]
    Store(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad batch size, malformed record set).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// CRM upload error outside the per-batch outcome reporting
    /// (e.g., the HTTP client could not be built).
    #[error("upload error: {0}")]
    Upload(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContactPipeError>;

impl ContactPipeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

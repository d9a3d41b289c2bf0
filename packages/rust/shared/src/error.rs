//! Error types for AssessRank.
//!
//! Library crates use [`AssessRankError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all AssessRank operations.
#[derive(Debug, thiserror::Error)]
pub enum AssessRankError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to the catalog site or embedding backend.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input rejected at the consuming boundary (short query, bad `top_k`).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Catalog could not be read or written.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Evaluation data could not be read or the report could not be written.
    #[error("evaluation error: {0}")]
    Evaluation(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AssessRankError>;

impl AssessRankError {
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

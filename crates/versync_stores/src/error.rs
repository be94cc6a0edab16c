//! Error types for store strategies and the update engine

use std::io;
use thiserror::Error;

/// Reason a single store could not be read, transformed or written.
///
/// Every variant is reported as data inside a [`crate::BatchResult`]; the
/// engine never propagates these past its boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Field {locator} not found in {path}")]
    FieldNotFound { path: String, locator: String },

    #[error("Pattern /{pattern}/ does not match the content of {path}")]
    PatternNotFound { path: String, pattern: String },

    #[error("Cannot determine module style for {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short, stable name of the failure kind (used in JSON reports).
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Parse { .. } => "parse",
            StoreError::FieldNotFound { .. } => "field_not_found",
            StoreError::PatternNotFound { .. } => "pattern_not_found",
            StoreError::UnsupportedFormat { .. } => "unsupported_format",
            StoreError::Io { .. } => "io",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;

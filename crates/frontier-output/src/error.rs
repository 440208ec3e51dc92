//! Error types for report assembly and export.

use thiserror::Error;

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

/// Errors that can occur while assembling or exporting a report.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A portfolio failed the weight invariants; the report is not emitted.
    #[error("Invariant violation in {context}: {detail}")]
    InvariantViolation {
        /// Which part of the report the offending entry belongs to
        context: String,
        /// What was wrong with it
        detail: String,
    },

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialized output was not valid UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OutputError {
    pub(crate) fn invariant(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            context: context.into(),
            detail: detail.into(),
        }
    }
}

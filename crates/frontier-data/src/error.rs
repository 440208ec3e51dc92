//! Error types for data operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading prices or computing returns.
#[derive(Debug, Error)]
pub enum DataError {
    /// Too few aligned observations to compute returns
    #[error("Insufficient data: need at least {required} aligned dates, got {actual}")]
    InsufficientData {
        /// Required number of aligned dates
        required: usize,
        /// Actual number of aligned dates
        actual: usize,
    },

    /// A zero, negative or infinite price was found
    #[error("Degenerate price for {ticker} on {date}: {price}")]
    DegenerateAsset {
        /// Ticker carrying the bad price
        ticker: String,
        /// Date of the bad price
        date: NaiveDate,
        /// The offending value
        price: f64,
    },

    /// No tickers were supplied
    #[error("No assets supplied")]
    NoAssets,

    /// The same ticker appeared twice
    #[error("Duplicate ticker: {0}")]
    DuplicateTicker(String),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for portfolio construction.

use frontier_risk::EstimationError;
use thiserror::Error;

/// Result type for portfolio operations.
pub type Result<T> = std::result::Result<T, OptimizationError>;

/// Errors that can occur while sampling or optimizing portfolios.
///
/// Infeasible targets and ill-conditioning are not errors; they are reported
/// as [`crate::Diagnostic`] values.
#[derive(Debug, Error)]
pub enum OptimizationError {
    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The moment estimate has no assets
    #[error("No assets to optimize")]
    NoAssets,

    /// Linear algebra failure
    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),
}

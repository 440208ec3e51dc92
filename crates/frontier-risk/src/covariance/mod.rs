//! Asset covariance estimation
//!
//! Provides the sample covariance estimator and the symmetric-matrix
//! utilities used to invert (possibly ill-conditioned) covariance matrices.

pub mod sample;
pub mod utils;

pub use sample::SampleCovarianceEstimator;
pub use utils::{
    EigenDecomposition, SymmetricInverse, cholesky, condition_number, jacobi_eigendecomp,
    regularized_inverse,
};

use ndarray::Array2;
use thiserror::Error;

/// Errors that can occur during moment and covariance estimation
#[derive(Debug, Error)]
pub enum EstimationError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Matrix is not symmetric
    #[error("Matrix is not symmetric: |a[{row},{col}] - a[{col},{row}]| = {difference}")]
    NotSymmetric {
        /// Row of the worst asymmetry
        row: usize,
        /// Column of the worst asymmetry
        col: usize,
        /// Absolute difference between the mirrored entries
        difference: f64,
    },

    /// Input contains NaN or infinite values
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from asset returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a time period and each column is an asset
    ///
    /// # Returns
    /// * Estimated covariance matrix (N x N where N is number of assets)
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, EstimationError>;
}

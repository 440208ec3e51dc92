//! Moment estimation
//!
//! Computes the inputs of the mean-variance model from aligned returns:
//! - μ[i] = arithmetic mean of asset i's returns
//! - Σ[i,j] = Bessel-corrected sample covariance of assets i and j
//!
//! Portfolio statistics for a weight vector w are then:
//! E[R_p] = w^T * μ
//! σ_p = sqrt(w^T * Σ * w)

use crate::covariance::{
    CovarianceEstimator, EstimationError, SampleCovarianceEstimator, condition_number,
};
use crate::covariance::sample::SampleCovarianceConfig;
use frontier_data::ReturnSeries;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Absolute tolerance for the symmetry check on supplied covariance matrices.
const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Moment estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentConfig {
    /// Minimum number of return observations (default: 2)
    pub min_observations: usize,

    /// Reject samples with fewer observations than assets (default: false).
    ///
    /// When disabled such samples produce a rank-deficient covariance matrix,
    /// which the optimizer handles through regularization.
    pub require_full_rank: bool,
}

impl Default for MomentConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
            require_full_rank: false,
        }
    }
}

/// Expected returns and covariance matrix of a set of assets.
///
/// Immutable once built; Σ is guaranteed square, symmetric and sized to μ.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentEstimate {
    tickers: Vec<String>,
    expected_returns: Array1<f64>,
    covariance: Array2<f64>,
    n_observations: usize,
}

impl MomentEstimate {
    /// Build an estimate from known moments.
    ///
    /// # Arguments
    /// * `tickers` - Asset names
    /// * `expected_returns` - μ, one entry per asset
    /// * `covariance` - Σ (N x N), must be symmetric
    /// * `n_observations` - Number of observations the moments came from
    pub fn new(
        tickers: Vec<String>,
        expected_returns: Array1<f64>,
        covariance: Array2<f64>,
        n_observations: usize,
    ) -> Result<Self, EstimationError> {
        let n = tickers.len();
        if expected_returns.len() != n {
            return Err(EstimationError::DimensionMismatch {
                expected: n,
                actual: expected_returns.len(),
            });
        }
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(EstimationError::DimensionMismatch {
                expected: n,
                actual: covariance.nrows().max(covariance.ncols()),
            });
        }
        if expected_returns.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::NonFinite("expected returns"));
        }
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::NonFinite("covariance"));
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let difference = (covariance[[i, j]] - covariance[[j, i]]).abs();
                if difference > SYMMETRY_TOLERANCE {
                    return Err(EstimationError::NotSymmetric {
                        row: i,
                        col: j,
                        difference,
                    });
                }
            }
        }

        Ok(Self {
            tickers,
            expected_returns,
            covariance,
            n_observations,
        })
    }

    /// Asset tickers, in the order of μ and Σ.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Expected returns μ.
    pub const fn expected_returns(&self) -> &Array1<f64> {
        &self.expected_returns
    }

    /// Covariance matrix Σ.
    pub const fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Number of assets (N).
    pub fn n_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Number of observations the estimate is based on (T).
    pub const fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Standalone volatility of a single asset, sqrt(Σ[i,i]).
    pub fn asset_risk(&self, index: usize) -> f64 {
        self.covariance[[index, index]].max(0.0).sqrt()
    }

    /// Portfolio expected return w^T * μ.
    pub fn portfolio_return(&self, weights: &[f64]) -> f64 {
        weights
            .iter()
            .zip(self.expected_returns.iter())
            .map(|(w, mu)| w * mu)
            .sum()
    }

    /// Portfolio variance w^T * Σ * w.
    pub fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        let n = weights.len().min(self.n_assets());
        let mut variance = 0.0;
        for i in 0..n {
            if weights[i] == 0.0 {
                continue;
            }
            for j in 0..n {
                variance += weights[i] * weights[j] * self.covariance[[i, j]];
            }
        }
        variance
    }

    /// Portfolio volatility sqrt(w^T * Σ * w), with rounding noise below zero clamped.
    pub fn portfolio_risk(&self, weights: &[f64]) -> f64 {
        self.portfolio_variance(weights).max(0.0).sqrt()
    }

    /// Ratio of the largest to smallest eigenvalue of Σ.
    pub fn condition_number(&self) -> f64 {
        condition_number(&self.covariance)
    }

    /// Expected returns restricted to a set of asset indices.
    pub fn sub_returns(&self, indices: &[usize]) -> Array1<f64> {
        indices.iter().map(|&i| self.expected_returns[i]).collect()
    }

    /// Covariance restricted to a set of asset indices.
    pub fn sub_covariance(&self, indices: &[usize]) -> Array2<f64> {
        let k = indices.len();
        Array2::from_shape_fn((k, k), |(a, b)| self.covariance[[indices[a], indices[b]]])
    }
}

/// Estimates μ and Σ from aligned return series
#[derive(Debug, Default)]
pub struct MomentEstimator {
    config: MomentConfig,
}

impl MomentEstimator {
    /// Create a new moment estimator
    pub const fn new(config: MomentConfig) -> Self {
        Self { config }
    }

    /// Estimator configuration
    pub const fn config(&self) -> &MomentConfig {
        &self.config
    }

    /// Estimate moments from an aligned return series
    pub fn estimate(&self, series: &ReturnSeries) -> Result<MomentEstimate, EstimationError> {
        self.estimate_matrix(series.tickers().to_vec(), series.returns())
    }

    /// Estimate moments from a raw return matrix (T x N)
    ///
    /// # Errors
    /// * `InsufficientData` if T is below `min_observations` (never below 2), or
    ///   below N when `require_full_rank` is set
    pub fn estimate_matrix(
        &self,
        tickers: Vec<String>,
        returns: &Array2<f64>,
    ) -> Result<MomentEstimate, EstimationError> {
        let (n_periods, n_assets) = returns.dim();
        if n_assets != tickers.len() {
            return Err(EstimationError::DimensionMismatch {
                expected: tickers.len(),
                actual: n_assets,
            });
        }

        let required = self.config.min_observations.max(2);
        if n_periods < required {
            return Err(EstimationError::InsufficientData {
                required,
                actual: n_periods,
            });
        }
        if self.config.require_full_rank && n_periods < n_assets {
            return Err(EstimationError::InsufficientData {
                required: n_assets,
                actual: n_periods,
            });
        }

        let estimator = SampleCovarianceEstimator::new(SampleCovarianceConfig {
            min_observations: required,
        })?;
        let covariance = estimator.estimate(returns)?;
        let expected_returns = SampleCovarianceEstimator::means(returns);

        debug!(
            assets = n_assets,
            observations = n_periods,
            "estimated moments"
        );

        MomentEstimate::new(tickers, expected_returns, covariance, n_periods)
    }
}

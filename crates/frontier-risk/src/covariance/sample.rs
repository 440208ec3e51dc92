//! Sample covariance estimator
//!
//! Unbiased (Bessel-corrected) pairwise covariance:
//! Cov(i,j) = Σ_t (r_{i,t} - r̄_i)(r_{j,t} - r̄_j) / (T - 1)
//!
//! Every entry is computed from the joint observations of the pair, so the
//! observed correlation structure is preserved exactly.

use super::{CovarianceEstimator, EstimationError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Sample covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleCovarianceConfig {
    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,
}

impl Default for SampleCovarianceConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
        }
    }
}

/// Bessel-corrected sample covariance estimator
#[derive(Debug, Default)]
pub struct SampleCovarianceEstimator {
    config: SampleCovarianceConfig,
}

impl SampleCovarianceEstimator {
    /// Create a new estimator with the given configuration
    pub fn new(config: SampleCovarianceConfig) -> Result<Self, EstimationError> {
        if config.min_observations < 2 {
            return Err(EstimationError::InvalidParameter(format!(
                "min_observations must be at least 2, got {}",
                config.min_observations
            )));
        }
        Ok(Self { config })
    }

    /// Column means of the return matrix
    pub fn means(returns: &Array2<f64>) -> Array1<f64> {
        returns
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(returns.ncols()))
    }
}

impl CovarianceEstimator for SampleCovarianceEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, EstimationError> {
        let (n_periods, n_assets) = returns.dim();

        if n_periods < self.config.min_observations {
            return Err(EstimationError::InsufficientData {
                required: self.config.min_observations,
                actual: n_periods,
            });
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(EstimationError::NonFinite("returns"));
        }

        let means = Self::means(returns);
        let denom = (n_periods - 1) as f64;
        let mut cov = Array2::<f64>::zeros((n_assets, n_assets));

        for i in 0..n_assets {
            for j in i..n_assets {
                let sum: f64 = returns
                    .column(i)
                    .iter()
                    .zip(returns.column(j).iter())
                    .map(|(ri, rj)| (ri - means[i]) * (rj - means[j]))
                    .sum();
                let value = sum / denom;
                cov[[i, j]] = value;
                cov[[j, i]] = value;
            }
        }

        Ok(cov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_min_observations() {
        let config = SampleCovarianceConfig {
            min_observations: 1,
        };
        assert!(SampleCovarianceEstimator::new(config).is_err());
    }

    #[test]
    fn test_insufficient_data() {
        let estimator = SampleCovarianceEstimator::default();
        let returns = Array2::<f64>::zeros((1, 3));
        assert!(matches!(
            estimator.estimate(&returns),
            Err(EstimationError::InsufficientData {
                required: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_bessel_corrected_covariance() {
        let estimator = SampleCovarianceEstimator::default();
        let returns = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 2.0, 4.0, 3.0, 6.0]).unwrap();

        let cov = estimator.estimate(&returns).unwrap();

        // Deviations: a = [-1, 0, 1], b = [-2, 0, 2]
        assert_relative_eq!(cov[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[1, 0]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[1, 1]], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_correlation_is_preserved() {
        let estimator = SampleCovarianceEstimator::default();
        let returns =
            Array2::from_shape_vec((4, 2), vec![0.01, -0.01, -0.02, 0.02, 0.03, -0.03, 0.0, 0.0])
                .unwrap();

        let cov = estimator.estimate(&returns).unwrap();
        let corr = cov[[0, 1]] / (cov[[0, 0]] * cov[[1, 1]]).sqrt();
        assert_relative_eq!(corr, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_returns_rejected() {
        let estimator = SampleCovarianceEstimator::default();
        let returns = Array2::from_shape_vec((2, 1), vec![0.01, f64::NAN]).unwrap();
        assert!(matches!(
            estimator.estimate(&returns),
            Err(EstimationError::NonFinite(_))
        ));
    }
}

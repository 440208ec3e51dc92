//! Portfolio value type

use frontier_risk::MomentEstimate;
use serde::{Deserialize, Serialize};

/// Tolerance for the sum-to-one and non-negativity invariants of weights.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// A long-only portfolio evaluated against a moment estimate.
///
/// Weights are indexed like the tickers of the [`MomentEstimate`] the portfolio
/// was evaluated with. The statistics are derived once at construction:
/// `expected_return = w^T * μ` and `risk = sqrt(w^T * Σ * w)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    weights: Vec<f64>,
    expected_return: f64,
    risk: f64,
}

impl Portfolio {
    /// Evaluate a weight vector.
    pub fn evaluate(weights: Vec<f64>, moments: &MomentEstimate) -> Self {
        let expected_return = moments.portfolio_return(&weights);
        let risk = moments.portfolio_risk(&weights);
        Self {
            weights,
            expected_return,
            risk,
        }
    }

    /// The single-asset portfolio holding only asset `index`.
    pub fn asset(index: usize, moments: &MomentEstimate) -> Self {
        let mut weights = vec![0.0; moments.n_assets()];
        weights[index] = 1.0;
        Self {
            weights,
            expected_return: moments.expected_returns()[index],
            risk: moments.asset_risk(index),
        }
    }

    /// Weights in asset order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Expected (per-period) return.
    pub const fn expected_return(&self) -> f64 {
        self.expected_return
    }

    /// Volatility (per-period standard deviation of returns).
    pub const fn risk(&self) -> f64 {
        self.risk
    }

    /// Sum of all weights.
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Smallest weight, or `0.0` for an empty portfolio.
    pub fn min_weight(&self) -> f64 {
        self.weights.iter().cloned().reduce(f64::min).unwrap_or(0.0)
    }

    /// Whether weights sum to one and are non-negative within `tolerance`.
    pub fn is_valid(&self, tolerance: f64) -> bool {
        (self.weight_sum() - 1.0).abs() <= tolerance && self.min_weight() >= -tolerance
    }

    /// Whether `self` is at least as good as `other` on both risk and return.
    pub fn dominates(&self, other: &Self) -> bool {
        self.risk <= other.risk && self.expected_return >= other.expected_return
    }
}

//! Efficient frontier optimization
//!
//! For each target return on an evenly spaced grid between the lowest and
//! highest expected asset return, the optimizer finds the long-only portfolio
//! with minimum variance using a primal active-set solver. The solved
//! portfolios are then reduced to their non-dominated subset.
//!
//! Targets outside the achievable range and targets whose solve does not
//! converge are skipped and reported as [`Diagnostic`]s; they never abort the
//! run.

mod active_set;
mod pareto;

pub use pareto::{empirical_frontier, pareto_filter};

use crate::error::{OptimizationError, Result};
use crate::portfolio::Portfolio;
use active_set::{ActiveSetFailure, ActiveSetSettings};
use frontier_risk::MomentEstimate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Relative slack on the achievable return range.
const RANGE_TOLERANCE: f64 = 1e-12;

/// Frontier optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// Number of target returns on the grid (default: 50)
    pub grid_points: usize,

    /// Relative eigenvalue floor used when a covariance block is near-singular
    /// (default: 1e-10)
    pub regularization: f64,

    /// Condition number of Σ above which the run is flagged (default: 1e10)
    pub max_condition_number: f64,

    /// Tolerance of the weight invariants (default: 1e-9)
    pub weight_tolerance: f64,

    /// Active-set iteration cap per target (default: 20 * N + 20)
    pub max_iterations: Option<usize>,

    /// Solve grid targets on the rayon pool (default: true)
    pub parallel: bool,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            grid_points: 50,
            regularization: 1e-10,
            max_condition_number: 1e10,
            weight_tolerance: 1e-9,
            max_iterations: None,
            parallel: true,
        }
    }
}

impl FrontierConfig {
    /// Check the configuration for invalid values
    pub fn validate(&self) -> Result<()> {
        if self.grid_points < 2 {
            return Err(OptimizationError::InvalidConfig(format!(
                "grid_points must be at least 2, got {}",
                self.grid_points
            )));
        }
        if !(self.regularization > 0.0 && self.regularization < 1.0) {
            return Err(OptimizationError::InvalidConfig(format!(
                "regularization must be in (0, 1), got {}",
                self.regularization
            )));
        }
        if self.max_condition_number.is_nan() || self.max_condition_number < 1.0 {
            return Err(OptimizationError::InvalidConfig(format!(
                "max_condition_number must be at least 1, got {}",
                self.max_condition_number
            )));
        }
        if !(self.weight_tolerance > 0.0 && self.weight_tolerance < 1.0) {
            return Err(OptimizationError::InvalidConfig(format!(
                "weight_tolerance must be in (0, 1), got {}",
                self.weight_tolerance
            )));
        }
        if self.max_iterations == Some(0) {
            return Err(OptimizationError::InvalidConfig(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Iteration cap for a problem with `n_assets` assets
    pub fn iteration_limit(&self, n_assets: usize) -> usize {
        self.max_iterations.unwrap_or(20 * n_assets + 20)
    }
}

/// A non-fatal condition encountered while building the frontier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Target return outside the achievable range; skipped
    InfeasibleTarget {
        /// Requested return
        target: f64,
        /// Lowest achievable return
        min: f64,
        /// Highest achievable return
        max: f64,
    },

    /// Active-set loop did not converge; target skipped
    IterationLimit {
        /// Requested return
        target: f64,
        /// Iterations spent
        iterations: usize,
    },

    /// Σ is ill-conditioned; solves may be regularized
    NearSingularCovariance {
        /// Ratio of the largest to smallest eigenvalue
        condition_number: f64,
    },
}

impl Diagnostic {
    /// Whether the diagnostic caused a grid target to be dropped
    pub const fn is_skipped_target(&self) -> bool {
        matches!(
            self,
            Self::InfeasibleTarget { .. } | Self::IterationLimit { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InfeasibleTarget { target, min, max } => write!(
                f,
                "target return {} outside achievable range [{}, {}]",
                target, min, max
            ),
            Self::IterationLimit { target, iterations } => write!(
                f,
                "target return {} did not converge in {} iterations",
                target, iterations
            ),
            Self::NearSingularCovariance { condition_number } => write!(
                f,
                "covariance matrix is near-singular (condition number {:.3e})",
                condition_number
            ),
        }
    }
}

/// Numerical health of a frontier run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontierDiagnostics {
    /// Condition number of Σ
    pub condition_number: f64,
    /// Whether the condition number exceeded the configured maximum
    pub near_singular: bool,
    /// Number of reduced solves that needed the regularized inverse
    pub regularized_solves: usize,
    /// Non-fatal conditions, in grid order after any covariance warning
    pub diagnostics: Vec<Diagnostic>,
}

impl FrontierDiagnostics {
    /// Whether any solve was regularized or Σ was flagged
    pub const fn regularized(&self) -> bool {
        self.near_singular || self.regularized_solves > 0
    }

    /// Number of grid targets that produced no portfolio
    pub fn skipped_targets(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.is_skipped_target())
            .count()
    }
}

/// Minimum-variance portfolios ordered by strictly increasing risk and return
///
/// Deserialized points pass through [`pareto_filter`] like any other input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FrontierPoints")]
pub struct Frontier {
    points: Vec<Portfolio>,
}

#[derive(Deserialize)]
struct FrontierPoints {
    points: Vec<Portfolio>,
}

impl From<FrontierPoints> for Frontier {
    fn from(raw: FrontierPoints) -> Self {
        Self::from_portfolios(raw.points)
    }
}

impl Frontier {
    /// Build a frontier from arbitrary portfolios, keeping the non-dominated ones
    pub fn from_portfolios(portfolios: Vec<Portfolio>) -> Self {
        Self {
            points: pareto_filter(portfolios),
        }
    }

    /// Frontier points, by ascending risk
    pub fn points(&self) -> &[Portfolio] {
        &self.points
    }

    /// Iterate over the points by ascending risk
    pub fn iter(&self) -> std::slice::Iter<'_, Portfolio> {
        self.points.iter()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the frontier has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Take ownership of the points
    pub fn into_points(self) -> Vec<Portfolio> {
        self.points
    }
}

impl<'a> IntoIterator for &'a Frontier {
    type Item = &'a Portfolio;
    type IntoIter = std::slice::Iter<'a, Portfolio>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Frontier together with the diagnostics gathered while building it
#[derive(Debug, Clone)]
pub struct FrontierResult {
    /// The efficient frontier
    pub frontier: Frontier,
    /// Non-fatal conditions and numerical health
    pub diagnostics: FrontierDiagnostics,
}

/// Outcome of one grid target
enum TargetOutcome {
    Solved {
        portfolio: Portfolio,
        regularized_solves: usize,
    },
    Skipped(Diagnostic),
}

/// Long-only mean-variance frontier optimizer
#[derive(Debug, Default)]
pub struct FrontierOptimizer {
    config: FrontierConfig,
}

impl FrontierOptimizer {
    /// Create an optimizer, validating its configuration
    pub fn new(config: FrontierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Optimizer configuration
    pub const fn config(&self) -> &FrontierConfig {
        &self.config
    }

    /// Achievable range of long-only target returns, `[min μ, max μ]`
    pub fn achievable_range(moments: &MomentEstimate) -> Option<(f64, f64)> {
        let mu = moments.expected_returns();
        if mu.is_empty() {
            return None;
        }
        let min = mu.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = mu.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    /// Evenly spaced target returns from `min μ` to `max μ`, both inclusive
    pub fn target_grid(&self, moments: &MomentEstimate) -> Vec<f64> {
        let Some((min, max)) = Self::achievable_range(moments) else {
            return Vec::new();
        };
        let g = self.config.grid_points;
        let span = max - min;
        let mut grid: Vec<f64> = (0..g)
            .map(|k| min + span * k as f64 / (g - 1) as f64)
            .collect();
        if let Some(last) = grid.last_mut() {
            *last = max;
        }
        grid
    }

    /// Compute the efficient frontier over the configured grid
    pub fn optimize(&self, moments: &MomentEstimate) -> Result<FrontierResult> {
        let grid = self.target_grid(moments);
        self.optimize_targets(moments, &grid)
    }

    /// Compute the efficient frontier over caller-supplied target returns
    ///
    /// Targets outside the achievable range are skipped with an
    /// [`Diagnostic::InfeasibleTarget`].
    pub fn optimize_targets(
        &self,
        moments: &MomentEstimate,
        targets: &[f64],
    ) -> Result<FrontierResult> {
        if moments.n_assets() == 0 {
            return Err(OptimizationError::NoAssets);
        }

        let mut diagnostics = FrontierDiagnostics {
            condition_number: moments.condition_number(),
            ..Default::default()
        };
        let condition_number = diagnostics.condition_number;
        if condition_number.is_nan() || condition_number > self.config.max_condition_number {
            let diagnostic = Diagnostic::NearSingularCovariance { condition_number };
            warn!(
                condition_number,
                max = self.config.max_condition_number,
                "{}",
                diagnostic
            );
            diagnostics.near_singular = true;
            diagnostics.diagnostics.push(diagnostic);
        }

        let outcomes: Vec<Result<TargetOutcome>> = if self.config.parallel {
            targets
                .par_iter()
                .map(|&target| self.solve_one(moments, target))
                .collect()
        } else {
            targets
                .iter()
                .map(|&target| self.solve_one(moments, target))
                .collect()
        };

        let mut solved = Vec::with_capacity(targets.len());
        for outcome in outcomes {
            match outcome? {
                TargetOutcome::Solved {
                    portfolio,
                    regularized_solves,
                } => {
                    diagnostics.regularized_solves += regularized_solves;
                    solved.push(portfolio);
                }
                TargetOutcome::Skipped(diagnostic) => {
                    warn!("{}", diagnostic);
                    diagnostics.diagnostics.push(diagnostic);
                }
            }
        }

        let n_solved = solved.len();
        let frontier = Frontier::from_portfolios(solved);

        debug!(
            targets = targets.len(),
            solved = n_solved,
            frontier = frontier.len(),
            regularized_solves = diagnostics.regularized_solves,
            "optimized frontier"
        );

        Ok(FrontierResult {
            frontier,
            diagnostics,
        })
    }

    /// Minimum-variance long-only portfolio for a single target return
    ///
    /// Returns `None` when the target is infeasible or the solve does not
    /// converge.
    pub fn solve_target(&self, moments: &MomentEstimate, target: f64) -> Result<Option<Portfolio>> {
        if moments.n_assets() == 0 {
            return Err(OptimizationError::NoAssets);
        }
        Ok(match self.solve_one(moments, target)? {
            TargetOutcome::Solved { portfolio, .. } => Some(portfolio),
            TargetOutcome::Skipped(_) => None,
        })
    }

    fn solve_one(&self, moments: &MomentEstimate, target: f64) -> Result<TargetOutcome> {
        let Some((min, max)) = Self::achievable_range(moments) else {
            return Err(OptimizationError::NoAssets);
        };
        let slack = RANGE_TOLERANCE * min.abs().max(max.abs()).max(f64::MIN_POSITIVE);
        if !(target >= min - slack && target <= max + slack) {
            return Ok(TargetOutcome::Skipped(Diagnostic::InfeasibleTarget {
                target,
                min,
                max,
            }));
        }
        let clamped = target.clamp(min, max);

        let settings = ActiveSetSettings {
            regularization: self.config.regularization,
            max_iterations: self.config.iteration_limit(moments.n_assets()),
        };

        match active_set::solve_target(moments, clamped, settings) {
            Ok(solution) => Ok(TargetOutcome::Solved {
                portfolio: Portfolio::evaluate(solution.weights, moments),
                regularized_solves: solution.regularized_solves,
            }),
            Err(ActiveSetFailure::Infeasible) => {
                Ok(TargetOutcome::Skipped(Diagnostic::InfeasibleTarget {
                    target,
                    min,
                    max,
                }))
            }
            Err(ActiveSetFailure::IterationLimit(iterations)) => {
                Ok(TargetOutcome::Skipped(Diagnostic::IterationLimit {
                    target,
                    iterations,
                }))
            }
            Err(ActiveSetFailure::Estimation(err)) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::WEIGHT_TOLERANCE;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::{Array2, array};
    use rstest::rstest;

    fn two_assets() -> MomentEstimate {
        // μ = [0.001, 0.002], σ = [0.01, 0.02], ρ = 0.2
        MomentEstimate::new(
            vec!["A".into(), "B".into()],
            array![0.001, 0.002],
            array![[1.0e-4, 4.0e-5], [4.0e-5, 4.0e-4]],
            250,
        )
        .unwrap()
    }

    fn four_assets() -> MomentEstimate {
        MomentEstimate::new(
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            array![0.0008, 0.0012, 0.0015, 0.0010],
            array![
                [1.0e-4, 3.0e-5, 2.0e-5, 1.0e-5],
                [3.0e-5, 2.25e-4, 6.0e-5, 2.0e-5],
                [2.0e-5, 6.0e-5, 4.0e-4, 3.0e-5],
                [1.0e-5, 2.0e-5, 3.0e-5, 1.44e-4]
            ],
            250,
        )
        .unwrap()
    }

    fn optimizer() -> FrontierOptimizer {
        FrontierOptimizer::new(FrontierConfig::default()).unwrap()
    }

    fn assert_frontier_invariants(frontier: &Frontier, moments: &MomentEstimate) {
        for p in frontier {
            assert!(p.is_valid(WEIGHT_TOLERANCE));
            assert!(p.weights().iter().all(|&w| w >= -WEIGHT_TOLERANCE));
            assert_abs_diff_eq!(
                p.expected_return(),
                moments.portfolio_return(p.weights()),
                epsilon = 1e-15
            );
            assert_abs_diff_eq!(p.risk(), moments.portfolio_risk(p.weights()), epsilon = 1e-15);
        }
        for pair in frontier.points().windows(2) {
            assert!(pair[1].risk() > pair[0].risk());
            assert!(!pair[0].dominates(&pair[1]));
            assert!(!pair[1].dominates(&pair[0]));
        }
    }

    #[test]
    fn test_frontier_config_default() {
        let config = FrontierConfig::default();
        assert_eq!(config.grid_points, 50);
        assert_eq!(config.regularization, 1e-10);
        assert_eq!(config.max_condition_number, 1e10);
        assert_eq!(config.iteration_limit(4), 100);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(FrontierConfig { grid_points: 1, ..Default::default() })]
    #[case(FrontierConfig { regularization: 0.0, ..Default::default() })]
    #[case(FrontierConfig { regularization: 1.0, ..Default::default() })]
    #[case(FrontierConfig { regularization: f64::NAN, ..Default::default() })]
    #[case(FrontierConfig { max_condition_number: 0.5, ..Default::default() })]
    #[case(FrontierConfig { weight_tolerance: 0.0, ..Default::default() })]
    #[case(FrontierConfig { max_iterations: Some(0), ..Default::default() })]
    fn test_invalid_config_rejected(#[case] config: FrontierConfig) {
        assert!(matches!(
            FrontierOptimizer::new(config),
            Err(OptimizationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_target_grid_spans_asset_returns() {
        let optimizer = FrontierOptimizer::new(FrontierConfig {
            grid_points: 5,
            ..Default::default()
        })
        .unwrap();
        let grid = optimizer.target_grid(&two_assets());

        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0], 0.001);
        assert_eq!(grid[4], 0.002);
        assert_abs_diff_eq!(grid[2], 0.0015, epsilon = 1e-18);
    }

    #[test]
    fn test_two_asset_minimum_variance_matches_hand_calculation() {
        let m = two_assets();
        // w_A = (σ_B² - σ_AB) / (σ_A² + σ_B² - 2σ_AB) = 3.6e-4 / 4.2e-4
        let gmv_return = 0.008 / 7.0;
        let p = optimizer().solve_target(&m, gmv_return).unwrap().unwrap();

        assert_relative_eq!(p.weights()[0], 6.0 / 7.0, max_relative = 1e-10);
        assert_relative_eq!(p.weights()[1], 1.0 / 7.0, max_relative = 1e-10);
        // σ² = (σ_A²σ_B² - σ_AB²) / 4.2e-4 = 3.84e-8 / 4.2e-4
        assert_relative_eq!(p.risk(), (3.84e-8_f64 / 4.2e-4).sqrt(), max_relative = 1e-10);
    }

    #[test]
    fn test_two_asset_frontier_matches_analytic_curve() {
        let m = two_assets();
        let result = optimizer().optimize(&m).unwrap();

        // Σ^-1 entries from det = 3.84e-8
        let det = 3.84e-8;
        let (i11, i12, i22) = (4.0e-4 / det, -4.0e-5 / det, 1.0e-4 / det);
        let a = i11 + 2.0 * i12 + i22;
        let b = (i11 + i12) * 0.001 + (i12 + i22) * 0.002;
        let c = i11 * 1e-6 + 2.0 * i12 * 2e-6 + i22 * 4e-6;
        let d = a * c - b * b;

        assert!(!result.frontier.is_empty());
        for p in &result.frontier {
            let r = p.expected_return();
            assert_relative_eq!(p.weights()[0], (0.002 - r) / 0.001, epsilon = 1e-9);
            let variance = (a * r * r - 2.0 * b * r + c) / d;
            assert_relative_eq!(p.risk(), variance.sqrt(), max_relative = 1e-8);
            // Upper branch only: nothing below the minimum-variance return
            assert!(r >= 0.008 / 7.0 - 1e-15);
        }
        assert_frontier_invariants(&result.frontier, &m);
        assert!(result.diagnostics.diagnostics.is_empty());
    }

    #[test]
    fn test_frontier_is_sorted_and_non_dominated() {
        let m = four_assets();
        let result = optimizer().optimize(&m).unwrap();

        assert!(result.frontier.len() > 10);
        assert_frontier_invariants(&result.frontier, &m);
        assert_eq!(result.diagnostics.skipped_targets(), 0);
        assert!(!result.diagnostics.near_singular);

        // The highest-return end is the single best asset
        let last = result.frontier.points().last().unwrap();
        assert_abs_diff_eq!(last.weights()[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_frontier_beats_every_lattice_portfolio() {
        let m = four_assets();
        let optimizer = optimizer();

        let lattice = crate::sampler::lattice_weights(4, 0.05).unwrap();
        for weights in lattice {
            let sample = Portfolio::evaluate(weights, &m);
            let optimal = optimizer
                .solve_target(&m, sample.expected_return())
                .unwrap()
                .unwrap();
            assert!(optimal.risk() <= sample.risk() + 1e-12);
            assert_abs_diff_eq!(
                optimal.expected_return(),
                sample.expected_return(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_infeasible_targets_skipped() {
        let m = two_assets();
        let result = optimizer()
            .optimize_targets(&m, &[0.0005, 0.0015, 0.0018, 0.003])
            .unwrap();

        assert_eq!(result.frontier.len(), 2);
        assert_eq!(result.diagnostics.skipped_targets(), 2);
        assert!(matches!(
            result.diagnostics.diagnostics[0],
            Diagnostic::InfeasibleTarget { target, .. } if target == 0.0005
        ));
        assert!(matches!(
            result.diagnostics.diagnostics[1],
            Diagnostic::InfeasibleTarget { target, .. } if target == 0.003
        ));
        assert!(optimizer().solve_target(&m, 0.0021).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_asset_uses_regularization_path() {
        let m = MomentEstimate::new(
            vec!["A".into(), "A2".into(), "B".into()],
            array![0.001, 0.001, 0.002],
            array![
                [1.0e-4, 1.0e-4, 2.0e-5],
                [1.0e-4, 1.0e-4, 2.0e-5],
                [2.0e-5, 2.0e-5, 4.0e-4]
            ],
            250,
        )
        .unwrap();

        let result = optimizer().optimize(&m).unwrap();

        assert!(result.diagnostics.near_singular);
        assert!(result.diagnostics.regularized());
        assert!(matches!(
            result.diagnostics.diagnostics[0],
            Diagnostic::NearSingularCovariance { .. }
        ));
        assert!(!result.frontier.is_empty());
        assert_frontier_invariants(&result.frontier, &m);
    }

    #[test]
    fn test_deserialized_frontier_is_filtered() {
        let m = two_assets();
        let gmv = Portfolio::evaluate(vec![6.0 / 7.0, 1.0 / 7.0], &m);
        let top = Portfolio::asset(1, &m);
        // Lower branch: more risk than the GMV portfolio for less return
        let dominated = Portfolio::asset(0, &m);

        let raw = serde_json::json!({
            "points": [top.clone(), dominated, gmv.clone()]
        });
        let frontier: Frontier = serde_json::from_value(raw).unwrap();

        assert_eq!(frontier.points(), &[gmv, top]);
        assert_frontier_invariants(&frontier, &m);

        let json = serde_json::to_string(&frontier).unwrap();
        let back: Frontier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frontier);
    }

    #[test]
    fn test_repeated_return_column() {
        // A2 is an exact copy of A
        let returns = array![
            [0.010, 0.010, 0.004],
            [-0.004, -0.004, 0.012],
            [0.006, 0.006, -0.008],
            [0.002, 0.002, 0.015],
            [-0.007, -0.007, 0.003],
            [0.009, 0.009, 0.001]
        ];
        let m = frontier_risk::MomentEstimator::default()
            .estimate_matrix(vec!["A".into(), "A2".into(), "B".into()], &returns)
            .unwrap();
        assert_eq!(m.covariance()[[0, 0]], m.covariance()[[0, 1]]);

        let result = optimizer().optimize(&m).unwrap();

        assert!(result.diagnostics.near_singular);
        assert!(result.diagnostics.regularized());
        assert!(!result.frontier.is_empty());
        assert_frontier_invariants(&result.frontier, &m);
        assert!(
            result
                .frontier
                .iter()
                .all(|p| p.expected_return().is_finite() && p.risk().is_finite())
        );
    }

    #[test]
    fn test_rank_deficient_covariance() {
        // Three observations of four assets: rank 2
        let returns = array![
            [0.01, 0.02, -0.01, 0.005],
            [0.03, -0.01, 0.02, 0.01],
            [-0.01, 0.02, 0.01, 0.0]
        ];
        let m = frontier_risk::MomentEstimator::default()
            .estimate_matrix(
                vec!["A".into(), "B".into(), "C".into(), "D".into()],
                &returns,
            )
            .unwrap();

        let result = FrontierOptimizer::new(FrontierConfig {
            grid_points: 20,
            ..Default::default()
        })
        .unwrap()
        .optimize(&m)
        .unwrap();

        assert!(result.diagnostics.regularized_solves > 0);
        assert!(!result.frontier.is_empty());
        assert_frontier_invariants(&result.frontier, &m);
    }

    #[test]
    fn test_iteration_limit_skips_target() {
        // Reaching the optimum from the A/C start takes three iterations
        let m = MomentEstimate::new(
            vec!["A".into(), "B".into(), "C".into()],
            array![0.001, 0.003, 0.002],
            array![
                [1.0e-4, 0.0, 1.8e-4],
                [0.0, 1.0e-4, 0.0],
                [1.8e-4, 0.0, 4.0e-4]
            ],
            250,
        )
        .unwrap();

        let limited = FrontierOptimizer::new(FrontierConfig {
            max_iterations: Some(1),
            ..Default::default()
        })
        .unwrap();
        let result = limited.optimize_targets(&m, &[0.0015]).unwrap();

        assert!(result.frontier.is_empty());
        assert_eq!(
            result.diagnostics.diagnostics,
            vec![Diagnostic::IterationLimit {
                target: 0.0015,
                iterations: 1
            }]
        );
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let m = four_assets();
        let parallel = optimizer().optimize(&m).unwrap();
        let sequential = FrontierOptimizer::new(FrontierConfig {
            parallel: false,
            ..Default::default()
        })
        .unwrap()
        .optimize(&m)
        .unwrap();

        assert_eq!(parallel.frontier, sequential.frontier);
    }

    #[test]
    fn test_single_asset_frontier() {
        let m = MomentEstimate::new(vec!["A".into()], array![0.001], Array2::eye(1) * 1e-4, 10)
            .unwrap();
        let result = optimizer().optimize(&m).unwrap();

        assert_eq!(result.frontier.len(), 1);
        assert_eq!(result.frontier.points()[0].weights(), &[1.0]);
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::IterationLimit {
            target: 0.5,
            iterations: 3,
        };
        assert_eq!(d.to_string(), "target return 0.5 did not converge in 3 iterations");
    }
}

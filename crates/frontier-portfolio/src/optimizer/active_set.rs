//! Primal active-set solver for the long-only minimum-variance problem
//!
//! For a target return r:
//!
//! ```text
//! minimize   w^T Σ w
//! subject to w^T μ = r
//!            1^T w = 1
//!            w >= 0
//! ```
//!
//! Assets are split into a free set F and a fixed set (held at zero). On F the
//! equality-constrained problem has the closed form
//!
//! ```text
//! w_F = Σ_F^-1 (a μ_F + b 1)
//! A = 1^T Σ_F^-1 1,  B = 1^T Σ_F^-1 μ_F,  C = μ_F^T Σ_F^-1 μ_F,  D = AC - B^2
//! a = (A r - B) / D,  b = (C - B r) / D
//! ```
//!
//! Each iteration moves from the current feasible point toward that solution.
//! An asset whose weight would turn negative blocks the step and is fixed at
//! zero. Once the step vanishes, fixed assets with a negative KKT multiplier
//! ν_i = (Σw)_i - a μ_i - b are released. Every iterate stays feasible.

use frontier_risk::{EstimationError, MomentEstimate, covariance::SymmetricInverse};
use ndarray::{Array1, Array2};

/// Relative size of D below which μ_F is treated as constant.
const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// Step length below which the current point is treated as the reduced optimum.
const STEP_TOLERANCE: f64 = 1e-13;

/// Solver settings shared by every target on the grid.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActiveSetSettings {
    pub(crate) regularization: f64,
    pub(crate) max_iterations: usize,
}

/// Optimal weights for one target return.
#[derive(Debug, Clone)]
pub(crate) struct ActiveSetSolution {
    pub(crate) weights: Vec<f64>,
    pub(crate) regularized_solves: usize,
}

/// Why a target produced no portfolio.
#[derive(Debug)]
pub(crate) enum ActiveSetFailure {
    /// No asset mix reaches the target
    Infeasible,
    /// The loop did not converge within the iteration budget
    IterationLimit(usize),
    /// A reduced system could not be solved
    Estimation(EstimationError),
}

impl From<EstimationError> for ActiveSetFailure {
    fn from(err: EstimationError) -> Self {
        Self::Estimation(err)
    }
}

/// Solution of the equality-constrained problem on a free set.
#[derive(Debug)]
struct ReducedSolution {
    /// Weights of the free assets, in free-set order
    weights: Array1<f64>,
    /// Multiplier of the return constraint; `None` when μ_F is constant
    a: Option<f64>,
    /// Multiplier of the budget constraint
    b: f64,
    regularized: bool,
}

/// Solve the equality-constrained problem on the sub-selected moments.
fn solve_reduced(
    mu: &Array1<f64>,
    sigma: &Array2<f64>,
    target: f64,
    regularization: f64,
) -> Result<ReducedSolution, EstimationError> {
    let inv = SymmetricInverse::compute(sigma, regularization)?;
    let ones = Array1::<f64>::ones(mu.len());

    let s1 = inv.inverse.dot(&ones);
    let smu = inv.inverse.dot(mu);

    let a_coef = s1.sum();
    let b_coef = smu.sum();
    let c_coef = mu.dot(&smu);
    let d_coef = a_coef * c_coef - b_coef * b_coef;

    if mu.len() == 1 || d_coef <= DEGENERACY_TOLERANCE * (a_coef * c_coef).abs() {
        // Return constraint implied by the budget: minimum variance only
        return Ok(ReducedSolution {
            weights: &s1 / a_coef,
            a: None,
            b: 1.0 / a_coef,
            regularized: inv.regularized,
        });
    }

    let a = (a_coef * target - b_coef) / d_coef;
    let b = (c_coef - b_coef * target) / d_coef;

    Ok(ReducedSolution {
        weights: &smu * a + &s1 * b,
        a: Some(a),
        b,
        regularized: inv.regularized,
    })
}

/// Feasible starting point: a mix of the two assets whose returns bracket the
/// target most tightly. Ties go to the lower-variance asset.
fn corner_start(moments: &MomentEstimate, target: f64) -> Option<Vec<f64>> {
    let mu = moments.expected_returns();
    let sigma = moments.covariance();
    let n = mu.len();

    let mut below: Option<usize> = None;
    let mut above: Option<usize> = None;
    for i in 0..n {
        let safer = |b: usize| mu[i] == mu[b] && sigma[[i, i]] < sigma[[b, b]];
        if mu[i] <= target && below.is_none_or(|b| mu[i] > mu[b] || safer(b)) {
            below = Some(i);
        }
        if mu[i] >= target && above.is_none_or(|b| mu[i] < mu[b] || safer(b)) {
            above = Some(i);
        }
    }
    let (below, above) = (below?, above?);

    let mut weights = vec![0.0; n];
    if below == above || mu[above] == mu[below] {
        weights[below] = 1.0;
    } else {
        let w_below = (mu[above] - target) / (mu[above] - mu[below]);
        weights[below] = w_below;
        weights[above] = 1.0 - w_below;
    }
    Some(weights)
}

/// Minimum-variance long-only weights achieving `target`.
///
/// `target` must lie within `[min μ, max μ]`; callers screen infeasible
/// targets beforehand.
pub(crate) fn solve_target(
    moments: &MomentEstimate,
    target: f64,
    settings: ActiveSetSettings,
) -> Result<ActiveSetSolution, ActiveSetFailure> {
    let n = moments.n_assets();
    let mu = moments.expected_returns();
    let sigma = moments.covariance();

    let Some(mut weights) = corner_start(moments, target) else {
        return Err(ActiveSetFailure::Infeasible);
    };
    let mut free: Vec<bool> = weights.iter().map(|&w| w > 0.0).collect();
    let mut regularized_solves = 0;

    let max_diag = sigma.diag().iter().cloned().fold(0.0_f64, f64::max);

    for _iteration in 0..settings.max_iterations {
        let free_idx: Vec<usize> = (0..n).filter(|&i| free[i]).collect();
        let reduced = solve_reduced(
            &moments.sub_returns(&free_idx),
            &moments.sub_covariance(&free_idx),
            target,
            settings.regularization,
        )?;
        if reduced.regularized {
            regularized_solves += 1;
        }

        let step: Vec<f64> = free_idx
            .iter()
            .zip(reduced.weights.iter())
            .map(|(&i, &w_star)| w_star - weights[i])
            .collect();
        let step_norm = step.iter().fold(0.0_f64, |acc, p| acc.max(p.abs()));

        if step_norm > STEP_TOLERANCE {
            // Longest feasible step toward the reduced optimum
            let mut alpha = 1.0;
            let mut blocking = None;
            for (&i, &p) in free_idx.iter().zip(step.iter()) {
                if p < 0.0 {
                    let ratio = weights[i] / -p;
                    if ratio < alpha {
                        alpha = ratio;
                        blocking = Some(i);
                    }
                }
            }

            if let Some(k) = blocking {
                for (&i, &p) in free_idx.iter().zip(step.iter()) {
                    weights[i] += alpha * p;
                }
                weights[k] = 0.0;
                free[k] = false;
            } else {
                for (&i, &w_star) in free_idx.iter().zip(reduced.weights.iter()) {
                    weights[i] = w_star;
                }
            }
            continue;
        }

        // Reduced optimum reached: check multipliers of the fixed assets
        let gradient = sigma.dot(&Array1::from(weights.clone()));
        let fixed: Vec<usize> = (0..n).filter(|&i| !free[i]).collect();
        if fixed.is_empty() {
            return Ok(finish(weights, regularized_solves));
        }

        let multipliers = fixed_multipliers(
            &gradient,
            mu,
            &free_idx,
            &fixed,
            target,
            reduced.a,
            reduced.b,
        );
        let tolerance = 1e-10 * max_diag.max(f64::MIN_POSITIVE);

        let most_negative = fixed
            .iter()
            .zip(multipliers.iter())
            .filter(|(_, nu)| **nu < -tolerance)
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&i, _)| i);

        match most_negative {
            Some(i) => free[i] = true,
            None => return Ok(finish(weights, regularized_solves)),
        }
    }

    Err(ActiveSetFailure::IterationLimit(settings.max_iterations))
}

/// KKT multipliers ν_i = (Σw)_i - a μ_i - b of the fixed assets.
///
/// When μ_F is constant the return multiplier `a` is not determined by the
/// free set; it is chosen inside the interval that keeps every ν_i
/// non-negative, or at its midpoint when that interval is empty.
fn fixed_multipliers(
    gradient: &Array1<f64>,
    mu: &Array1<f64>,
    free_idx: &[usize],
    fixed: &[usize],
    target: f64,
    a: Option<f64>,
    b: f64,
) -> Vec<f64> {
    if let Some(a) = a {
        return fixed.iter().map(|&i| gradient[i] - a * mu[i] - b).collect();
    }

    // With μ_F = r the stationarity condition reads (Σw)_F = a r + b = level
    let level = free_idx.iter().map(|&i| gradient[i]).sum::<f64>() / free_idx.len() as f64;

    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    for &i in fixed {
        let c = gradient[i] - level;
        let d = mu[i] - target;
        if d > 0.0 {
            hi = hi.min(c / d);
        } else if d < 0.0 {
            lo = lo.max(c / d);
        }
    }

    let a = match (lo.is_finite(), hi.is_finite()) {
        (true, true) => (lo + hi) / 2.0,
        (true, false) => lo,
        (false, true) => hi,
        (false, false) => 0.0,
    };

    fixed
        .iter()
        .map(|&i| gradient[i] - level - a * (mu[i] - target))
        .collect()
}

/// Clear rounding noise so weights are non-negative and sum to one.
fn finish(mut weights: Vec<f64>, regularized_solves: usize) -> ActiveSetSolution {
    for w in weights.iter_mut() {
        if *w < 0.0 {
            *w = 0.0;
        }
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            *w /= total;
        }
    }
    ActiveSetSolution {
        weights,
        regularized_solves,
    }
}

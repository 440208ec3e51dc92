//! Random portfolio sampling
//!
//! Produces a cloud of feasible long-only portfolios that illustrates the shape
//! of the risk/return region. The cloud is not optimal; the efficient frontier
//! comes from [`crate::optimizer`].
//!
//! Two methods are available:
//! - Dirichlet(1, ..., 1): N independent Exp(1) draws normalized by their sum,
//!   which is uniform over the simplex.
//! - Lattice: every weight vector whose entries are multiples of a fixed step.

use crate::error::{OptimizationError, Result};
use crate::portfolio::Portfolio;
use frontier_risk::MomentEstimate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest number of lattice points that will be enumerated.
pub const MAX_LATTICE_POINTS: u128 = 1_000_000;

/// How sampled weight vectors are generated
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplingMethod {
    /// Uniform sampling over the simplex
    #[default]
    Dirichlet,

    /// Exhaustive grid over the simplex with the given weight step
    Lattice {
        /// Weight increment; must divide 1 evenly (e.g. 0.02)
        step: f64,
    },
}

/// Portfolio sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of Dirichlet samples (default: 5000). Ignored by the lattice method.
    pub samples: usize,

    /// Seed of the random generator (default: 42)
    pub seed: u64,

    /// Sampling method (default: Dirichlet)
    pub method: SamplingMethod,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            samples: 5000,
            seed: 42,
            method: SamplingMethod::Dirichlet,
        }
    }
}

impl SamplerConfig {
    /// Check the configuration for invalid values
    pub fn validate(&self) -> Result<()> {
        match self.method {
            SamplingMethod::Dirichlet if self.samples == 0 => Err(
                OptimizationError::InvalidConfig("samples must be positive".to_string()),
            ),
            SamplingMethod::Dirichlet => Ok(()),
            SamplingMethod::Lattice { step } => lattice_divisions(step).map(|_| ()),
        }
    }
}

/// Draws random long-only portfolios
#[derive(Debug, Default)]
pub struct PortfolioSampler {
    config: SamplerConfig,
}

impl PortfolioSampler {
    /// Create a sampler, validating its configuration
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Sampler configuration
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample portfolios using a generator seeded from the configuration.
    ///
    /// Identical seeds and sample counts yield bit-identical output.
    pub fn sample(&self, moments: &MomentEstimate) -> Result<Vec<Portfolio>> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.sample_with_rng(moments, &mut rng)
    }

    /// Sample portfolios with a caller-supplied generator.
    ///
    /// The lattice method is deterministic and does not consume randomness.
    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        moments: &MomentEstimate,
        rng: &mut R,
    ) -> Result<Vec<Portfolio>> {
        let n = moments.n_assets();
        if n == 0 {
            return Err(OptimizationError::NoAssets);
        }

        let portfolios: Vec<Portfolio> = match self.config.method {
            SamplingMethod::Dirichlet => (0..self.config.samples)
                .map(|_| Portfolio::evaluate(dirichlet_weights(n, rng), moments))
                .collect(),
            SamplingMethod::Lattice { step } => lattice_weights(n, step)?
                .into_iter()
                .map(|w| Portfolio::evaluate(w, moments))
                .collect(),
        };

        debug!(
            samples = portfolios.len(),
            method = ?self.config.method,
            "sampled portfolios"
        );

        Ok(portfolios)
    }
}

/// Draw a weight vector uniformly from the N-simplex.
pub fn dirichlet_weights<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    loop {
        let draws: Vec<f64> = (0..n).map(|_| Exp1.sample(rng)).collect();
        let total: f64 = draws.iter().sum();
        if total > 0.0 && total.is_finite() {
            return draws.into_iter().map(|x| x / total).collect();
        }
    }
}

/// Enumerate every weight vector on the simplex lattice with the given step.
///
/// Vectors are produced in lexicographic order of the leading weights.
pub fn lattice_weights(n: usize, step: f64) -> Result<Vec<Vec<f64>>> {
    let divisions = lattice_divisions(step)?;
    if n == 0 {
        return Err(OptimizationError::NoAssets);
    }

    let count = lattice_size(n, divisions);
    if count > MAX_LATTICE_POINTS {
        return Err(OptimizationError::InvalidConfig(format!(
            "lattice step {} over {} assets yields {} points (max {})",
            step, n, count, MAX_LATTICE_POINTS
        )));
    }

    let mut out = Vec::with_capacity(count as usize);
    let mut units = vec![0usize; n];
    fill_lattice(&mut units, 0, divisions, divisions, &mut out);
    Ok(out)
}

fn fill_lattice(
    units: &mut [usize],
    index: usize,
    remaining: usize,
    divisions: usize,
    out: &mut Vec<Vec<f64>>,
) {
    if index == units.len() - 1 {
        units[index] = remaining;
        out.push(
            units
                .iter()
                .map(|&u| u as f64 / divisions as f64)
                .collect(),
        );
        return;
    }

    for k in 0..=remaining {
        units[index] = k;
        fill_lattice(units, index + 1, remaining - k, divisions, out);
    }
}

/// Number of lattice divisions of the unit weight for a step.
fn lattice_divisions(step: f64) -> Result<usize> {
    if !(step > 0.0 && step <= 1.0) {
        return Err(OptimizationError::InvalidConfig(format!(
            "lattice step must be in (0, 1], got {}",
            step
        )));
    }
    let divisions = (1.0 / step).round();
    if (divisions * step - 1.0).abs() > 1e-9 {
        return Err(OptimizationError::InvalidConfig(format!(
            "lattice step {} does not divide 1 evenly",
            step
        )));
    }
    Ok(divisions as usize)
}

/// C(divisions + n - 1, n - 1), saturating.
fn lattice_size(n: usize, divisions: usize) -> u128 {
    let k = (n - 1) as u128;
    let top = (divisions + n - 1) as u128;
    let mut result: u128 = 1;
    for i in 0..k {
        result = result.saturating_mul(top - i) / (i + 1);
        if result > MAX_LATTICE_POINTS * 1_000 {
            return result;
        }
    }
    result
}

//! Report assembly
//!
//! Packages per-asset statistics, the sampled cloud and the frontier into a
//! [`FrontierReport`]. Nothing is recomputed here; every portfolio is only
//! checked against the weight invariants before it is emitted.

use crate::error::{OutputError, Result};
use crate::export::{AssetRecord, FrontierReport, PortfolioRecord, ReportMetadata};
use frontier_portfolio::{Frontier, FrontierDiagnostics, Portfolio, WEIGHT_TOLERANCE};
use frontier_risk::MomentEstimate;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything a report is built from
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    /// Moments the portfolios were evaluated with
    pub moments: &'a MomentEstimate,
    /// Sampled portfolio cloud
    pub portfolios: &'a [Portfolio],
    /// Optimized frontier
    pub frontier: &'a Frontier,
    /// Price rows before alignment
    pub raw_rows: usize,
    /// Numerical health of the frontier run
    pub diagnostics: &'a FrontierDiagnostics,
}

/// Validates portfolios and builds the output document
#[derive(Debug, Clone, Copy)]
pub struct ResultAssembler {
    tolerance: f64,
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::new(WEIGHT_TOLERANCE)
    }
}

impl ResultAssembler {
    /// Create an assembler checking weights to within `tolerance`
    pub const fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Weight tolerance
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Build the report.
    ///
    /// # Errors
    /// * `InvariantViolation` if any portfolio has the wrong number of weights,
    ///   non-finite values, weights that do not sum to one, a negative weight,
    ///   or if the frontier is not strictly ascending in risk
    pub fn assemble(&self, inputs: ReportInputs<'_>) -> Result<FrontierReport> {
        let tickers = inputs.moments.tickers();

        let assets = (0..inputs.moments.n_assets())
            .map(|i| {
                let asset = Portfolio::asset(i, inputs.moments);
                self.check("assets", i, &asset, tickers.len())?;
                Ok(AssetRecord {
                    ticker: tickers[i].clone(),
                    expected_return: asset.expected_return(),
                    risk: asset.risk(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let portfolios = self.records("portfolios", inputs.portfolios, tickers)?;
        let efficient_frontier =
            self.records("efficient_frontier", inputs.frontier.points(), tickers)?;

        for (i, pair) in efficient_frontier.windows(2).enumerate() {
            if pair[1].risk <= pair[0].risk {
                return Err(OutputError::invariant(
                    "efficient_frontier",
                    format!(
                        "point {} has risk {} not above the previous {}",
                        i + 1,
                        pair[1].risk,
                        pair[0].risk
                    ),
                ));
            }
        }

        let diagnostics = inputs.diagnostics;
        let metadata = ReportMetadata {
            tickers: tickers.to_vec(),
            observations: inputs.moments.n_observations(),
            raw_rows: inputs.raw_rows,
            condition_number: Some(diagnostics.condition_number).filter(|c| c.is_finite()),
            regularized: diagnostics.regularized(),
            skipped_targets: diagnostics.skipped_targets(),
        };

        debug!(
            assets = assets.len(),
            portfolios = portfolios.len(),
            frontier = efficient_frontier.len(),
            "assembled report"
        );

        Ok(FrontierReport {
            metadata,
            assets,
            portfolios,
            efficient_frontier,
        })
    }

    fn records(
        &self,
        context: &str,
        portfolios: &[Portfolio],
        tickers: &[String],
    ) -> Result<Vec<PortfolioRecord>> {
        portfolios
            .iter()
            .enumerate()
            .map(|(i, p)| {
                self.check(context, i, p, tickers.len())?;
                let weights: BTreeMap<String, f64> = tickers
                    .iter()
                    .cloned()
                    .zip(p.weights().iter().copied())
                    .collect();
                Ok(PortfolioRecord {
                    weights,
                    expected_return: p.expected_return(),
                    risk: p.risk(),
                })
            })
            .collect()
    }

    fn check(&self, context: &str, index: usize, p: &Portfolio, n_assets: usize) -> Result<()> {
        let weights = p.weights();
        if weights.len() != n_assets {
            return Err(OutputError::invariant(
                context,
                format!(
                    "entry {} has {} weights for {} tickers",
                    index,
                    weights.len(),
                    n_assets
                ),
            ));
        }
        if weights.iter().any(|w| !w.is_finite())
            || !p.expected_return().is_finite()
            || !p.risk().is_finite()
        {
            return Err(OutputError::invariant(
                context,
                format!("entry {} has non-finite values", index),
            ));
        }

        let sum = p.weight_sum();
        if (sum - 1.0).abs() > self.tolerance {
            return Err(OutputError::invariant(
                context,
                format!("entry {} weights sum to {}", index, sum),
            ));
        }
        let min = p.min_weight();
        if min < -self.tolerance {
            return Err(OutputError::invariant(
                context,
                format!("entry {} has negative weight {}", index, min),
            ));
        }
        Ok(())
    }
}

//! Per-asset summary of an estimation run.
//!
//! A text view of the moment estimate without sampling or optimizing:
//! per-asset mean return and volatility, the correlation matrix and the
//! conditioning of the covariance matrix.

use chrono::NaiveDate;
use frontier_risk::MomentEstimate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary statistics of one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetSummary {
    /// Asset ticker.
    pub ticker: String,

    /// Mean per-period return.
    pub expected_return: f64,

    /// Per-period volatility.
    pub risk: f64,
}

impl AssetSummary {
    /// Return per unit of risk, or `None` for a riskless asset.
    pub fn return_to_risk(&self) -> Option<f64> {
        (self.risk > 0.0).then_some(self.expected_return / self.risk)
    }
}

impl fmt::Display for AssetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: return={:.4}%, risk={:.4}%",
            self.ticker,
            self.expected_return * 100.0,
            self.risk * 100.0
        )
    }
}

/// Estimation summary across all assets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSummary {
    /// First and last date of the aligned return series, if known.
    pub period: Option<(NaiveDate, NaiveDate)>,

    /// Number of aligned return observations.
    pub observations: usize,

    /// Number of price rows before alignment.
    pub raw_rows: usize,

    /// Per-asset statistics.
    pub assets: Vec<AssetSummary>,

    /// Correlation matrix, row-major in asset order.
    pub correlations: Vec<Vec<f64>>,

    /// Condition number of the covariance matrix.
    pub condition_number: f64,
}

impl MarketSummary {
    /// Summarize a moment estimate.
    ///
    /// Correlations involving a zero-variance asset are reported as `0.0`
    /// (and `1.0` on the diagonal).
    pub fn new(
        moments: &MomentEstimate,
        period: Option<(NaiveDate, NaiveDate)>,
        raw_rows: usize,
    ) -> Self {
        let n = moments.n_assets();
        let assets = moments
            .tickers()
            .iter()
            .enumerate()
            .map(|(i, ticker)| AssetSummary {
                ticker: ticker.clone(),
                expected_return: moments.expected_returns()[i],
                risk: moments.asset_risk(i),
            })
            .collect();

        let cov = moments.covariance();
        let correlations = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        let scale = moments.asset_risk(i) * moments.asset_risk(j);
                        if i == j {
                            1.0
                        } else if scale > 0.0 {
                            cov[[i, j]] / scale
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            period,
            observations: moments.n_observations(),
            raw_rows,
            assets,
            correlations,
            condition_number: moments.condition_number(),
        }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let width = 24 + 10 * self.assets.len().max(4);
        let mut output = String::new();

        output.push_str("\nMarket Summary\n");
        if let Some((start, end)) = self.period {
            output.push_str(&format!("Period: {} to {}\n", start, end));
        }
        output.push_str(&format!(
            "Observations: {} (raw rows: {})\n",
            self.observations, self.raw_rows
        ));
        output.push_str(&format!(
            "Condition number: {:.3e}\n",
            self.condition_number
        ));
        output.push_str(&"=".repeat(width));
        output.push('\n');

        output.push_str(&format!(
            "{:<12} {:>12} {:>12} {:>12}\n",
            "Ticker", "Return", "Risk", "Ret/Risk"
        ));
        output.push_str(&"-".repeat(width));
        output.push('\n');
        for asset in &self.assets {
            let ratio = asset
                .return_to_risk()
                .map(|r| format!("{:.4}", r))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<12} {:>11.4}% {:>11.4}% {:>12}\n",
                asset.ticker,
                asset.expected_return * 100.0,
                asset.risk * 100.0,
                ratio
            ));
        }

        if self.assets.len() > 1 {
            output.push_str("\nCorrelations:\n");
            output.push_str(&"-".repeat(width));
            output.push('\n');
            output.push_str(&format!("{:<12}", ""));
            for asset in &self.assets {
                output.push_str(&format!(" {:>9}", asset.ticker));
            }
            output.push('\n');
            for (asset, row) in self.assets.iter().zip(&self.correlations) {
                output.push_str(&format!("{:<12}", asset.ticker));
                for value in row {
                    output.push_str(&format!(" {:>9.4}", value));
                }
                output.push('\n');
            }
        }

        output.push_str(&"=".repeat(width));
        output.push('\n');
        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::from("# Market Summary\n\n");

        if let Some((start, end)) = self.period {
            output.push_str(&format!("**Period:** {} to {}\n\n", start, end));
        }
        output.push_str(&format!(
            "- **Observations:** {}\n- **Raw rows:** {}\n- **Condition number:** {:.3e}\n\n",
            self.observations, self.raw_rows, self.condition_number
        ));

        output.push_str("## Assets\n\n");
        output.push_str("| Ticker | Return | Risk |\n");
        output.push_str("|--------|--------|------|\n");
        for asset in &self.assets {
            output.push_str(&format!(
                "| {} | {:.4}% | {:.4}% |\n",
                asset.ticker,
                asset.expected_return * 100.0,
                asset.risk * 100.0
            ));
        }
        output
    }
}

impl fmt::Display for MarketSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Market Summary ({} observations, {} assets)",
            self.observations,
            self.assets.len()
        )?;
        for asset in &self.assets {
            writeln!(f, "  {}", asset)?;
        }
        Ok(())
    }
}

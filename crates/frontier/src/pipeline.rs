//! End-to-end computation
//!
//! Prices flow through the stages strictly in order:
//!
//! ```text
//! prices -> ReturnCalculator -> MomentEstimator -> (PortfolioSampler || FrontierOptimizer)
//!        -> ResultAssembler
//! ```
//!
//! Sampling and optimization only read the shared moment estimate, so they run
//! concurrently via `rayon::join`. Their results are merged in a fixed order,
//! independent of which finishes first.

use frontier_data::{DataError, PriceSeries, PriceTable, ReturnCalculator, ReturnSeries};
use frontier_output::{FrontierReport, OutputError, ReportInputs, ResultAssembler};
use frontier_portfolio::{
    FrontierConfig, FrontierDiagnostics, FrontierOptimizer, OptimizationError, PortfolioSampler,
    SamplerConfig,
};
use frontier_risk::{EstimationError, MomentConfig, MomentEstimate, MomentEstimator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Price data could not be loaded or turned into returns
    #[error(transparent)]
    Data(#[from] DataError),

    /// Moments could not be estimated
    #[error(transparent)]
    Estimation(#[from] EstimationError),

    /// Sampling or optimization failed
    #[error(transparent)]
    Optimization(#[from] OptimizationError),

    /// The report failed validation or could not be written
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Configuration of a full run
///
/// Every section is optional in a TOML file:
///
/// ```toml
/// parallel = true
///
/// [sampler]
/// samples = 5000
/// seed = 42
///
/// [frontier]
/// grid_points = 50
/// regularization = 1e-10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Moment estimation settings
    pub moments: MomentConfig,

    /// Portfolio cloud settings
    pub sampler: SamplerConfig,

    /// Frontier optimization settings
    pub frontier: FrontierConfig,

    /// Run sampling and optimization concurrently (default: true).
    ///
    /// When disabled the optimizer also solves its grid sequentially.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            moments: MomentConfig::default(),
            sampler: SamplerConfig::default(),
            frontier: FrontierConfig::default(),
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Check every section for invalid values
    pub fn validate(&self) -> Result<()> {
        if self.moments.min_observations < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "moments.min_observations must be at least 2, got {}",
                self.moments.min_observations
            )));
        }
        self.sampler.validate()?;
        self.frontier.validate()?;
        Ok(())
    }
}

/// Stage of a pipeline run, reported to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Aligning prices and computing returns
    Returns,
    /// Estimating expected returns and covariance
    Moments,
    /// Sampling the portfolio cloud and optimizing the frontier
    Optimize,
    /// Validating and packaging results
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Returns => "Computing returns",
            Self::Moments => "Estimating moments",
            Self::Optimize => "Sampling portfolios and optimizing frontier",
            Self::Assemble => "Assembling report",
        };
        f.write_str(label)
    }
}

/// Results of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Moment estimate all portfolios were evaluated with
    pub moments: MomentEstimate,

    /// Numerical health of the frontier run
    pub diagnostics: FrontierDiagnostics,

    /// The output document
    pub report: FrontierReport,
}

/// Runs the whole computation for one data set
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    calculator: ReturnCalculator,
    estimator: MomentEstimator,
    sampler: PortfolioSampler,
    optimizer: FrontierOptimizer,
    assembler: ResultAssembler,
}

impl Pipeline {
    /// Create a pipeline, validating its configuration
    pub fn new(mut config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        if !config.parallel {
            config.frontier.parallel = false;
        }

        Ok(Self {
            calculator: ReturnCalculator::new(),
            estimator: MomentEstimator::new(config.moments.clone()),
            sampler: PortfolioSampler::new(config.sampler.clone())?,
            optimizer: FrontierOptimizer::new(config.frontier.clone())?,
            assembler: ResultAssembler::new(config.frontier.weight_tolerance),
            config,
        })
    }

    /// Pipeline configuration
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run on a loaded price table
    pub fn run(&self, table: &PriceTable) -> Result<PipelineOutput> {
        self.run_with_progress(table, |_| {})
    }

    /// Run on a loaded price table, reporting each stage as it starts
    pub fn run_with_progress<F>(&self, table: &PriceTable, progress: F) -> Result<PipelineOutput>
    where
        F: Fn(Stage),
    {
        progress(Stage::Returns);
        let returns = self.calculator.compute_table(table)?;
        self.execute(&returns, progress)
    }

    /// Run on per-ticker price series
    pub fn run_series(&self, series: &[PriceSeries]) -> Result<PipelineOutput> {
        let returns = self.calculator.compute(series)?;
        self.execute(&returns, |_| {})
    }

    /// Run on already aligned returns
    pub fn run_returns(&self, returns: &ReturnSeries) -> Result<PipelineOutput> {
        self.execute(returns, |_| {})
    }

    /// Estimate moments only
    pub fn estimate(&self, table: &PriceTable) -> Result<(ReturnSeries, MomentEstimate)> {
        let returns = self.calculator.compute_table(table)?;
        let moments = self.estimator.estimate(&returns)?;
        Ok((returns, moments))
    }

    fn execute<F>(&self, returns: &ReturnSeries, progress: F) -> Result<PipelineOutput>
    where
        F: Fn(Stage),
    {
        progress(Stage::Moments);
        let moments = self.estimator.estimate(returns)?;

        progress(Stage::Optimize);
        let (portfolios, frontier) = if self.config.parallel {
            rayon::join(
                || self.sampler.sample(&moments),
                || self.optimizer.optimize(&moments),
            )
        } else {
            (
                self.sampler.sample(&moments),
                self.optimizer.optimize(&moments),
            )
        };
        let portfolios = portfolios?;
        let frontier = frontier?;
        debug!(
            portfolios = portfolios.len(),
            frontier = frontier.frontier.len(),
            "sampling and optimization complete"
        );

        progress(Stage::Assemble);
        let report = self.assembler.assemble(ReportInputs {
            moments: &moments,
            portfolios: &portfolios,
            frontier: &frontier.frontier,
            raw_rows: returns.raw_rows(),
            diagnostics: &frontier.diagnostics,
        })?;

        info!(
            assets = moments.n_assets(),
            observations = moments.n_observations(),
            portfolios = report.portfolios.len(),
            frontier = report.efficient_frontier.len(),
            skipped_targets = frontier.diagnostics.skipped_targets(),
            regularized = frontier.diagnostics.regularized(),
            "pipeline complete"
        );

        Ok(PipelineOutput {
            moments,
            diagnostics: frontier.diagnostics,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use frontier_portfolio::SamplingMethod;
    use std::cell::RefCell;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn table() -> PriceTable {
        let aaa = [100.0, 101.0, 100.5, 102.0, 103.0, 102.5, 104.0];
        let bbb = [50.0, 49.0, 51.0, 52.5, 51.5, 53.0, 54.5];
        let ccc = [20.0, 20.2, 20.1, 20.4, 20.3, 20.6, 20.8];
        let series = |name: &str, prices: &[f64]| {
            PriceSeries::from_quotes(
                name,
                prices.iter().enumerate().map(|(i, &p)| (day(i as u32 + 1), p)),
            )
        };
        PriceTable::new(
            vec![series("AAA", &aaa), series("BBB", &bbb), series("CCC", &ccc)],
            7,
        )
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            sampler: SamplerConfig {
                samples: 200,
                ..Default::default()
            },
            frontier: FrontierConfig {
                grid_points: 20,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert!(config.parallel);
        assert_eq!(config.sampler.samples, 5000);
        assert_eq!(config.frontier.grid_points, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let config = PipelineConfig::from_toml(
            r#"
            parallel = false

            [sampler]
            seed = 7
            method = { kind = "lattice", step = 0.05 }

            [frontier]
            grid_points = 25
            "#,
        )
        .unwrap();

        assert!(!config.parallel);
        assert_eq!(config.sampler.seed, 7);
        assert_eq!(config.sampler.samples, 5000);
        assert_eq!(config.sampler.method, SamplingMethod::Lattice { step: 0.05 });
        assert_eq!(config.frontier.grid_points, 25);
        assert_eq!(config.frontier.regularization, 1e-10);
        assert_eq!(config.moments.min_observations, 2);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            PipelineConfig::from_toml("[frontier]\ngrid_points = \"many\""),
            Err(PipelineError::Toml(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.frontier.grid_points = 1;
        assert!(matches!(
            Pipeline::new(config),
            Err(PipelineError::Optimization(OptimizationError::InvalidConfig(_)))
        ));

        let mut config = PipelineConfig::default();
        config.moments.min_observations = 1;
        assert!(matches!(
            Pipeline::new(config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_produces_report() {
        let output = Pipeline::new(small_config()).unwrap().run(&table()).unwrap();
        let report = &output.report;

        assert_eq!(report.metadata.tickers, vec!["AAA", "BBB", "CCC"]);
        assert_eq!(report.metadata.observations, 6);
        assert_eq!(report.metadata.raw_rows, 7);
        assert_eq!(report.assets.len(), 3);
        assert_eq!(report.portfolios.len(), 200);
        assert!(!report.efficient_frontier.is_empty());
        assert_eq!(output.moments.n_observations(), 6);
    }

    #[test]
    fn test_parallel_and_sequential_runs_match() {
        let parallel = Pipeline::new(small_config()).unwrap().run(&table()).unwrap();
        let sequential = Pipeline::new(PipelineConfig {
            parallel: false,
            ..small_config()
        })
        .unwrap()
        .run(&table())
        .unwrap();

        assert_eq!(parallel.report, sequential.report);
    }

    #[test]
    fn test_progress_stages_in_order() {
        let seen = RefCell::new(Vec::new());
        Pipeline::new(small_config())
            .unwrap()
            .run_with_progress(&table(), |stage| seen.borrow_mut().push(stage))
            .unwrap();

        assert_eq!(
            seen.into_inner(),
            vec![Stage::Returns, Stage::Moments, Stage::Optimize, Stage::Assemble]
        );
    }

    #[test]
    fn test_degenerate_price_aborts() {
        let mut series = table().series().to_vec();
        series[1] = PriceSeries::from_quotes("BBB", [(day(1), 50.0), (day(2), 0.0)]);

        let err = Pipeline::new(small_config())
            .unwrap()
            .run_series(&series)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Data(DataError::DegenerateAsset { .. })
        ));
    }

    #[test]
    fn test_insufficient_data_aborts() {
        let series = vec![
            PriceSeries::from_quotes("AAA", [(day(1), 100.0), (day(2), 101.0)]),
            PriceSeries::from_quotes("BBB", [(day(2), 50.0), (day(3), 51.0)]),
        ];
        let err = Pipeline::new(small_config())
            .unwrap()
            .run_series(&series)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Data(DataError::InsufficientData { .. })
        ));
    }
}

//! Frontier CLI binary.
//!
//! Computes the efficient frontier of a set of assets from a CSV of daily
//! close prices and writes the result as JSON or CSV.

use clap::{Parser, Subcommand, ValueEnum};
use frontier::data::read_price_table_path;
use frontier::output::{ExportFormat, Exporter, MarketSummary};
use frontier::portfolio::SamplingMethod;
use frontier::{Pipeline, PipelineConfig, Stage};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "frontier")]
#[command(about = "Frontier: long-only mean-variance efficient frontiers", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output from every stage
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample portfolios and compute the efficient frontier
    Compute {
        /// Price CSV (multi-header or single-header wide layout)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of random portfolios
        #[arg(long)]
        samples: Option<usize>,

        /// Random seed for portfolio sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Number of target returns on the frontier grid
        #[arg(long)]
        grid: Option<usize>,

        /// Sample an exhaustive weight lattice with this step instead of random draws
        #[arg(long)]
        lattice_step: Option<f64>,

        /// Relative eigenvalue floor for near-singular covariance matrices
        #[arg(long)]
        regularization: Option<f64>,

        /// Run every stage on the current thread
        #[arg(long)]
        sequential: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        /// Write compact JSON (shorthand for --format json)
        #[arg(long)]
        compact: bool,
    },

    /// Show per-asset statistics without optimizing
    Inspect {
        /// Price CSV (multi-header or single-header wide layout)
        #[arg(short, long)]
        input: PathBuf,

        /// Print Markdown instead of a text table
        #[arg(long)]
        markdown: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON
    Pretty,
    /// Compact JSON
    Json,
    /// Flat CSV table
    Csv,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Pretty => Self::PrettyJson,
            OutputFormat::Json => Self::Json,
            OutputFormat::Csv => Self::Csv,
        }
    }
}

/// Command-line overrides applied on top of the configuration file
#[derive(Debug, Default)]
struct Overrides {
    samples: Option<usize>,
    seed: Option<u64>,
    grid: Option<usize>,
    lattice_step: Option<f64>,
    regularization: Option<f64>,
    sequential: bool,
}

impl Overrides {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(samples) = self.samples {
            config.sampler.samples = samples;
        }
        if let Some(seed) = self.seed {
            config.sampler.seed = seed;
        }
        if let Some(step) = self.lattice_step {
            config.sampler.method = SamplingMethod::Lattice { step };
        }
        if let Some(grid) = self.grid {
            config.frontier.grid_points = grid;
        }
        if let Some(regularization) = self.regularization {
            config.frontier.regularization = regularization;
        }
        if self.sequential {
            config.parallel = false;
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "frontier=debug" } else { "frontier=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries the report
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Compute {
            input,
            output,
            config,
            samples,
            seed,
            grid,
            lattice_step,
            regularization,
            sequential,
            format,
            compact,
        } => {
            let mut pipeline_config = match config {
                Some(path) => PipelineConfig::from_file(path)?,
                None => PipelineConfig::default(),
            };
            Overrides {
                samples,
                seed,
                grid,
                lattice_step,
                regularization,
                sequential,
            }
            .apply(&mut pipeline_config);

            let format = if compact {
                ExportFormat::Json
            } else {
                format.into()
            };
            compute(&input, output.as_deref(), pipeline_config, format)?;
        }
        Commands::Inspect { input, markdown } => {
            inspect(&input, markdown)?;
        }
    }

    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn compute(
    input: &std::path::Path,
    output: Option<&std::path::Path>,
    config: PipelineConfig,
    format: ExportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(config)?;

    let pb = spinner();
    pb.set_message(format!("Loading {}", input.display()));
    let table = match read_price_table_path(input) {
        Ok(table) => table,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    let result = pipeline.run_with_progress(&table, |stage: Stage| {
        pb.set_message(format!("{}...", stage));
    });
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };
    pb.finish_with_message(format!(
        "Computed {} frontier points and {} sampled portfolios from {} observations",
        result.report.efficient_frontier.len(),
        result.report.portfolios.len(),
        result.report.metadata.observations
    ));

    match output {
        Some(path) => {
            result.report.export_to_file(path, format)?;
            info!(path = %path.display(), "wrote report");
        }
        None => {
            let mut stdout = io::stdout().lock();
            result.report.export_to_writer(&mut stdout, format)?;
            if format != ExportFormat::Csv {
                writeln!(stdout)?;
            }
        }
    }

    Ok(())
}

fn inspect(input: &std::path::Path, markdown: bool) -> Result<(), Box<dyn std::error::Error>> {
    let table = read_price_table_path(input)?;
    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let (returns, moments) = pipeline.estimate(&table)?;

    let period = returns
        .dates()
        .first()
        .zip(returns.dates().last())
        .map(|(start, end)| (*start, *end));
    let summary = MarketSummary::new(&moments, period, returns.raw_rows());

    if markdown {
        print!("{}", summary.to_markdown());
    } else {
        print!("{}", summary.to_ascii_table());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_arguments() {
        let cli = Cli::try_parse_from([
            "frontier",
            "compute",
            "--input",
            "prices.csv",
            "--samples",
            "100",
            "--grid",
            "30",
            "--compact",
        ])
        .unwrap();

        match cli.command {
            Commands::Compute {
                input,
                output,
                samples,
                grid,
                compact,
                format,
                ..
            } => {
                assert_eq!(input, PathBuf::from("prices.csv"));
                assert!(output.is_none());
                assert_eq!(samples, Some(100));
                assert_eq!(grid, Some(30));
                assert!(compact);
                assert_eq!(format, OutputFormat::Pretty);
            }
            Commands::Inspect { .. } => panic!("expected compute"),
        }
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["frontier", "compute"]).is_err());
        assert!(Cli::try_parse_from(["frontier", "inspect"]).is_err());
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = PipelineConfig::default();
        Overrides {
            samples: Some(10),
            seed: Some(3),
            grid: Some(7),
            lattice_step: Some(0.25),
            regularization: Some(1e-8),
            sequential: true,
        }
        .apply(&mut config);

        assert_eq!(config.sampler.samples, 10);
        assert_eq!(config.sampler.seed, 3);
        assert_eq!(config.sampler.method, SamplingMethod::Lattice { step: 0.25 });
        assert_eq!(config.frontier.grid_points, 7);
        assert_eq!(config.frontier.regularization, 1e-8);
        assert!(!config.parallel);
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = PipelineConfig::default();
        Overrides::default().apply(&mut config);
        assert_eq!(config.sampler.samples, 5000);
        assert!(config.parallel);
    }

    #[test]
    fn test_output_format_mapping() {
        assert_eq!(ExportFormat::from(OutputFormat::Pretty), ExportFormat::PrettyJson);
        assert_eq!(ExportFormat::from(OutputFormat::Csv), ExportFormat::Csv);
    }
}

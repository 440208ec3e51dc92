//! Report data model and export.
//!
//! The JSON document has four sections:
//!
//! ```text
//! {
//!   "metadata": { "tickers": [..], "observations": int, "raw_rows": int, .. },
//!   "assets": [ { "ticker", "expected_return", "risk" } ],
//!   "portfolios": [ { "weights": {ticker: weight}, "expected_return", "risk" } ],
//!   "efficient_frontier": [ { "weights": {ticker: weight}, "expected_return", "risk" } ]
//! }
//! ```
//!
//! Returns and risks are per-period figures at the granularity of the input
//! series. Weight maps list every ticker, zeros included.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Compact JSON.
    Json,

    /// Pretty-printed JSON (two-space indent).
    #[default]
    PrettyJson,

    /// One CSV row per asset, sampled portfolio and frontier point.
    Csv,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Run-level information about the inputs and numerical health.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportMetadata {
    /// Asset tickers, in the order used throughout the run.
    pub tickers: Vec<String>,

    /// Number of aligned return observations.
    pub observations: usize,

    /// Number of price rows before alignment.
    pub raw_rows: usize,

    /// Condition number of the covariance matrix; `None` when infinite.
    #[serde(default)]
    pub condition_number: Option<f64>,

    /// Whether the covariance was flagged near-singular or any solve was
    /// regularized.
    #[serde(default)]
    pub regularized: bool,

    /// Grid targets that produced no frontier portfolio.
    #[serde(default)]
    pub skipped_targets: usize,
}

/// Standalone statistics of one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetRecord {
    /// Asset ticker.
    pub ticker: String,

    /// Mean per-period return.
    pub expected_return: f64,

    /// Per-period volatility.
    pub risk: f64,
}

/// A portfolio keyed by ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioRecord {
    /// Weight of every ticker.
    pub weights: BTreeMap<String, f64>,

    /// Expected per-period return.
    pub expected_return: f64,

    /// Per-period volatility.
    pub risk: f64,
}

impl PortfolioRecord {
    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.weights.values().sum()
    }
}

/// The complete output document of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontierReport {
    /// Inputs and diagnostics.
    pub metadata: ReportMetadata,

    /// Per-asset statistics.
    pub assets: Vec<AssetRecord>,

    /// Sampled portfolio cloud.
    pub portfolios: Vec<PortfolioRecord>,

    /// Efficient frontier, ascending by risk.
    pub efficient_frontier: Vec<PortfolioRecord>,
}

impl FrontierReport {
    /// Parse a report previously written as JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec![
            "section".to_string(),
            "label".to_string(),
            "expected_return".to_string(),
            "risk".to_string(),
        ];
        header.extend(self.metadata.tickers.iter().cloned());
        wtr.write_record(&header)?;

        for (index, asset) in self.assets.iter().enumerate() {
            let mut record = vec![
                "asset".to_string(),
                asset.ticker.clone(),
                asset.expected_return.to_string(),
                asset.risk.to_string(),
            ];
            record.extend(
                (0..self.metadata.tickers.len())
                    .map(|i| if i == index { "1" } else { "0" }.to_string()),
            );
            wtr.write_record(&record)?;
        }

        let sections = [
            ("portfolio", &self.portfolios),
            ("frontier", &self.efficient_frontier),
        ];
        for (section, points) in sections {
            for (index, point) in points.iter().enumerate() {
                let mut record = vec![
                    section.to_string(),
                    index.to_string(),
                    point.expected_return.to_string(),
                    point.risk.to_string(),
                ];
                record.extend(self.metadata.tickers.iter().map(|ticker| {
                    point
                        .weights
                        .get(ticker)
                        .copied()
                        .unwrap_or(0.0)
                        .to_string()
                }));
                wtr.write_record(&record)?;
            }
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Write the data to any writer in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    fn export_to_writer<W: Write>(&self, writer: W, format: ExportFormat) -> Result<()>;

    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        let mut buffer = Vec::new();
        self.export_to_writer(&mut buffer, format)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Export data to a file, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, directory creation or file writing
    /// fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.export_to_writer(&mut writer, format)?;
        writer.flush()?;
        Ok(())
    }
}

impl Exporter for FrontierReport {
    fn export_to_writer<W: Write>(&self, mut writer: W, format: ExportFormat) -> Result<()> {
        match format {
            ExportFormat::Json => serde_json::to_writer(&mut writer, self)?,
            ExportFormat::PrettyJson => serde_json::to_writer_pretty(&mut writer, self)?,
            ExportFormat::Csv => return self.write_csv(writer),
        }
        writer.flush()?;
        Ok(())
    }
}

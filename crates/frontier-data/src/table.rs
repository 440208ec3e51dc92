//! CSV price table loading
//!
//! Two layouts are accepted:
//!
//! * Multi-header exports with three header rows: metric names (`Close`,
//!   `Open`, ...), ticker symbols, then a label row naming the date column.
//!   Only the `Close` columns are read.
//! * Wide tables with a single `Date,AAA,BBB,...` header where every column
//!   after the first is a close price.
//!
//! Empty cells and `NaN` are treated as missing quotes.

use crate::error::{DataError, Result};
use crate::returns::PriceSeries;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Metric name of the close price column in multi-header exports.
const CLOSE_METRIC: &str = "Close";

/// Close prices for a set of tickers plus the raw row count of the source.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    series: Vec<PriceSeries>,
    raw_rows: usize,
}

impl PriceTable {
    /// Create a price table.
    pub const fn new(series: Vec<PriceSeries>, raw_rows: usize) -> Self {
        Self { series, raw_rows }
    }

    /// Per-ticker price series, sorted by ticker.
    pub fn series(&self) -> &[PriceSeries] {
        &self.series
    }

    /// Number of non-empty data rows in the source.
    pub const fn raw_rows(&self) -> usize {
        self.raw_rows
    }

    /// Ticker symbols in table order.
    pub fn tickers(&self) -> Vec<&str> {
        self.series.iter().map(PriceSeries::ticker).collect()
    }
}

/// Read a price table from a CSV file.
pub fn read_price_table_path(path: impl AsRef<Path>) -> Result<PriceTable> {
    let file = File::open(path.as_ref())?;
    read_price_table(file)
}

/// Read a price table from any CSV source.
pub fn read_price_table<R: Read>(reader: R) -> Result<PriceTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let records = csv_reader
        .records()
        .collect::<std::result::Result<Vec<StringRecord>, csv::Error>>()?;

    if records.is_empty() {
        return Err(DataError::Parse("CSV file is empty".to_string()));
    }

    let wide = records.len() >= 2 && parse_date(records[1].get(0).unwrap_or("")).is_some();
    let (columns, data_start) = if wide {
        (wide_columns(&records[0])?, 1)
    } else {
        if records.len() < 3 {
            return Err(DataError::Parse(
                "CSV file is missing header rows".to_string(),
            ));
        }
        (multi_header_columns(&records[0], &records[1])?, 3)
    };

    if columns.is_empty() {
        return Err(DataError::NoAssets);
    }

    let mut prices: BTreeMap<String, BTreeMap<NaiveDate, Option<f64>>> = BTreeMap::new();
    for (_, ticker) in &columns {
        if prices.insert(ticker.clone(), BTreeMap::new()).is_some() {
            return Err(DataError::DuplicateTicker(ticker.clone()));
        }
    }

    let mut raw_rows = 0;
    for (offset, record) in records.iter().enumerate().skip(data_start) {
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        raw_rows += 1;
        let line = offset + 1;

        let date_cell = record.get(0).unwrap_or("").trim();
        let date = parse_date(date_cell).ok_or_else(|| {
            DataError::Parse(format!("row {}: invalid date '{}'", line, date_cell))
        })?;

        for (column, ticker) in &columns {
            let cell = record.get(*column).unwrap_or("").trim();
            let value = parse_price(cell).ok_or_else(|| {
                DataError::Parse(format!(
                    "row {}, column {}: invalid price '{}'",
                    line, column, cell
                ))
            })?;

            let series = prices
                .get_mut(ticker)
                .ok_or_else(|| DataError::Parse(format!("unknown ticker {}", ticker)))?;
            if series.insert(date, value).is_some() {
                return Err(DataError::Parse(format!(
                    "row {}: duplicate date {} for {}",
                    line, date, ticker
                )));
            }
        }
    }

    debug!(tickers = prices.len(), raw_rows, wide, "loaded price table");

    let series = prices
        .into_iter()
        .map(|(ticker, p)| PriceSeries::new(ticker, p))
        .collect();

    Ok(PriceTable::new(series, raw_rows))
}

fn wide_columns(header: &StringRecord) -> Result<Vec<(usize, String)>> {
    header
        .iter()
        .enumerate()
        .skip(1)
        .map(|(idx, name)| {
            let ticker = name.trim();
            if ticker.is_empty() {
                Err(DataError::Parse(format!("Empty ticker in header column {}", idx)))
            } else {
                Ok((idx, ticker.to_string()))
            }
        })
        .collect()
}

fn multi_header_columns(
    metrics: &StringRecord,
    tickers: &StringRecord,
) -> Result<Vec<(usize, String)>> {
    let mut columns = Vec::new();
    for (idx, metric) in metrics.iter().enumerate().skip(1) {
        let metric = metric.trim();
        let ticker = tickers.get(idx).unwrap_or("").trim();
        if metric.is_empty() {
            return Err(DataError::Parse(format!("Empty metric in header column {}", idx)));
        }
        if ticker.is_empty() {
            return Err(DataError::Parse(format!("Empty ticker in header column {}", idx)));
        }
        if metric == CLOSE_METRIC {
            columns.push((idx, ticker.to_string()));
        }
    }
    Ok(columns)
}

/// Parse `YYYY-MM-DD`, tolerating a trailing time component.
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .or_else(|| cell.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// `Some(None)` for a missing quote, `None` for an unparsable cell.
fn parse_price(cell: &str) -> Option<Option<f64>> {
    if cell.is_empty() {
        return Some(None);
    }
    let value: f64 = cell.parse().ok()?;
    Some(if value.is_nan() { None } else { Some(value) })
}

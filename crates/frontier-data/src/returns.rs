//! Return calculation
//!
//! Converts per-ticker price series into simple daily returns on a strictly
//! aligned calendar. A date contributes only if every ticker has a quote on
//! it; nothing is forward-filled.
//!
//! The return for date t is:
//! r_t = (p_t - p_{t-1}) / p_{t-1}
//!
//! where t-1 is the previous date of the aligned calendar, not the previous
//! calendar day.

use crate::error::{DataError, Result};
use crate::table::PriceTable;
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Minimum number of aligned dates needed to produce one return.
pub const MIN_ALIGNED_DATES: usize = 2;

/// Daily close prices for a single ticker.
///
/// `None` (or `NaN`) marks a date on which the ticker has no quote.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    prices: BTreeMap<NaiveDate, Option<f64>>,
}

impl PriceSeries {
    /// Create a price series from a date-keyed map.
    pub fn new(ticker: impl Into<String>, prices: BTreeMap<NaiveDate, Option<f64>>) -> Self {
        Self {
            ticker: ticker.into(),
            prices,
        }
    }

    /// Create a price series from `(date, price)` pairs where every price is present.
    pub fn from_quotes(
        ticker: impl Into<String>,
        quotes: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self::new(
            ticker,
            quotes.into_iter().map(|(d, p)| (d, Some(p))).collect(),
        )
    }

    /// Ticker symbol.
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// All dates with their (possibly absent) prices.
    pub const fn prices(&self) -> &BTreeMap<NaiveDate, Option<f64>> {
        &self.prices
    }

    /// Price on a date, if quoted.
    pub fn price(&self, date: NaiveDate) -> Option<f64> {
        self.prices.get(&date).copied().flatten().filter(|p| !p.is_nan())
    }

    /// Dates on which the ticker has a quote.
    fn quoted_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.prices
            .iter()
            .filter(|(_, p)| matches!(p, Some(v) if !v.is_nan()))
            .map(|(d, _)| *d)
    }
}

/// Aligned daily returns for a set of assets.
///
/// Rows are dates, columns are assets in `tickers` order. Every column shares
/// the same dates, so the series can be used together for covariance estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    returns: Array2<f64>,
    raw_rows: usize,
}

impl ReturnSeries {
    /// Build a return series from pre-aligned data.
    ///
    /// # Arguments
    /// * `tickers` - Asset names, one per column
    /// * `dates` - Observation dates, one per row, strictly increasing
    /// * `returns` - Return matrix (T x N)
    /// * `raw_rows` - Row count of the source table before alignment
    pub fn new(
        tickers: Vec<String>,
        dates: Vec<NaiveDate>,
        returns: Array2<f64>,
        raw_rows: usize,
    ) -> Result<Self> {
        if tickers.is_empty() {
            return Err(DataError::NoAssets);
        }
        check_unique(tickers.iter().map(String::as_str))?;

        let (n_periods, n_assets) = returns.dim();
        if n_assets != tickers.len() {
            return Err(DataError::Parse(format!(
                "return matrix has {} columns for {} tickers",
                n_assets,
                tickers.len()
            )));
        }
        if n_periods != dates.len() {
            return Err(DataError::Parse(format!(
                "return matrix has {} rows for {} dates",
                n_periods,
                dates.len()
            )));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DataError::Parse(
                "return dates must be strictly increasing".to_string(),
            ));
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(DataError::Parse("return matrix contains non-finite values".to_string()));
        }

        Ok(Self {
            tickers,
            dates,
            returns,
            raw_rows,
        })
    }

    /// Asset tickers in column order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Observation dates in row order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return matrix (T x N).
    pub const fn returns(&self) -> &Array2<f64> {
        &self.returns
    }

    /// Returns of a single asset.
    pub fn asset(&self, index: usize) -> ArrayView1<'_, f64> {
        self.returns.column(index)
    }

    /// Number of assets (N).
    pub fn n_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Number of aligned return observations (T).
    pub fn n_observations(&self) -> usize {
        self.dates.len()
    }

    /// Row count of the source data before alignment.
    pub const fn raw_rows(&self) -> usize {
        self.raw_rows
    }
}

/// Simple percentage return calculator on a strictly aligned calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnCalculator;

impl ReturnCalculator {
    /// Create a new calculator.
    pub const fn new() -> Self {
        Self
    }

    /// Compute returns from a loaded price table, keeping its raw row count.
    pub fn compute_table(&self, table: &PriceTable) -> Result<ReturnSeries> {
        let mut series = self.compute(table.series())?;
        series.raw_rows = table.raw_rows();
        Ok(series)
    }

    /// Compute aligned simple returns.
    ///
    /// The raw row count is the number of distinct dates across all series.
    ///
    /// # Errors
    /// * `NoAssets` / `DuplicateTicker` for an invalid universe
    /// * `DegenerateAsset` if any quoted price is zero, negative or infinite
    /// * `InsufficientData` if fewer than two dates are quoted by every ticker
    pub fn compute(&self, series: &[PriceSeries]) -> Result<ReturnSeries> {
        if series.is_empty() {
            return Err(DataError::NoAssets);
        }
        check_unique(series.iter().map(PriceSeries::ticker))?;

        for s in series {
            for (date, price) in s.prices() {
                if let Some(p) = *price {
                    if !p.is_nan() && (p <= 0.0 || p.is_infinite()) {
                        return Err(DataError::DegenerateAsset {
                            ticker: s.ticker.clone(),
                            date: *date,
                            price: p,
                        });
                    }
                }
            }
        }

        let calendar = aligned_calendar(series);
        let raw_rows = series
            .iter()
            .flat_map(|s| s.prices.keys().copied())
            .collect::<BTreeSet<_>>()
            .len();

        debug!(
            assets = series.len(),
            raw_rows,
            aligned = calendar.len(),
            "aligned price calendar"
        );

        if calendar.len() < MIN_ALIGNED_DATES {
            return Err(DataError::InsufficientData {
                required: MIN_ALIGNED_DATES,
                actual: calendar.len(),
            });
        }

        let n_periods = calendar.len() - 1;
        let mut returns = Array2::<f64>::zeros((n_periods, series.len()));

        for (j, s) in series.iter().enumerate() {
            let mut previous = s.price(calendar[0]).ok_or_else(|| missing(s, calendar[0]))?;
            for (t, &date) in calendar.iter().enumerate().skip(1) {
                let current = s.price(date).ok_or_else(|| missing(s, date))?;
                returns[[t - 1, j]] = (current - previous) / previous;
                previous = current;
            }
        }

        Ok(ReturnSeries {
            tickers: series.iter().map(|s| s.ticker.clone()).collect(),
            dates: calendar[1..].to_vec(),
            returns,
            raw_rows,
        })
    }
}

/// Sorted dates on which every series has a quote.
fn aligned_calendar(series: &[PriceSeries]) -> Vec<NaiveDate> {
    let mut iter = series.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut common: BTreeSet<NaiveDate> = first.quoted_dates().collect();
    for s in iter {
        let dates: BTreeSet<NaiveDate> = s.quoted_dates().collect();
        common = common.intersection(&dates).copied().collect();
    }

    common.into_iter().collect()
}

fn check_unique<'a>(tickers: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = BTreeSet::new();
    for ticker in tickers {
        if !seen.insert(ticker) {
            return Err(DataError::DuplicateTicker(ticker.to_string()));
        }
    }
    Ok(())
}

fn missing(series: &PriceSeries, date: NaiveDate) -> DataError {
    DataError::Parse(format!("{} has no quote on aligned date {}", series.ticker, date))
}

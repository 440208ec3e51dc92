#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod returns;
pub mod table;

pub use error::{DataError, Result};
pub use returns::{PriceSeries, ReturnCalculator, ReturnSeries};
pub use table::{PriceTable, read_price_table, read_price_table_path};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod error;
pub mod export;
pub mod summary;

pub use assemble::{ReportInputs, ResultAssembler};
pub use error::{OutputError, Result};
pub use export::{
    AssetRecord, ExportFormat, Exporter, FrontierReport, PortfolioRecord, ReportMetadata,
};
pub use summary::{AssetSummary, MarketSummary};

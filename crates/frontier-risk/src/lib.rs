#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod moments;

// Re-export main types
pub use covariance::{CovarianceEstimator, EstimationError, SampleCovarianceEstimator};
pub use moments::{MomentConfig, MomentEstimate, MomentEstimator};

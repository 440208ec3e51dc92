#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod optimizer;
pub mod portfolio;
pub mod sampler;

pub use error::{OptimizationError, Result};
pub use optimizer::{
    Diagnostic, Frontier, FrontierConfig, FrontierDiagnostics, FrontierOptimizer, FrontierResult,
    empirical_frontier, pareto_filter,
};
pub use portfolio::{Portfolio, WEIGHT_TOLERANCE};
pub use sampler::{PortfolioSampler, SamplerConfig, SamplingMethod};

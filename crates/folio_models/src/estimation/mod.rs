//! Estimation of annualised return statistics from historical data.
//!
//! - [`ReturnStatisticsEstimator`]: Sample mean, volatility and covariance
//!   from a [`ReturnSeries`](folio_core::ReturnSeries)
//! - [`ReturnStatistics`]: Validated, annualised estimates
//! - [`regularise_covariance`]: Diagonal loading of ill-conditioned
//!   covariance matrices

mod estimator;
mod regularisation;
mod statistics;

pub use estimator::{EstimatorConfig, ReturnStatisticsEstimator};
pub use regularisation::{load_to_condition, regularise_covariance, Regularisation};
pub use statistics::ReturnStatistics;

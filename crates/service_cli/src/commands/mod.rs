//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod check;
pub mod estimate;
pub mod optimise;
pub mod rebalance;
pub mod risk;
pub mod simulate;

use folio_core::{EngineConfig, ReturnSeries};
use folio_models::{EstimatorConfig, ReturnStatistics, ReturnStatisticsEstimator};
use tracing::warn;

use crate::Result;

/// Estimates return statistics with the configured observation and
/// conditioning limits.
pub(crate) fn estimate_statistics(
    series: &ReturnSeries,
    config: &EngineConfig,
) -> Result<ReturnStatistics> {
    let estimator = ReturnStatisticsEstimator::new(EstimatorConfig::from(config));
    let stats = estimator.estimate(series)?;
    if stats.is_regularised() {
        warn!("Covariance matrix was ill-conditioned and has been regularised");
    }
    Ok(stats)
}

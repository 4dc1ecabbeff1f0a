//! Estimate command implementation
//!
//! Annualised mean returns, volatilities and covariance from history.

use folio_core::EngineConfig;
use tracing::info;

use super::estimate_statistics;
use crate::input::SeriesArgs;
use crate::output::OutputArgs;
use crate::Result;

/// Run the estimate command
pub fn run(series: &SeriesArgs, output: &OutputArgs, config: &EngineConfig) -> Result<()> {
    let history = series.load()?;
    let stats = estimate_statistics(&history, config)?;
    info!("Estimated statistics for {} assets", stats.n_assets());
    output.emit(&stats)
}

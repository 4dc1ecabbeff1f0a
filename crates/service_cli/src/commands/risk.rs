//! Risk command implementation
//!
//! Historical risk metrics of a constant-mix portfolio.

use folio_core::EngineConfig;
use folio_risk::RiskMetricsCalculator;
use tracing::info;

use crate::input::SeriesArgs;
use crate::output::OutputArgs;
use crate::Result;

/// Run the risk command
pub fn run(
    series: &SeriesArgs,
    weights: &[f64],
    output: &OutputArgs,
    config: &EngineConfig,
) -> Result<()> {
    let history = series.load()?;
    let metrics = RiskMetricsCalculator::from_config(config)?.for_series(&history, weights)?;
    if metrics.is_undefined() {
        info!("Too few observations for risk metrics");
    }
    output.emit(&metrics)
}

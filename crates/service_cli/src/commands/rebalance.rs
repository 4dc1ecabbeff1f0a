//! Rebalance command implementation
//!
//! Replays a drift-triggered rebalancing rule over history and scores it
//! against buy-and-hold.

use folio_core::EngineConfig;
use folio_risk::RebalancingTimingAnalyzer;
use tracing::info;

use crate::input::SeriesArgs;
use crate::output::OutputArgs;
use crate::Result;

/// Run the rebalance command
pub fn run(
    series: &SeriesArgs,
    weights: Vec<f64>,
    initial_value: f64,
    output: &OutputArgs,
    config: &EngineConfig,
) -> Result<()> {
    let history = series.load()?;
    let analyzer =
        RebalancingTimingAnalyzer::from_config(weights, config)?.with_initial_value(initial_value)?;
    let recommendation = analyzer.analyze(&history)?;
    info!(
        "{} rebalances over {:.1} years ({} suppressed)",
        recommendation.rebalance_count(),
        recommendation.years,
        recommendation.suppressed_breaches.len()
    );
    output.emit(&recommendation)
}

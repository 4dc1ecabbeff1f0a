//! Simulate command implementation
//!
//! Projects portfolio value with correlated GBM paths, applying
//! contributions and drift-triggered rebalancing.

use folio_core::{EngineConfig, Frequency};
use folio_models::Contribution;
use folio_simulation::{run_simulation, SimulationParameters};
use tracing::info;

use super::estimate_statistics;
use crate::input::SeriesArgs;
use crate::output::OutputArgs;
use crate::Result;

/// Simulation settings beyond the engine configuration.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Target weights, in file column order
    pub weights: Vec<f64>,
    /// Starting portfolio value
    pub initial_value: f64,
    /// Periodic contribution amount
    pub contribution: Option<f64>,
    /// Contribution frequency
    pub contribution_frequency: Frequency,
    /// Disable rebalancing
    pub no_rebalance: bool,
    /// Spacing of reported time points
    pub record: Frequency,
}

/// Run the simulate command
pub fn run(
    series: &SeriesArgs,
    options: SimulateOptions,
    output: &OutputArgs,
    config: &EngineConfig,
) -> Result<()> {
    let history = series.load()?;
    let stats = estimate_statistics(&history, config)?;

    let mut builder = SimulationParameters::builder_from_config(config)
        .symbols(stats.symbols().to_vec())
        .target_weights(options.weights)
        .initial_value(options.initial_value)
        .recording_frequency(options.record);
    if let Some(amount) = options.contribution {
        builder = builder.contribution(Contribution::new(amount, options.contribution_frequency)?);
    }
    if options.no_rebalance {
        builder = builder.no_rebalancing();
    }
    let params = builder.build()?;

    info!(
        "Simulating {} paths over {} years",
        params.simulation_count(),
        params.horizon_years()
    );
    let result = run_simulation(params, &stats)?;
    info!(
        "Median terminal value {:.2} (seed {})",
        result.terminal.percentiles.p50, result.seed
    );
    output.emit(&result)
}

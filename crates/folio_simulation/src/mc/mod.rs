//! Monte Carlo path simulation.
//!
//! This module provides:
//! - `params`: Validated [`SimulationParameters`] with a fluent builder
//! - `simulator`: [`CorrelatedPathSimulator`] running correlated GBM paths
//!   under the contribution and rebalancing policy
//! - `aggregator`: [`PercentileAggregator`] reducing the ensemble to
//!   percentile bands and a terminal summary
//! - `result`: [`SimulationResult`]
//!
//! # Re-exports
//!
//! All public types of the submodules.

pub mod aggregator;
pub mod params;
pub mod result;
pub mod simulator;

pub use aggregator::{summarise, PercentileAggregator, PercentileBand, TerminalSummary, PERCENTILES};
pub use params::{SimulationParameters, SimulationParametersBuilder};
pub use result::{PolicySummary, SimulationResult};
pub use simulator::{run_simulation, CorrelatedPathSimulator};

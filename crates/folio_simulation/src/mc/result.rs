//! Simulation output.

use super::aggregator::{PercentileBand, TerminalSummary};
use folio_risk::RiskMetrics;
use serde::{Deserialize, Serialize};

/// Per-path averages of the contribution and rebalancing activity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicySummary {
    /// Mean executed rebalances per path
    pub mean_executed_rebalances: f64,
    /// Mean threshold breaches per path that were not acted upon
    pub mean_suppressed_breaches: f64,
    /// Mean cumulative transaction cost per path
    pub mean_transaction_cost: f64,
    /// External cash contributed per path
    pub contributed_per_path: f64,
}

/// Result of one simulation run.
///
/// Portfolio values include contributions. Risk metrics are computed on the
/// wealth index, which excludes contributions so that cash injections are
/// not mistaken for returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Asset symbols
    pub symbols: Vec<String>,
    /// Number of simulated paths
    pub simulation_count: usize,
    /// Steps per path
    pub total_steps: usize,
    /// Simulation steps per year
    pub periods_per_year: u32,
    /// Base seed the run used (drawn when none was supplied)
    pub seed: u64,
    /// Recorded time points in years, starting at 0
    pub time_points: Vec<f64>,
    /// Percentile band of the portfolio value per time point
    pub bands: Vec<PercentileBand>,
    /// Terminal value distribution
    pub terminal: TerminalSummary,
    /// Ensemble risk metrics
    pub risk_metrics: RiskMetrics,
    /// Contribution and rebalancing activity
    pub policy: PolicySummary,
    /// Whether the covariance had to be regularised
    pub covariance_regularised: bool,
}

impl SimulationResult {
    /// Median path of portfolio values, one per time point.
    pub fn median_path(&self) -> Vec<f64> {
        self.bands.iter().map(|b| b.p50).collect()
    }

    /// Band at the last recorded time point.
    pub fn terminal_band(&self) -> &PercentileBand {
        &self.terminal.percentiles
    }
}

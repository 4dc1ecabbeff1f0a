//! Rebalancing analysis output.

use chrono::NaiveDate;
use folio_models::RebalanceAction;
use serde::{Deserialize, Serialize};

/// A drift threshold breach that did not lead to a rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreachRecord {
    /// Observation index
    pub index: usize,
    /// Observation date, when the series carries dates
    pub date: Option<NaiveDate>,
    /// Maximum absolute weight drift at the breach
    pub drift: f64,
    /// Why the breach was not acted upon
    pub action: RebalanceAction,
}

/// Recommended rebalance points along a path and their estimated value
/// against an unrebalanced control portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingRecommendation {
    /// Observations analysed
    pub observations: usize,
    /// Length of the analysed period in years
    pub years: f64,
    /// Observation indices at which a rebalance is recommended
    pub rebalance_indices: Vec<usize>,
    /// Dates of the recommended rebalances, when the series carries dates
    pub rebalance_dates: Option<Vec<NaiveDate>>,
    /// Maximum absolute weight drift at each recommended rebalance
    pub drift_at_rebalance: Vec<f64>,
    /// Breaches suppressed by the yearly cap or the final-period rule
    pub suppressed_breaches: Vec<BreachRecord>,
    /// Mean over periods of the maximum asset drift, rebalanced portfolio
    pub average_drift: f64,
    /// Mean over periods of the maximum asset drift, control portfolio
    pub control_average_drift: f64,
    /// Cumulative transaction cost in currency units
    pub total_transaction_cost: f64,
    /// `(σ_control − σ_rebalanced) · years / (cost / initial value)`;
    /// `None` when no cost was incurred
    pub cost_benefit_ratio: Option<f64>,
    /// `Sharpe(rebalanced) − Sharpe(control)`
    pub sharpe_improvement: Option<f64>,
    /// Annualised Sharpe ratio of the rebalanced portfolio
    pub rebalanced_sharpe: Option<f64>,
    /// Annualised Sharpe ratio of the control portfolio
    pub control_sharpe: Option<f64>,
    /// Annualised volatility of the rebalanced portfolio
    pub rebalanced_volatility: Option<f64>,
    /// Annualised volatility of the control portfolio
    pub control_volatility: Option<f64>,
    /// Terminal value of the rebalanced portfolio
    pub final_value: f64,
    /// Terminal value of the control portfolio
    pub control_final_value: f64,
}

impl RebalancingRecommendation {
    /// Number of recommended rebalances.
    #[inline]
    pub fn rebalance_count(&self) -> usize {
        self.rebalance_indices.len()
    }

    /// Returns `true` when at least one rebalance is recommended.
    #[inline]
    pub fn recommends_rebalancing(&self) -> bool {
        !self.rebalance_indices.is_empty()
    }
}

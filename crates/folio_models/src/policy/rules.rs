//! Contribution schedule and rebalancing rule parameters.

use folio_core::{EngineConfig, Frequency, ValidationError};
use serde::{Deserialize, Serialize};

/// Periodic external cash injection.
///
/// The amount is invested according to the target weights each time the
/// schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Cash added per event
    pub amount: f64,
    /// Event frequency
    pub frequency: Frequency,
}

impl Contribution {
    /// Creates a validated contribution schedule.
    pub fn new(amount: f64, frequency: Frequency) -> Result<Self, ValidationError> {
        let c = Self { amount, frequency };
        c.validate()?;
        Ok(c)
    }

    /// Checks that the amount is finite and non-negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ValidationError::out_of_range(
                "contribution.amount",
                format!("must be finite and >= 0, got {}", self.amount),
            ));
        }
        Ok(())
    }

    /// Steps between contributions on a grid with `periods_per_year` steps.
    #[inline]
    pub fn interval(&self, periods_per_year: u32) -> usize {
        self.frequency.interval_in_periods(periods_per_year)
    }
}

/// Drift-triggered rebalancing rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalancingRule {
    /// Whether rebalancing is active
    pub enabled: bool,
    /// Absolute weight drift that triggers a rebalance, in `(0, 1]`
    pub drift_threshold: f64,
    /// Cost as a fraction of the portfolio value being rebalanced, in `[0, 1)`
    pub transaction_cost: f64,
    /// Executed rebalances allowed per simulated year
    pub max_rebalances_per_year: u32,
}

impl Default for RebalancingRule {
    fn default() -> Self {
        Self {
            enabled: true,
            drift_threshold: 0.05,
            transaction_cost: 0.001,
            max_rebalances_per_year: 4,
        }
    }
}

impl From<&EngineConfig> for RebalancingRule {
    fn from(config: &EngineConfig) -> Self {
        Self {
            enabled: true,
            drift_threshold: config.drift_threshold,
            transaction_cost: config.transaction_cost,
            max_rebalances_per_year: config.max_rebalances_per_year,
        }
    }
}

impl RebalancingRule {
    /// A rule that never rebalances.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Checks the threshold and cost ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.drift_threshold > 0.0 && self.drift_threshold <= 1.0) {
            return Err(ValidationError::out_of_range(
                "drift_threshold",
                format!("must be in (0, 1], got {}", self.drift_threshold),
            ));
        }
        if !(self.transaction_cost >= 0.0 && self.transaction_cost < 1.0) {
            return Err(ValidationError::out_of_range(
                "transaction_cost",
                format!("must be in [0, 1), got {}", self.transaction_cost),
            ));
        }
        Ok(())
    }
}

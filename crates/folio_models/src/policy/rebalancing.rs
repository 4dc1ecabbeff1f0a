//! Contribution and drift-triggered rebalancing applied step by step.

use super::book::PortfolioBook;
use super::rules::{Contribution, RebalancingRule};
use folio_core::{validate_weights, ValidationError};
use serde::{Deserialize, Serialize};

/// What happened to a threshold breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceAction {
    /// Holdings were reset to target weights.
    Executed,
    /// The yearly rebalance cap was already reached.
    SuppressedByCap,
    /// The breach occurred in the final period of the horizon.
    SuppressedFinalPeriod,
}

impl RebalanceAction {
    /// Returns `true` for [`RebalanceAction::Executed`].
    #[inline]
    pub fn is_executed(&self) -> bool {
        matches!(self, RebalanceAction::Executed)
    }
}

/// A recorded drift threshold breach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebalanceEvent {
    /// Zero-based step index
    pub step: usize,
    /// Maximum absolute weight drift at the breach
    pub drift: f64,
    /// Outcome of the breach
    pub action: RebalanceAction,
    /// Transaction cost charged (zero unless executed)
    pub cost: f64,
}

/// Result of applying the policy to one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepOutcome {
    /// Cash contributed at this step
    pub contributed: f64,
    /// Threshold breach, if any
    pub event: Option<RebalanceEvent>,
}

/// Applies periodic contributions and drift-triggered rebalancing to a
/// [`PortfolioBook`] after each step of price evolution.
///
/// Per step, in order:
/// 1. A contribution is added when `(step + 1) % interval == 0`.
/// 2. If rebalancing is enabled and the maximum absolute weight drift is
///    strictly above the threshold, the breach is recorded. It is executed
///    unless the yearly cap is exhausted or the step is the last of the
///    horizon. The cap resets whenever `step / periods_per_year` advances.
///
/// # Examples
///
/// ```
/// use folio_models::{ContributionRebalancingPolicy, PortfolioBook, RebalanceAction, RebalancingRule};
///
/// let rule = RebalancingRule { transaction_cost: 0.0, ..Default::default() };
/// let policy = ContributionRebalancingPolicy::new(vec![0.5, 0.5], None, Some(rule), 12, 24).unwrap();
///
/// let mut book = policy.open_book(1000.0);
/// book.apply_simple_returns(&[0.5, 0.0]);
/// let outcome = policy.apply(&mut book, 0);
/// assert_eq!(outcome.event.unwrap().action, RebalanceAction::Executed);
/// assert!(book.max_drift(&[0.5, 0.5]) < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRebalancingPolicy {
    target_weights: Vec<f64>,
    contribution: Option<Contribution>,
    contribution_interval: usize,
    rule: Option<RebalancingRule>,
    periods_per_year: u32,
    total_steps: usize,
}

impl ContributionRebalancingPolicy {
    /// Creates a validated policy.
    ///
    /// `total_steps` is the horizon length; a breach at step
    /// `total_steps − 1` is recorded but never executed. A rule with
    /// `enabled = false` is equivalent to `None`.
    pub fn new(
        target_weights: Vec<f64>,
        contribution: Option<Contribution>,
        rule: Option<RebalancingRule>,
        periods_per_year: u32,
        total_steps: usize,
    ) -> Result<Self, ValidationError> {
        if target_weights.is_empty() {
            return Err(ValidationError::EmptySymbols);
        }
        validate_weights(&target_weights, target_weights.len())?;
        if periods_per_year == 0 {
            return Err(ValidationError::out_of_range(
                "periods_per_year",
                "must be positive",
            ));
        }
        if let Some(c) = &contribution {
            c.validate()?;
        }
        if let Some(r) = &rule {
            r.validate()?;
        }

        Ok(Self {
            contribution_interval: contribution
                .as_ref()
                .map_or(usize::MAX, |c| c.interval(periods_per_year)),
            target_weights,
            contribution,
            rule: rule.filter(|r| r.enabled),
            periods_per_year,
            total_steps,
        })
    }

    /// Target allocation.
    #[inline]
    pub fn target_weights(&self) -> &[f64] {
        &self.target_weights
    }

    /// Active rebalancing rule, if enabled.
    #[inline]
    pub fn rule(&self) -> Option<&RebalancingRule> {
        self.rule.as_ref()
    }

    /// Contribution schedule, if any.
    #[inline]
    pub fn contribution(&self) -> Option<&Contribution> {
        self.contribution.as_ref()
    }

    /// Horizon length in steps.
    #[inline]
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Opens a book at target weights.
    pub fn open_book(&self, initial_value: f64) -> PortfolioBook {
        PortfolioBook::new(initial_value, &self.target_weights)
    }

    /// Applies contribution and rebalancing for `step` to `book`.
    pub fn apply(&self, book: &mut PortfolioBook, step: usize) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        if let Some(c) = &self.contribution {
            if (step + 1) % self.contribution_interval == 0 && c.amount > 0.0 {
                book.contribute(c.amount, &self.target_weights);
                outcome.contributed = c.amount;
            }
        }

        let Some(rule) = &self.rule else {
            return outcome;
        };

        let year = step / self.periods_per_year as usize;
        if year != book.current_year {
            book.current_year = year;
            book.rebalances_this_year = 0;
        }

        let drift = book.max_drift(&self.target_weights);
        if drift <= rule.drift_threshold {
            return outcome;
        }

        let action = if step + 1 >= self.total_steps {
            RebalanceAction::SuppressedFinalPeriod
        } else if book.rebalances_this_year >= rule.max_rebalances_per_year {
            RebalanceAction::SuppressedByCap
        } else {
            RebalanceAction::Executed
        };

        let cost = if action.is_executed() {
            book.rebalances_this_year += 1;
            book.rebalance_to(&self.target_weights, rule.transaction_cost)
        } else {
            book.record_suppressed();
            0.0
        };

        outcome.event = Some(RebalanceEvent {
            step,
            drift,
            action,
            cost,
        });
        outcome
    }
}

//! Optimisation outcomes.
//!
//! Solver failures are data, not errors: [`OptimizationOutcome::Failed`]
//! carries the attempted objective, a reason code and per-constraint
//! diagnostics so the caller can decide whether to relax the request.

use crate::request::Objective;
use folio_models::ReturnStatistics;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Volatility below which the Sharpe ratio is reported as zero.
pub const ZERO_VOLATILITY: f64 = 1e-12;

pub(crate) fn sharpe(expected_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility <= ZERO_VOLATILITY {
        0.0
    } else {
        (expected_return - risk_free_rate) / volatility
    }
}

/// One point of an efficient frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Target return the point was solved for
    pub target_return: f64,
    /// Achieved expected return
    pub expected_return: f64,
    /// Portfolio volatility
    pub volatility: f64,
    /// Sharpe ratio against the request's risk-free rate
    pub sharpe_ratio: f64,
    /// Portfolio weights
    pub weights: Vec<f64>,
}

/// A solved allocation.
///
/// Weights sum to one and lie within the requested bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Objective that was solved
    pub objective: Objective,
    /// Asset symbols
    pub symbols: Vec<String>,
    /// Optimal weights; the max-Sharpe frontier point for frontier requests
    pub weights: Vec<f64>,
    /// Annualised expected return `wᵀμ`
    pub expected_return: f64,
    /// Annualised volatility `√(wᵀΣw)`
    pub volatility: f64,
    /// `(wᵀμ − rf) / σ`, or 0 when the volatility is zero
    pub sharpe_ratio: f64,
    /// Projected gradient steps across all sub-problems
    pub iterations: usize,
    /// Frontier points ordered by target return
    pub frontier: Option<Vec<FrontierPoint>>,
}

impl OptimizationResult {
    pub(crate) fn from_weights(
        objective: Objective,
        stats: &ReturnStatistics,
        weights: Vec<f64>,
        risk_free_rate: f64,
        iterations: usize,
    ) -> Self {
        let expected_return = stats.expected_return(&weights);
        let volatility = stats.portfolio_volatility(&weights);
        Self {
            objective,
            symbols: stats.symbols().to_vec(),
            sharpe_ratio: sharpe(expected_return, volatility, risk_free_rate),
            weights,
            expected_return,
            volatility,
            iterations,
            frontier: None,
        }
    }

    /// Weight of `symbol`.
    pub fn weight_of(&self, symbol: &str) -> Option<f64> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.weights[i])
    }

    pub(crate) fn to_frontier_point(&self, target_return: f64) -> FrontierPoint {
        FrontierPoint {
            target_return,
            expected_return: self.expected_return,
            volatility: self.volatility,
            sharpe_ratio: self.sharpe_ratio,
            weights: self.weights.clone(),
        }
    }
}

/// Why an optimisation did not produce an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The solver stopped before reaching a stationary point
    NotConverged,
    /// Bounds, sector or turnover limits admit no portfolio
    InfeasibleConstraints,
    /// The target return lies outside the achievable range
    InfeasibleTarget,
    /// The objective became non-finite
    NumericalInstability,
}

impl FailureReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::NotConverged => "not_converged",
            FailureReason::InfeasibleConstraints => "infeasible_constraints",
            FailureReason::InfeasibleTarget => "infeasible_target",
            FailureReason::NumericalInstability => "numerical_instability",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// State of one constraint when an optimisation failed.
///
/// `value` is the constraint's value at the best iterate, or the required
/// level when no iterate exists (the budget of 1 against the achievable
/// range of the bounds, or the target against the achievable returns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDiagnostic {
    /// Constraint name: `budget`, `sector:<name>`, `turnover` or `target_return`
    pub constraint: String,
    /// Value of the constrained quantity
    pub value: f64,
    /// Lower limit, if any
    pub lower: Option<f64>,
    /// Upper limit, if any
    pub upper: Option<f64>,
    /// Distance outside the limits (0 when satisfied)
    pub violation: f64,
}

impl ConstraintDiagnostic {
    /// Diagnostic for `value` against `[lower, upper]`.
    pub fn new(
        constraint: impl Into<String>,
        value: f64,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Self {
        let below = lower.map_or(0.0, |lo| lo - value);
        let above = upper.map_or(0.0, |hi| value - hi);
        Self {
            constraint: constraint.into(),
            value,
            lower,
            upper,
            violation: below.max(above).max(0.0),
        }
    }

    /// Returns `true` when the violation exceeds `tol`.
    pub fn is_violated(&self, tol: f64) -> bool {
        self.violation > tol
    }
}

/// Structured optimisation failure.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{objective} failed ({reason}): {message}")]
pub struct OptimizationFailure {
    /// Objective that was attempted
    pub objective: Objective,
    /// Reason code
    pub reason: FailureReason,
    /// Human-readable detail
    pub message: String,
    /// Projected gradient steps spent before giving up
    pub iterations: usize,
    /// Constraint states at the point of failure
    pub diagnostics: Vec<ConstraintDiagnostic>,
}

/// Result of [`PortfolioOptimizer::optimise`](crate::PortfolioOptimizer::optimise).
///
/// # Examples
///
/// ```
/// use folio_optimiser::{FailureReason, Objective, OptimizationFailure, OptimizationOutcome};
///
/// let outcome = OptimizationOutcome::Failed(OptimizationFailure {
///     objective: Objective::MinVolatility,
///     reason: FailureReason::InfeasibleConstraints,
///     message: "lower bounds sum to 1.2 > 1".into(),
///     iterations: 0,
///     diagnostics: vec![],
/// });
/// let json = serde_json::to_value(&outcome).unwrap();
/// assert_eq!(json["status"], "failed");
/// assert_eq!(json["reason"], "infeasible_constraints");
/// assert!(outcome.result().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationOutcome {
    /// An allocation satisfying every constraint
    Solved(OptimizationResult),
    /// No allocation; see the reason and diagnostics
    Failed(OptimizationFailure),
}

impl OptimizationOutcome {
    /// Returns `true` for [`OptimizationOutcome::Solved`].
    pub fn is_solved(&self) -> bool {
        matches!(self, OptimizationOutcome::Solved(_))
    }

    /// The solved allocation, if any.
    pub fn result(&self) -> Option<&OptimizationResult> {
        match self {
            OptimizationOutcome::Solved(r) => Some(r),
            OptimizationOutcome::Failed(_) => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&OptimizationFailure> {
        match self {
            OptimizationOutcome::Solved(_) => None,
            OptimizationOutcome::Failed(f) => Some(f),
        }
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<OptimizationResult, OptimizationFailure> {
        self.into()
    }
}

impl From<Result<OptimizationResult, OptimizationFailure>> for OptimizationOutcome {
    fn from(value: Result<OptimizationResult, OptimizationFailure>) -> Self {
        match value {
            Ok(r) => OptimizationOutcome::Solved(r),
            Err(f) => OptimizationOutcome::Failed(f),
        }
    }
}

impl From<OptimizationOutcome> for Result<OptimizationResult, OptimizationFailure> {
    fn from(value: OptimizationOutcome) -> Self {
        match value {
            OptimizationOutcome::Solved(r) => Ok(r),
            OptimizationOutcome::Failed(f) => Err(f),
        }
    }
}

//! Portfolio optimiser entry point.

use crate::frontier;
use crate::lagrangian::{ALConfig, AugmentedLagrangian};
use crate::problem::{Allocation, Goal};
use crate::request::{Objective, OptimizationRequest};
use crate::result::{
    ConstraintDiagnostic, FailureReason, OptimizationFailure, OptimizationOutcome,
    OptimizationResult,
};
use folio_core::{AnalyticsResult, EngineConfig, SolverError, ValidationError};
use folio_models::ReturnStatistics;
use tracing::{debug, info, warn};

/// Default number of frontier points.
pub const DEFAULT_FRONTIER_POINTS: usize = 20;

/// Tolerance on target returns outside the achievable range.
const TARGET_TOLERANCE: f64 = 1e-10;

/// Optimiser settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    /// Frontier points when the request does not say
    pub frontier_points: usize,
    /// Augmented Lagrangian and inner solver settings
    pub solver: ALConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            frontier_points: DEFAULT_FRONTIER_POINTS,
            solver: ALConfig::default(),
        }
    }
}

impl From<&EngineConfig> for OptimizerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            frontier_points: config.frontier_points,
            ..Default::default()
        }
    }
}

/// Mean-variance optimiser over the long-only capped simplex.
///
/// Every objective is solved by projected gradient descent on
/// `{Σw = 1, lo ≤ w ≤ hi}` with Armijo backtracking. Return targets and
/// sector and turnover limits are handled by an augmented Lagrangian loop
/// around it.
///
/// # Examples
///
/// ```
/// use folio_core::math::linalg::SymmetricMatrix;
/// use folio_models::ReturnStatistics;
/// use folio_optimiser::{Objective, OptimizationRequest, PortfolioOptimizer};
///
/// let stats = ReturnStatistics::from_annualised(
///     vec!["EQ".into(), "BD".into()],
///     vec![0.08, 0.03],
///     SymmetricMatrix::diagonal(&[0.04, 0.01]),
/// )
/// .unwrap();
/// let request = OptimizationRequest::new(stats.symbols().to_vec(), Objective::MinVolatility);
/// let outcome = PortfolioOptimizer::with_defaults().optimise(&request, &stats).unwrap();
/// let result = outcome.result().unwrap();
/// assert!((result.weights[0] - 0.2).abs() < 1e-6);
/// assert!((result.weights[1] - 0.8).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioOptimizer {
    config: OptimizerConfig,
}

impl PortfolioOptimizer {
    /// Optimiser with the given settings.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Optimiser with default settings.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Optimiser configured from engine settings.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(OptimizerConfig::from(config))
    }

    /// Settings.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Solves `request` on `stats`.
    ///
    /// Solver trouble (infeasible constraints, unreachable targets,
    /// non-convergence) is returned as [`OptimizationOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// [`AnalyticsError::Validation`](folio_core::AnalyticsError::Validation)
    /// when the request is malformed or names a different universe than
    /// `stats`.
    pub fn optimise(
        &self,
        request: &OptimizationRequest,
        stats: &ReturnStatistics,
    ) -> AnalyticsResult<OptimizationOutcome> {
        request.validate()?;
        stats.ensure_symbols(&request.symbols)?;

        let objective = &request.objective;
        let allocation = match Allocation::new(request, stats) {
            Ok(a) => a,
            Err(err) => {
                let (lower, upper) = request.bound_vectors();
                let diagnostic = ConstraintDiagnostic::new(
                    "budget",
                    1.0,
                    Some(lower.iter().sum()),
                    Some(upper.iter().sum()),
                );
                let failure = failure(
                    objective,
                    FailureReason::InfeasibleConstraints,
                    err.to_string(),
                    0,
                    vec![diagnostic],
                );
                warn!(objective = %objective, "{}", failure.message);
                return Ok(OptimizationOutcome::Failed(failure));
            }
        };

        let rf = request.risk_free_rate;
        let solved = match objective.base() {
            Objective::MaxSharpe => {
                self.solve_goal(&allocation, objective, Goal::MaxSharpe { risk_free_rate: rf }, rf)
            }
            Objective::MinVolatility => {
                self.solve_goal(&allocation, objective, Goal::MinVariance, rf)
            }
            Objective::TargetReturn { target } => {
                self.solve_target(&allocation, objective, *target, rf)
            }
            Objective::EfficientFrontier { points } => frontier::trace(
                self,
                &allocation,
                objective,
                points.unwrap_or(self.config.frontier_points),
                rf,
            ),
            Objective::Constrained { .. } => {
                return Err(ValidationError::InvalidRequest(
                    "constrained objectives cannot be nested".into(),
                )
                .into())
            }
        };

        match &solved {
            Ok(result) => info!(
                objective = %objective,
                expected_return = result.expected_return,
                volatility = result.volatility,
                iterations = result.iterations,
                "optimisation solved"
            ),
            Err(failure) => warn!(
                objective = %objective,
                reason = %failure.reason,
                iterations = failure.iterations,
                "optimisation failed: {}",
                failure.message
            ),
        }
        Ok(solved.into())
    }

    pub(crate) fn solve_target(
        &self,
        allocation: &Allocation<'_>,
        objective: &Objective,
        target: f64,
        rf: f64,
    ) -> Result<OptimizationResult, OptimizationFailure> {
        let (low, high) = allocation.bound_return_range();
        if target < low - TARGET_TOLERANCE || target > high + TARGET_TOLERANCE {
            return Err(failure(
                objective,
                FailureReason::InfeasibleTarget,
                format!(
                    "target return {} outside achievable range [{:.6}, {:.6}]",
                    target, low, high
                ),
                0,
                vec![ConstraintDiagnostic::new(
                    "target_return",
                    target,
                    Some(low),
                    Some(high),
                )],
            ));
        }
        self.solve_goal(allocation, objective, Goal::TargetReturn(target), rf)
    }

    /// Solves one goal and turns the solver state into a result or failure.
    pub(crate) fn solve_goal(
        &self,
        allocation: &Allocation<'_>,
        objective: &Objective,
        goal: Goal,
        rf: f64,
    ) -> Result<OptimizationResult, OptimizationFailure> {
        let solver = AugmentedLagrangian::new(self.config.solver);
        let run = allocation.solve(goal, &solver).map_err(|err| {
            let reason = match err {
                SolverError::InfeasibleConstraints(_) => FailureReason::InfeasibleConstraints,
                SolverError::MaxIterationsExceeded { .. } => FailureReason::NotConverged,
                SolverError::NumericalInstability(_) => FailureReason::NumericalInstability,
            };
            failure(objective, reason, err.to_string(), 0, Vec::new())
        })?;

        let weights = allocation.weights(&run.params);
        debug!(
            ?goal,
            iterations = run.iterations,
            outer = run.outer_iterations,
            violation = run.violation,
            converged = run.converged,
            "allocation solve finished"
        );

        if run.violation > self.config.solver.feasibility_tolerance {
            let reason = match goal {
                Goal::TargetReturn(_) if !allocation.has_linear_constraints() => {
                    FailureReason::InfeasibleTarget
                }
                _ => FailureReason::InfeasibleConstraints,
            };
            return Err(failure(
                objective,
                reason,
                format!(
                    "constraints violated by {:.3e} after {} multiplier updates",
                    run.violation, run.outer_iterations
                ),
                run.iterations,
                allocation.diagnostics(&weights, goal),
            ));
        }
        if !run.converged {
            return Err(failure(
                objective,
                FailureReason::NotConverged,
                format!(
                    "no stationary point after {} iterations",
                    run.iterations
                ),
                run.iterations,
                allocation.diagnostics(&weights, goal),
            ));
        }

        Ok(OptimizationResult::from_weights(
            objective.clone(),
            allocation.stats(),
            weights,
            rf,
            run.iterations,
        ))
    }
}

pub(crate) fn failure(
    objective: &Objective,
    reason: FailureReason,
    message: String,
    iterations: usize,
    diagnostics: Vec<ConstraintDiagnostic>,
) -> OptimizationFailure {
    OptimizationFailure {
        objective: objective.clone(),
        reason,
        message,
        iterations,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{AssetBounds, SectorConstraint, TurnoverConstraint};
    use approx::assert_relative_eq;
    use folio_core::math::linalg::SymmetricMatrix;
    use folio_core::AnalyticsError;

    fn three_assets() -> ReturnStatistics {
        ReturnStatistics::from_annualised(
            vec!["A".into(), "B".into(), "C".into()],
            vec![0.10, 0.08, 0.01],
            SymmetricMatrix::diagonal(&[0.04, 0.0225, 0.09]),
        )
        .unwrap()
    }

    fn request(objective: Objective) -> OptimizationRequest {
        OptimizationRequest::new(vec!["A".into(), "B".into(), "C".into()], objective)
    }

    fn solve(req: &OptimizationRequest) -> OptimizationResult {
        PortfolioOptimizer::with_defaults()
            .optimise(req, &three_assets())
            .unwrap()
            .into_result()
            .unwrap()
    }

    #[test]
    fn test_max_sharpe_ignores_dominated_asset() {
        let result = solve(&request(Objective::MaxSharpe).with_risk_free_rate(0.02));
        assert_relative_eq!(result.weights[0], 3.0 / 7.0, epsilon = 1e-4);
        assert_relative_eq!(result.weights[1], 4.0 / 7.0, epsilon = 1e-4);
        assert!(result.weights[2] < 1e-4);
        assert_relative_eq!(
            result.sharpe_ratio,
            (result.expected_return - 0.02) / result.volatility,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_min_volatility_inverse_variance() {
        let result = solve(&request(Objective::MinVolatility));
        let inv: [f64; 3] = [1.0 / 0.04, 1.0 / 0.0225, 1.0 / 0.09];
        let total: f64 = inv.iter().sum();
        for (w, v) in result.weights.iter().zip(inv) {
            assert_relative_eq!(*w, v / total, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_target_return_hits_target() {
        let result = solve(&request(Objective::TargetReturn { target: 0.085 }));
        assert_relative_eq!(result.expected_return, 0.085, epsilon = 1e-7);
        assert_relative_eq!(result.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_target_out_of_range_fails() {
        let outcome = PortfolioOptimizer::with_defaults()
            .optimise(
                &request(Objective::TargetReturn { target: 0.2 }),
                &three_assets(),
            )
            .unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.reason, FailureReason::InfeasibleTarget);
        assert_eq!(failure.diagnostics[0].constraint, "target_return");
        assert_relative_eq!(failure.diagnostics[0].upper.unwrap(), 0.10);
    }

    #[test]
    fn test_infeasible_bounds_fail_with_budget_diagnostic() {
        let req = request(Objective::MinVolatility)
            .with_bounds(vec![AssetBounds::new(0.4, 1.0); 3]);
        let outcome = PortfolioOptimizer::with_defaults()
            .optimise(&req, &three_assets())
            .unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.reason, FailureReason::InfeasibleConstraints);
        assert_eq!(failure.diagnostics[0].constraint, "budget");
        assert_relative_eq!(failure.diagnostics[0].violation, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds_respected() {
        let req = request(Objective::MaxSharpe).with_bounds(vec![
            AssetBounds::new(0.0, 0.3),
            AssetBounds::new(0.0, 1.0),
            AssetBounds::new(0.1, 1.0),
        ]);
        let result = solve(&req);
        assert!(result.weights[0] <= 0.3 + 1e-12);
        assert!(result.weights[2] >= 0.1 - 1e-12);
        assert_relative_eq!(result.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sector_cap_binds() {
        let req = request(Objective::constrained(Objective::MaxSharpe))
            .with_risk_free_rate(0.02)
            .with_sector(SectorConstraint::new("b", vec!["B".into()], 0.0, 0.4));
        let result = solve(&req);
        assert!(result.weights[1] <= 0.4 + 1e-6);
        assert_relative_eq!(result.weights[1], 0.4, epsilon = 1e-4);
    }

    #[test]
    fn test_turnover_limit_binds() {
        let current = vec![0.0, 0.0, 1.0];
        let req = request(Objective::constrained(Objective::MinVolatility))
            .with_turnover(TurnoverConstraint::new(current.clone(), 0.5));
        let result = solve(&req);
        let turnover: f64 = result
            .weights
            .iter()
            .zip(&current)
            .map(|(w, c)| (w - c).abs())
            .sum();
        assert!(turnover <= 0.5 + 1e-6, "turnover {}", turnover);
        // Unconstrained min-vol would move C to about 0.16
        assert!(result.weights[2] >= 0.75 - 1e-6);
    }

    #[test]
    fn test_conflicting_sectors_fail_with_diagnostics() {
        let config = OptimizerConfig {
            solver: ALConfig {
                max_outer_iterations: 12,
                ..Default::default()
            },
            ..Default::default()
        };
        let req = request(Objective::constrained(Objective::MinVolatility))
            .with_sector(SectorConstraint::new(
                "ab",
                vec!["A".into(), "B".into()],
                0.8,
                1.0,
            ))
            .with_sector(SectorConstraint::new(
                "bc",
                vec!["B".into(), "C".into()],
                0.9,
                1.0,
            ))
            .with_sector(SectorConstraint::new("b", vec!["B".into()], 0.0, 0.1));
        let outcome = PortfolioOptimizer::new(config)
            .optimise(&req, &three_assets())
            .unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.reason, FailureReason::InfeasibleConstraints);
        assert!(failure
            .diagnostics
            .iter()
            .any(|d| d.constraint.starts_with("sector:") && d.is_violated(1e-6)));
    }

    #[test]
    fn test_symbol_mismatch_is_validation_error() {
        let req = OptimizationRequest::new(vec!["A".into(), "B".into()], Objective::MaxSharpe);
        let err = PortfolioOptimizer::with_defaults()
            .optimise(&req, &three_assets())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Validation(ValidationError::SymbolMismatch { .. })
        ));
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            frontier_points: 7,
            ..Default::default()
        };
        assert_eq!(
            PortfolioOptimizer::from_config(&config).config().frontier_points,
            7
        );
    }
}

//! Efficient frontier sweep.
//!
//! The sweep anchors at the minimum-volatility portfolio, then solves the
//! target-return problem at evenly spaced targets up to the highest
//! achievable return. Targets that fail are dropped, as are points that
//! would break monotonicity in return or volatility.

use crate::optimizer::PortfolioOptimizer;
use crate::problem::{Allocation, Goal};
use crate::request::Objective;
use crate::result::{FrontierPoint, OptimizationFailure, OptimizationResult};
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Returns closer than this are treated as a single frontier point.
const RETURN_RESOLUTION: f64 = 1e-10;

/// Evenly spaced targets from `low` to `high` inclusive, or just `low` when
/// the range is degenerate.
pub fn target_grid(low: f64, high: f64, points: usize) -> Vec<f64> {
    if points < 2 || high - low <= RETURN_RESOLUTION {
        return vec![low];
    }
    let step = (high - low) / (points - 1) as f64;
    (0..points)
        .map(|k| if k + 1 == points { high } else { low + step * k as f64 })
        .collect()
}

/// Keeps points that are non-decreasing in both return and volatility.
pub fn monotone_filter(points: Vec<FrontierPoint>) -> Vec<FrontierPoint> {
    let mut kept: Vec<FrontierPoint> = Vec::with_capacity(points.len());
    for p in points {
        let keep = kept.last().map_or(true, |last| {
            p.expected_return >= last.expected_return && p.volatility >= last.volatility
        });
        if keep {
            kept.push(p);
        } else {
            debug!(target_return = p.target_return, "dropping non-monotone frontier point");
        }
    }
    kept
}

pub(crate) fn trace(
    optimizer: &PortfolioOptimizer,
    allocation: &Allocation<'_>,
    objective: &Objective,
    points: usize,
    rf: f64,
) -> Result<OptimizationResult, OptimizationFailure> {
    let anchor = optimizer.solve_goal(allocation, objective, Goal::MinVariance, rf)?;
    let low = anchor.expected_return;
    let high = highest_return(optimizer, allocation, objective, rf).max(low);
    let targets = target_grid(low, high, points);

    let solve_one = |target: &f64| {
        match optimizer.solve_goal(allocation, objective, Goal::TargetReturn(*target), rf) {
            Ok(result) => Some(result),
            Err(failure) => {
                debug!(target_return = *target, reason = %failure.reason, "frontier point discarded");
                None
            }
        }
    };

    #[cfg(feature = "parallel")]
    let solved: Vec<Option<OptimizationResult>> = targets[1..].par_iter().map(solve_one).collect();
    #[cfg(not(feature = "parallel"))]
    let solved: Vec<Option<OptimizationResult>> = targets[1..].iter().map(solve_one).collect();

    let mut iterations = anchor.iterations;
    let mut frontier = vec![anchor.to_frontier_point(low)];
    for (target, result) in targets[1..].iter().zip(solved) {
        if let Some(result) = result {
            iterations += result.iterations;
            frontier.push(result.to_frontier_point(*target));
        }
    }
    let attempted = targets.len();
    let frontier = monotone_filter(frontier);
    info!(
        attempted,
        kept = frontier.len(),
        low,
        high,
        "efficient frontier traced"
    );

    // Headline allocation is the best Sharpe ratio along the frontier
    let best = frontier
        .iter()
        .max_by(|a, b| a.sharpe_ratio.total_cmp(&b.sharpe_ratio))
        .map_or_else(|| anchor.weights.clone(), |p| p.weights.clone());

    let mut result = OptimizationResult::from_weights(
        objective.clone(),
        allocation.stats(),
        best,
        rf,
        iterations,
    );
    result.frontier = Some(frontier);
    Ok(result)
}

/// Upper end of the sweep: the bound-only maximum, or the solved maximum
/// when sector or turnover limits also apply.
fn highest_return(
    optimizer: &PortfolioOptimizer,
    allocation: &Allocation<'_>,
    objective: &Objective,
    rf: f64,
) -> f64 {
    let (_, bound_high) = allocation.bound_return_range();
    if !allocation.has_linear_constraints() {
        return bound_high;
    }
    match optimizer.solve_goal(allocation, objective, Goal::MaxReturn, rf) {
        Ok(result) => result.expected_return,
        Err(failure) => {
            debug!(reason = %failure.reason, "constrained maximum return unavailable");
            bound_high
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(ret: f64, vol: f64) -> FrontierPoint {
        FrontierPoint {
            target_return: ret,
            expected_return: ret,
            volatility: vol,
            sharpe_ratio: ret / vol,
            weights: vec![1.0],
        }
    }

    #[test]
    fn test_target_grid() {
        let grid = target_grid(0.02, 0.10, 5);
        assert_eq!(grid.len(), 5);
        assert_relative_eq!(grid[1], 0.04);
        assert_eq!(grid[4], 0.10);
        assert_eq!(target_grid(0.05, 0.05, 10), vec![0.05]);
    }

    #[test]
    fn test_monotone_filter() {
        let kept = monotone_filter(vec![
            point(0.02, 0.10),
            point(0.03, 0.11),
            point(0.04, 0.105),
            point(0.05, 0.13),
        ]);
        let returns: Vec<f64> = kept.iter().map(|p| p.expected_return).collect();
        assert_eq!(returns, vec![0.02, 0.03, 0.05]);
    }
}

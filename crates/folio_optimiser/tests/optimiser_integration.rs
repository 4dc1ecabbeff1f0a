//! Optimiser scenarios and properties.

use approx::assert_relative_eq;
use folio_core::math::linalg::SymmetricMatrix;
use folio_core::{EngineConfig, ReturnSeries};
use folio_models::{ReturnStatistics, ReturnStatisticsEstimator};
use folio_optimiser::{
    AssetBounds, FailureReason, Objective, OptimizationOutcome, OptimizationRequest,
    PortfolioOptimizer, SectorConstraint, TurnoverConstraint,
};
use proptest::prelude::*;

fn dominated_universe() -> ReturnStatistics {
    ReturnStatistics::from_annualised(
        vec!["GROWTH".into(), "VALUE".into(), "LAGGARD".into()],
        vec![0.10, 0.08, 0.01],
        SymmetricMatrix::diagonal(&[0.2 * 0.2, 0.15 * 0.15, 0.3 * 0.3]),
    )
    .unwrap()
}

fn correlated_universe() -> ReturnStatistics {
    let vols = [0.18, 0.12, 0.06, 0.22];
    let corr = [
        [1.0, 0.6, 0.1, 0.5],
        [0.6, 1.0, 0.2, 0.4],
        [0.1, 0.2, 1.0, 0.0],
        [0.5, 0.4, 0.0, 1.0],
    ];
    let cov = SymmetricMatrix::from_lower_fn(4, |i, j| corr[i][j] * vols[i] * vols[j]).unwrap();
    ReturnStatistics::from_annualised(
        vec!["US".into(), "EU".into(), "BOND".into(), "EM".into()],
        vec![0.08, 0.06, 0.03, 0.09],
        cov,
    )
    .unwrap()
}

fn solved(outcome: OptimizationOutcome) -> folio_optimiser::OptimizationResult {
    match outcome {
        OptimizationOutcome::Solved(r) => r,
        OptimizationOutcome::Failed(f) => panic!("optimisation failed: {}", f),
    }
}

// ============================================================================
// Closed-form scenarios
// ============================================================================

/// With a strictly dominated third asset, max-Sharpe reduces to the two-asset
/// tangency portfolio `w ∝ Σ⁻¹(μ − rf)`.
#[test]
fn test_max_sharpe_matches_two_asset_tangency() {
    let stats = dominated_universe();
    let request = OptimizationRequest::new(stats.symbols().to_vec(), Objective::MaxSharpe)
        .with_risk_free_rate(0.02);
    let result = solved(
        PortfolioOptimizer::with_defaults()
            .optimise(&request, &stats)
            .unwrap(),
    );

    // (0.08 / 0.04, 0.06 / 0.0225) normalised
    assert_relative_eq!(result.weights[0], 0.428571, epsilon = 1e-3);
    assert_relative_eq!(result.weights[1], 0.571429, epsilon = 1e-3);
    assert!(result.weights[2].abs() < 1e-3);
    assert_eq!(result.weight_of("LAGGARD"), Some(result.weights[2]));
}

/// Uncorrelated assets with variances 0.04 and 0.01 give min-vol weights 0.2 / 0.8.
#[test]
fn test_min_volatility_two_assets() {
    let stats = ReturnStatistics::from_annualised(
        vec!["A".into(), "B".into()],
        vec![0.07, 0.03],
        SymmetricMatrix::diagonal(&[0.04, 0.01]),
    )
    .unwrap();
    let request = OptimizationRequest::new(stats.symbols().to_vec(), Objective::MinVolatility);
    let result = solved(
        PortfolioOptimizer::with_defaults()
            .optimise(&request, &stats)
            .unwrap(),
    );
    assert_relative_eq!(result.weights[0], 0.2, epsilon = 1e-6);
    assert_relative_eq!(result.weights[1], 0.8, epsilon = 1e-6);
    assert_relative_eq!(result.volatility, (0.04_f64 * 0.01 / 0.05).sqrt(), epsilon = 1e-8);
}

/// Correlated universe whose minimum-variance portfolio holds nothing of the
/// riskiest asset. Every objective must finish as a solved outcome.
fn cornered_universe() -> ReturnStatistics {
    let cov = [[0.04, 0.018, 0.006], [0.018, 0.0225, 0.003], [0.006, 0.003, 0.01]];
    ReturnStatistics::from_annualised(
        vec!["EQ".into(), "CREDIT".into(), "GOVT".into()],
        vec![0.10, 0.07, 0.03],
        SymmetricMatrix::from_lower_fn(3, |i, j| cov[i][j]).unwrap(),
    )
    .unwrap()
}

#[test]
fn test_min_volatility_with_weight_on_bound() {
    let stats = cornered_universe();
    let request = OptimizationRequest::new(stats.symbols().to_vec(), Objective::MinVolatility);
    let result = solved(
        PortfolioOptimizer::with_defaults()
            .optimise(&request, &stats)
            .unwrap(),
    );

    // Free pair equalises (Σw)_i: 0.0195·w1 = 0.007·w2
    assert!(result.weights[0].abs() < 1e-8);
    assert_relative_eq!(result.weights[1], 0.007 / 0.0265, epsilon = 1e-6);
    assert_relative_eq!(result.weights[2], 0.0195 / 0.0265, epsilon = 1e-6);
    assert!(result.iterations < 5_000, "took {} steps", result.iterations);
}

#[test]
fn test_every_objective_solves_on_correlated_universe() {
    let stats = cornered_universe();
    let optimizer = PortfolioOptimizer::with_defaults();
    let symbols = stats.symbols().to_vec();

    let max_sharpe = solved(
        optimizer
            .optimise(&OptimizationRequest::new(symbols.clone(), Objective::MaxSharpe), &stats)
            .unwrap(),
    );
    assert_relative_eq!(max_sharpe.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);

    let target = solved(
        optimizer
            .optimise(
                &OptimizationRequest::new(symbols.clone(), Objective::TargetReturn { target: 0.06 }),
                &stats,
            )
            .unwrap(),
    );
    assert_relative_eq!(target.expected_return, 0.06, epsilon = 1e-6);

    let frontier = solved(
        optimizer
            .optimise(
                &OptimizationRequest::new(symbols, Objective::EfficientFrontier { points: Some(8) }),
                &stats,
            )
            .unwrap(),
    );
    let points = frontier.frontier.unwrap();
    assert!(points.len() >= 6, "only {} frontier points", points.len());
    assert!(max_sharpe.sharpe_ratio >= target.sharpe_ratio - 1e-9);
}

// ============================================================================
// Efficient frontier
// ============================================================================

#[test]
fn test_frontier_monotone_and_feasible() {
    let stats = correlated_universe();
    let request = OptimizationRequest::new(
        stats.symbols().to_vec(),
        Objective::EfficientFrontier { points: Some(12) },
    );
    let result = solved(
        PortfolioOptimizer::with_defaults()
            .optimise(&request, &stats)
            .unwrap(),
    );
    let frontier = result.frontier.as_ref().unwrap();
    assert!(frontier.len() >= 6, "only {} points kept", frontier.len());

    for pair in frontier.windows(2) {
        assert!(pair[0].target_return < pair[1].target_return);
        assert!(pair[0].expected_return <= pair[1].expected_return);
        assert!(pair[0].volatility <= pair[1].volatility);
    }
    for p in frontier {
        assert_relative_eq!(p.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
        assert!(p.weights.iter().all(|w| *w >= -1e-12 && *w <= 1.0 + 1e-12));
        assert!((p.expected_return - p.target_return).abs() < 1e-6);
    }

    // Headline weights are the best Sharpe point
    let best = frontier
        .iter()
        .map(|p| p.sharpe_ratio)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_relative_eq!(result.sharpe_ratio, best, epsilon = 1e-9);
}

#[test]
fn test_frontier_starts_at_min_volatility() {
    let stats = correlated_universe();
    let optimizer = PortfolioOptimizer::with_defaults();
    let min_vol = solved(
        optimizer
            .optimise(
                &OptimizationRequest::new(stats.symbols().to_vec(), Objective::MinVolatility),
                &stats,
            )
            .unwrap(),
    );
    let frontier = solved(
        optimizer
            .optimise(
                &OptimizationRequest::new(
                    stats.symbols().to_vec(),
                    Objective::EfficientFrontier { points: Some(4) },
                ),
                &stats,
            )
            .unwrap(),
    );
    let first = &frontier.frontier.unwrap()[0];
    assert_relative_eq!(first.volatility, min_vol.volatility, epsilon = 1e-9);
}

#[test]
fn test_constrained_frontier_respects_sector() {
    let stats = correlated_universe();
    let request = OptimizationRequest::new(
        stats.symbols().to_vec(),
        Objective::constrained(Objective::EfficientFrontier { points: Some(6) }),
    )
    .with_sector(SectorConstraint::new(
        "equity",
        vec!["US".into(), "EU".into(), "EM".into()],
        0.0,
        0.7,
    ));
    let result = solved(
        PortfolioOptimizer::with_defaults()
            .optimise(&request, &stats)
            .unwrap(),
    );
    for p in result.frontier.unwrap() {
        let equity = p.weights[0] + p.weights[1] + p.weights[3];
        assert!(equity <= 0.7 + 1e-6, "equity weight {}", equity);
    }
}

// ============================================================================
// Failures as data
// ============================================================================

#[test]
fn test_unreachable_target_is_structured_failure() {
    let stats = correlated_universe();
    let request = OptimizationRequest::new(
        stats.symbols().to_vec(),
        Objective::TargetReturn { target: 0.12 },
    );
    let outcome = PortfolioOptimizer::with_defaults()
        .optimise(&request, &stats)
        .unwrap();
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::InfeasibleTarget);
    assert_eq!(failure.objective, request.objective);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["reason"], "infeasible_target");
    assert_eq!(json["diagnostics"][0]["constraint"], "target_return");
}

#[test]
fn test_turnover_and_bounds_together() {
    let stats = correlated_universe();
    let current = vec![0.25, 0.25, 0.25, 0.25];
    let request = OptimizationRequest::new(
        stats.symbols().to_vec(),
        Objective::constrained(Objective::MaxSharpe),
    )
    .with_bounds(vec![AssetBounds::new(0.05, 0.6); 4])
    .with_turnover(TurnoverConstraint::new(current.clone(), 0.2));
    let result = solved(
        PortfolioOptimizer::with_defaults()
            .optimise(&request, &stats)
            .unwrap(),
    );
    let turnover: f64 = result
        .weights
        .iter()
        .zip(&current)
        .map(|(w, c)| (w - c).abs())
        .sum();
    assert!(turnover <= 0.2 + 1e-6);
    assert!(result.weights.iter().all(|w| *w >= 0.05 - 1e-12 && *w <= 0.6 + 1e-12));
}

// ============================================================================
// Pipeline
// ============================================================================

/// Statistics estimated from history feed the optimiser with configured defaults.
#[test]
fn test_estimate_then_optimise() {
    let a: Vec<f64> = (0..48).map(|t| ((t * 7) % 11) as f64 * 0.006 - 0.02).collect();
    let b: Vec<f64> = (0..48).map(|t| ((t * 5) % 13) as f64 * 0.002 - 0.008).collect();
    let c: Vec<f64> = (0..48).map(|t| ((t * 3) % 7) as f64 * 0.004 - 0.01).collect();
    let series =
        ReturnSeries::new(vec!["A".into(), "B".into(), "C".into()], vec![a, b, c], 12).unwrap();
    let stats = ReturnStatisticsEstimator::with_defaults()
        .estimate(&series)
        .unwrap();

    let config = EngineConfig {
        frontier_points: 5,
        ..Default::default()
    };
    let request = OptimizationRequest::new(
        stats.symbols().to_vec(),
        Objective::EfficientFrontier { points: None },
    );
    let result = solved(
        PortfolioOptimizer::from_config(&config)
            .optimise(&request, &stats)
            .unwrap(),
    );
    assert!(result.frontier.unwrap().len() <= 5);
}

// ============================================================================
// Properties
// ============================================================================

fn diagonal_universe(mean: &[f64], vols: &[f64]) -> ReturnStatistics {
    let var: Vec<f64> = vols.iter().map(|v| v * v).collect();
    ReturnStatistics::from_annualised(
        (0..mean.len()).map(|i| format!("S{}", i)).collect(),
        mean.to_vec(),
        SymmetricMatrix::diagonal(&var),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_weights_sum_to_one_within_bounds(
        mean in prop::collection::vec(0.0f64..0.15, 3..6),
        vol_seed in prop::collection::vec(0.05f64..0.4, 6),
        cap in 0.35f64..1.0,
        max_sharpe in any::<bool>(),
    ) {
        let n = mean.len();
        let stats = diagonal_universe(&mean, &vol_seed[..n]);
        let objective = if max_sharpe { Objective::MaxSharpe } else { Objective::MinVolatility };
        let request = OptimizationRequest::new(stats.symbols().to_vec(), objective)
            .with_bounds(vec![AssetBounds::new(0.0, cap); n]);
        let outcome = PortfolioOptimizer::with_defaults().optimise(&request, &stats).unwrap();
        if let Some(result) = outcome.result() {
            prop_assert!((result.weights.iter().sum::<f64>() - 1.0).abs() <= 1e-6);
            for w in &result.weights {
                prop_assert!(*w >= -1e-12 && *w <= cap + 1e-12);
            }
        }
    }

    #[test]
    fn prop_min_volatility_not_beaten_by_equal_weights(
        vols in prop::collection::vec(0.05f64..0.4, 2..6),
    ) {
        let mean = vec![0.05; vols.len()];
        let stats = diagonal_universe(&mean, &vols);
        let request = OptimizationRequest::new(stats.symbols().to_vec(), Objective::MinVolatility);
        let result = PortfolioOptimizer::with_defaults()
            .optimise(&request, &stats)
            .unwrap()
            .into_result()
            .unwrap();
        let equal = vec![1.0 / vols.len() as f64; vols.len()];
        prop_assert!(result.volatility <= stats.portfolio_volatility(&equal) + 1e-9);
    }
}

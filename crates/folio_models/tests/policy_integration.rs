//! Integration tests for estimation, the GBM step model and the policy.

use approx::assert_relative_eq;
use folio_core::math::linalg::SymmetricMatrix;
use folio_core::{Frequency, ReturnSeries};
use folio_models::{
    Contribution, ContributionRebalancingPolicy, CorrelatedGbm, RebalanceAction, RebalancingRule,
    ReturnStatistics, ReturnStatisticsEstimator, StepModel,
};
use proptest::prelude::*;

// ============================================================================
// Estimation feeding the step model
// ============================================================================

/// Estimated statistics produce a model whose zero-shock step is the drift.
#[test]
fn test_estimate_then_model() {
    let a: Vec<f64> = (0..120).map(|t| ((t * 7) % 11) as f64 * 0.004 - 0.018).collect();
    let b: Vec<f64> = (0..120).map(|t| ((t * 5) % 13) as f64 * 0.002 - 0.011).collect();
    let series = ReturnSeries::new(vec!["EQ".into(), "BD".into()], vec![a, b], 12).unwrap();

    let stats = ReturnStatisticsEstimator::with_defaults()
        .estimate(&series)
        .unwrap();
    let (model, fallback) = CorrelatedGbm::from_statistics(&stats, 12, 1e8).unwrap();
    assert!(!fallback);

    let mut out = [0.0; 2];
    model.evolve_step(&[0.0, 0.0], &mut out);
    for i in 0..2 {
        let expected = (stats.mean_returns()[i] - 0.5 * stats.covariance().get(i, i)) / 12.0;
        assert_relative_eq!(out[i], expected, epsilon = 1e-15);
    }
}

/// Externally supplied statistics skip estimation entirely.
#[test]
fn test_external_statistics() {
    let stats = ReturnStatistics::from_annualised(
        vec!["X".into(), "Y".into(), "Z".into()],
        vec![0.06, 0.04, 0.02],
        SymmetricMatrix::from_rows(&[
            vec![0.04, 0.01, 0.0],
            vec![0.01, 0.02, 0.0],
            vec![0.0, 0.0, 0.01],
        ])
        .unwrap(),
    )
    .unwrap();
    let corr = stats.correlation();
    assert_relative_eq!(corr.get(0, 1), 0.01 / (0.2 * 0.02_f64.sqrt()), epsilon = 1e-12);
    assert_eq!(corr.get(0, 2), 0.0);
}

// ============================================================================
// Policy over a deterministic path
// ============================================================================

/// Contributions and rebalances combine over a two-year monthly path.
#[test]
fn test_policy_two_years() {
    let rule = RebalancingRule {
        enabled: true,
        drift_threshold: 0.05,
        transaction_cost: 0.001,
        max_rebalances_per_year: 2,
    };
    let contribution = Contribution::new(100.0, Frequency::Monthly).unwrap();
    let policy =
        ContributionRebalancingPolicy::new(vec![0.6, 0.4], Some(contribution), Some(rule), 12, 24)
            .unwrap();

    let mut book = policy.open_book(10_000.0);
    let mut events = Vec::new();
    for step in 0..24 {
        book.apply_simple_returns(&[0.03, -0.01]);
        let outcome = policy.apply(&mut book, step);
        assert_eq!(outcome.contributed, 100.0);
        events.extend(outcome.event);
    }

    assert_eq!(book.total_contributed(), 2400.0);
    let executed: Vec<usize> = events
        .iter()
        .filter(|e| e.action == RebalanceAction::Executed)
        .map(|e| e.step)
        .collect();
    assert!(executed.len() <= 4);
    assert!(executed.iter().filter(|&&s| s < 12).count() <= 2);
    assert!(executed.iter().all(|&s| s < 23));
    assert!(book.total_cost() > 0.0);
    assert_eq!(book.executed_rebalances(), executed.len());
    assert_eq!(book.suppressed_breaches(), events.len() - executed.len());
}

/// A threshold of 1.0 can never be exceeded by a long-only drift.
#[test]
fn test_full_threshold_never_triggers() {
    let rule = RebalancingRule {
        drift_threshold: 1.0,
        ..Default::default()
    };
    let policy =
        ContributionRebalancingPolicy::new(vec![0.5, 0.5], None, Some(rule), 12, 120).unwrap();
    let mut book = policy.open_book(1.0);
    for step in 0..120 {
        book.apply_simple_returns(&[0.5, -0.5]);
        assert!(policy.apply(&mut book, step).event.is_none());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Executed rebalances always restore target weights and never create value.
    #[test]
    fn prop_rebalance_restores_weights(
        returns in prop::collection::vec((-0.2f64..0.2, -0.2f64..0.2), 1..60),
        cost in 0.0f64..0.05,
    ) {
        let rule = RebalancingRule {
            enabled: true,
            drift_threshold: 0.02,
            transaction_cost: cost,
            max_rebalances_per_year: 12,
        };
        let policy = ContributionRebalancingPolicy::new(
            vec![0.7, 0.3],
            None,
            Some(rule),
            12,
            returns.len() + 1,
        )
        .unwrap();
        let mut book = policy.open_book(1000.0);
        for (step, (ra, rb)) in returns.iter().enumerate() {
            book.apply_simple_returns(&[*ra, *rb]);
            let before = book.value();
            if let Some(e) = policy.apply(&mut book, step).event {
                if e.action == RebalanceAction::Executed {
                    prop_assert!(book.max_drift(&[0.7, 0.3]) < 1e-12);
                    prop_assert!(book.value() <= before + 1e-9);
                    prop_assert!((before - book.value() - e.cost).abs() < 1e-9);
                }
            }
        }
    }
}

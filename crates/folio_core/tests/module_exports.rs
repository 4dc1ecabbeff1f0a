//! Integration tests for module exports.
//!
//! Verify that all public modules and types are correctly exported and
//! accessible via absolute paths.

use chrono::NaiveDate;

/// Test that error and data types are accessible from the crate root.
#[test]
fn test_root_exports() {
    use folio_core::{
        AnalyticsError, AnalyticsResult, EngineConfig, Frequency, ReturnSeries, SolverError,
        ValidationError,
    };

    fn fails() -> AnalyticsResult<()> {
        Err(ValidationError::EmptySymbols.into())
    }
    assert!(matches!(fails(), Err(AnalyticsError::Validation(_))));

    let _ = SolverError::MaxIterationsExceeded { iterations: 1 };
    assert_eq!(Frequency::Quarterly.periods_per_year(), 4);
    assert!(EngineConfig::default().validate().is_ok());

    let series = ReturnSeries::new(vec!["X".to_string()], vec![vec![0.01, 0.02]], 12).unwrap();
    assert_eq!(series.len(), 2);
}

/// Test that dated series work with chrono dates.
#[test]
fn test_series_with_dates() {
    use folio_core::types::series::ReturnSeries;

    let dates = vec![
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    ];
    let series = ReturnSeries::new(
        vec!["EQ".to_string(), "BD".to_string()],
        vec![vec![0.02, -0.01, 0.015], vec![0.001, 0.002, 0.0]],
        12,
    )
    .unwrap()
    .with_dates(dates.clone())
    .unwrap();

    assert_eq!(series.dates(), Some(dates.as_slice()));
    let window = series.window(1, 3).unwrap();
    assert_eq!(window.date(0), Some(dates[1]));
}

/// Test that linear algebra is accessible via absolute path.
#[test]
fn test_linalg_module_exports() {
    use folio_core::math::linalg::{dot, CholeskyFactor, LinalgError, SymmetricMatrix};

    let m = SymmetricMatrix::identity(3);
    let l: CholeskyFactor = m.cholesky().unwrap();
    let mut out = [0.0; 3];
    l.transform_into(&[1.0, 2.0, 3.0], &mut out);
    assert_eq!(out, [1.0, 2.0, 3.0]);
    assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);

    let err = SymmetricMatrix::zeros(2).cholesky().unwrap_err();
    assert!(matches!(err, LinalgError::NotPositiveDefinite { pivot: 0 }));
}

/// Test that statistics are accessible via absolute path.
#[test]
fn test_statistics_module_exports() {
    use folio_core::math::statistics::{mean, median, percentile, std_dev, ReturnMoments};

    let xs = [1.0, 2.0, 3.0, 4.0];
    assert_eq!(mean(&xs), Some(2.5));
    assert_eq!(median(&xs), Some(2.5));
    assert_eq!(percentile(&xs, 0.0), Some(1.0));
    assert!(std_dev(&xs).unwrap() > 0.0);
    assert_eq!(ReturnMoments::from_slice(&xs, 0.0).count(), 4);
}

/// Test that solvers are accessible via absolute path.
#[test]
fn test_solvers_module_exports() {
    use folio_core::math::solvers::{CappedSimplex, PGConfig, PGResult, ProjectedGradientSolver};

    let simplex = CappedSimplex::long_only(2);
    let solver = ProjectedGradientSolver::new(PGConfig::fast());
    let result: PGResult = solver
        .solve(
            |w: &[f64]| (w[0] * w[0] + w[1] * w[1], vec![2.0 * w[0], 2.0 * w[1]]),
            |w: &mut [f64]| simplex.project(w),
            vec![1.0, 0.0],
        )
        .unwrap();
    assert!(result.converged);
    assert!((result.params[0] - 0.5).abs() < 1e-6);
}

/// Test that configuration loads from TOML.
#[test]
fn test_config_module_exports() {
    use folio_core::config::{ConfigError, EngineConfig, ENV_VARS};

    assert_eq!(ENV_VARS.len(), 12);
    let config = EngineConfig::from_toml_str("frontier_points = 10").unwrap();
    assert_eq!(config.frontier_points, 10);
    let err: ConfigError = EngineConfig::from_toml_str("frontier_points = 1").unwrap_err();
    assert!(err.to_string().contains("frontier_points"));
}

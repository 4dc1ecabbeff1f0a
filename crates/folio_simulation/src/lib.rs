//! # Folio Simulation (L4: Engine)
//!
//! Monte Carlo projection of portfolio value under correlated asset
//! returns.
//!
//! This crate provides:
//! - Seeded, per-path random number generation ([`rng`])
//! - Validated simulation parameters, the parallel path simulator,
//!   percentile aggregation and the result type ([`mc`])
//!
//! ## Pipeline
//!
//! ```text
//! ReturnStatistics ──▶ CorrelatedGbm ──▶ paths (rayon) ──▶ PercentileAggregator
//!                                          │                     │
//!                       ContributionRebalancingPolicy       RiskMetricsCalculator
//! ```
//!
//! ## Example
//!
//! ```
//! use folio_core::math::linalg::SymmetricMatrix;
//! use folio_models::{RebalancingRule, ReturnStatistics};
//! use folio_simulation::{run_simulation, SimulationParameters};
//!
//! let stats = ReturnStatistics::from_annualised(
//!     vec!["EQ".into(), "BD".into()],
//!     vec![0.07, 0.04],
//!     SymmetricMatrix::diagonal(&[0.01, 0.0025]),
//! )
//! .unwrap();
//!
//! let params = SimulationParameters::builder()
//!     .symbols(vec!["EQ".into(), "BD".into()])
//!     .target_weights(vec![0.6, 0.4])
//!     .horizon_years(1.0)
//!     .simulation_count(100)
//!     .initial_value(10_000.0)
//!     .periods_per_year(52)
//!     .rebalancing(RebalancingRule::default())
//!     .random_seed(42)
//!     .build()
//!     .unwrap();
//!
//! let result = run_simulation(params, &stats).unwrap();
//! assert!(result.bands.iter().all(|b| b.is_monotone()));
//! assert!(result.risk_metrics.value_at_risk.is_some());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod mc;
pub mod rng;

pub use mc::{
    run_simulation, CorrelatedPathSimulator, PercentileAggregator, PercentileBand, PolicySummary,
    SimulationParameters, SimulationResult, TerminalSummary,
};
pub use rng::SimulationRng;

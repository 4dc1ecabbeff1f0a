//! # Folio Risk (L3: Analysis)
//!
//! Risk metrics, rebalancing timing analysis and parallelisation helpers.
//!
//! This crate provides:
//! - VaR, CVaR, maximum drawdown, Sharpe, Sortino and CAGR for historical
//!   series and simulated ensembles ([`metrics`])
//! - Drift-triggered rebalance scanning with cost/benefit scoring against an
//!   unrebalanced control ([`rebalancing`])
//! - Rayon-based parallel helpers shared with the path simulator
//!   ([`parallel`])
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            folio_risk (L3)              │
//! ├─────────────────────────────────────────┤
//! │  metrics/     - RiskMetrics, functions  │
//! │  rebalancing/ - timing analyzer         │
//! │  parallel/    - Rayon utilities         │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │           folio_models (L2)             │
//! │  estimation, GBM, rebalancing policy    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use folio_core::ReturnSeries;
//! use folio_risk::RiskMetricsCalculator;
//!
//! let series = ReturnSeries::new(
//!     vec!["EQ".into(), "BD".into()],
//!     vec![
//!         vec![0.03, -0.02, 0.01, 0.04, -0.05, 0.02],
//!         vec![0.004, 0.003, 0.002, -0.001, 0.005, 0.001],
//!     ],
//!     12,
//! )
//! .unwrap();
//!
//! let calc = RiskMetricsCalculator::new(0.95, 0.0, 12).unwrap();
//! let metrics = calc.for_series(&series, &[0.6, 0.4]).unwrap();
//! assert_eq!(metrics.observations, 6);
//! assert!(metrics.conditional_value_at_risk >= metrics.value_at_risk);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod metrics;
pub mod parallel;
pub mod rebalancing;

pub use metrics::{DrawdownSummary, EnsembleSample, RiskMetrics, RiskMetricsCalculator};
pub use parallel::ParallelConfig;
pub use rebalancing::{BreachRecord, RebalancingRecommendation, RebalancingTimingAnalyzer};

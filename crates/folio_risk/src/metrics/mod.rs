//! Risk metrics for historical series and simulated ensembles.
//!
//! This module provides:
//! - `functions`: Pure VaR, CVaR, drawdown, Sharpe, Sortino and CAGR
//!   functions
//! - `calculator`: [`RiskMetricsCalculator`] bundling them into
//!   [`RiskMetrics`]
//!
//! # Re-exports
//!
//! - [`RiskMetrics`], [`RiskMetricsCalculator`], [`EnsembleSample`] from `calculator`
//! - every function and [`DrawdownSummary`] from `functions`

pub mod calculator;
pub mod functions;

pub use calculator::{EnsembleSample, RiskMetrics, RiskMetricsCalculator};
pub use functions::{
    annualised_volatility, cagr, conditional_value_at_risk, drawdown_summary, max_drawdown,
    sharpe_ratio, sortino_ratio, value_at_risk, DrawdownSummary, ZERO_VOLATILITY,
};

//! Rebalancing timing analysis.
//!
//! This module provides:
//! - `analyzer`: [`RebalancingTimingAnalyzer`] running a rebalanced and a
//!   control portfolio over the same return path
//! - `recommendation`: [`RebalancingRecommendation`] and [`BreachRecord`]
//!
//! # Re-exports
//!
//! - [`RebalancingTimingAnalyzer`] from `analyzer`
//! - [`RebalancingRecommendation`], [`BreachRecord`] from `recommendation`

pub mod analyzer;
pub mod recommendation;

pub use analyzer::RebalancingTimingAnalyzer;
pub use recommendation::{BreachRecord, RebalancingRecommendation};

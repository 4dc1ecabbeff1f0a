//! Core data and error types.
//!
//! This module provides:
//! - `error`: Structured error taxonomy shared by every engine component
//! - `series`: Time-indexed per-asset return series consumed by the engine
//! - `frequency`: Calendar frequencies for data sampling and contributions
//! - `weights`: Target allocation validation
//!
//! # Re-exports
//!
//! - [`AnalyticsError`], [`AnalyticsResult`], [`SolverError`], [`ValidationError`] from `error`
//! - [`ReturnSeries`] from `series`
//! - [`Frequency`] from `frequency`
//! - [`validate_weights`] from `weights`

pub mod error;
pub mod frequency;
pub mod series;
pub mod weights;

pub use error::{AnalyticsError, AnalyticsResult, SolverError, ValidationError};
pub use frequency::Frequency;
pub use series::ReturnSeries;
pub use weights::{validate_weights, WEIGHT_SUM_TOLERANCE};

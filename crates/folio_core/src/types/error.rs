//! Error types for structured error handling.
//!
//! This module provides:
//! - `ValidationError`: Malformed parameters or requests, raised before any
//!   computation starts
//! - `AnalyticsError`: The error kinds every engine entry point can raise
//! - `SolverError`: Errors from the numerical solvers
//!
//! Optimiser non-convergence is not an error: `folio_optimiser` reports it as
//! `OptimizationOutcome::Failed`.

use thiserror::Error;

/// Validation failures for caller-supplied parameters.
///
/// Every variant renders an actionable message suitable for surfacing to an
/// end user.
///
/// # Examples
/// ```
/// use folio_core::types::ValidationError;
///
/// let err = ValidationError::WeightsDoNotSumToOne { sum: 0.9, tolerance: 1e-6 };
/// assert!(err.to_string().contains("sum to 0.9"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No symbols were supplied.
    #[error("symbol list must not be empty")]
    EmptySymbols,

    /// The same symbol appears more than once.
    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    /// A vector does not have the length implied by the symbol list.
    #[error("{field} has length {got}, expected {expected}")]
    LengthMismatch {
        /// Name of the offending field
        field: String,
        /// Required length
        expected: usize,
        /// Supplied length
        got: usize,
    },

    /// Target weights do not sum to one within tolerance.
    #[error("weights sum to {sum}, expected 1.0 (tolerance {tolerance})")]
    WeightsDoNotSumToOne {
        /// Actual sum of the weights
        sum: f64,
        /// Accepted absolute deviation from 1.0
        tolerance: f64,
    },

    /// A scalar parameter lies outside its admissible range.
    #[error("parameter '{name}' is out of range: {reason}")]
    OutOfRange {
        /// Parameter name
        name: String,
        /// Description of the admissible range
        reason: String,
    },

    /// Two inputs refer to different symbol universes.
    #[error("symbol mismatch: expected {expected:?}, got {got:?}")]
    SymbolMismatch {
        /// Symbols of the reference input
        expected: Vec<String>,
        /// Symbols of the supplied input
        got: Vec<String>,
    },

    /// A symbol is referenced that is not part of the universe.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// A return series is malformed.
    #[error("invalid return series: {0}")]
    InvalidSeries(String),

    /// A request is internally inconsistent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ValidationError {
    /// Shorthand for [`ValidationError::OutOfRange`].
    pub fn out_of_range(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ValidationError::LengthMismatch`].
    pub fn length_mismatch(field: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::LengthMismatch {
            field: field.into(),
            expected,
            got,
        }
    }
}

/// Errors raised by the analytics engine.
///
/// # Variants
/// - `Validation`: Malformed input; the caller must not proceed
/// - `InsufficientData`: Historical window too short for estimation
/// - `NumericalInstability`: Degenerate numerics beyond regularisation limits
///
/// # Examples
/// ```
/// use folio_core::types::AnalyticsError;
///
/// let err = AnalyticsError::InsufficientData { got: 8, need: 20 };
/// assert_eq!(err.to_string(), "need at least 20 historical observations, got 8");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Parameter or request validation failed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Not enough observations to estimate statistics reliably.
    #[error("need at least {need} historical observations, got {got}")]
    InsufficientData {
        /// Observations available
        got: usize,
        /// Minimum observations required
        need: usize,
    },

    /// Numerical failure that regularisation could not repair.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}

impl AnalyticsError {
    /// Returns a stable, machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyticsError::Validation(_) => "validation_error",
            AnalyticsError::InsufficientData { .. } => "insufficient_data",
            AnalyticsError::NumericalInstability(_) => "numerical_instability",
        }
    }
}

/// Result alias used throughout the engine.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Solver error types.
///
/// # Variants
/// - `MaxIterationsExceeded`: Solver failed to converge within iteration limit
/// - `InfeasibleConstraints`: The feasible set is empty
/// - `NumericalInstability`: Objective or gradient became non-finite
///
/// # Examples
/// ```
/// use folio_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// Constraint set admits no solution.
    #[error("Infeasible constraints: {0}")]
    InfeasibleConstraints(String),

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl From<SolverError> for AnalyticsError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::InfeasibleConstraints(msg) => {
                AnalyticsError::Validation(ValidationError::InvalidRequest(msg))
            }
            other => AnalyticsError::NumericalInstability(other.to_string()),
        }
    }
}

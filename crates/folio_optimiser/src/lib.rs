//! # folio_optimiser
//!
//! Mean-variance allocation for the portfolio analytics engine.
//!
//! ## Architecture Position
//!
//! Layer 2.5: depends on `folio_core` (L1) for the projected gradient solver
//! and on `folio_models` (L2) for [`ReturnStatistics`](folio_models::ReturnStatistics).
//! Independent of simulation and risk.
//!
//! ## Objectives
//!
//! - [`Objective::MaxSharpe`]: tangency portfolio under the bounds
//! - [`Objective::MinVolatility`]: global minimum variance
//! - [`Objective::TargetReturn`]: minimum variance at a required return
//! - [`Objective::EfficientFrontier`]: sweep of target-return solutions
//! - [`Objective::Constrained`]: any of the above plus sector and turnover limits
//!
//! ## Failure Model
//!
//! Malformed requests are [`AnalyticsError::Validation`](folio_core::AnalyticsError).
//! Infeasible constraints, unreachable targets and non-convergence are
//! returned as [`OptimizationOutcome::Failed`] with diagnostics, so callers
//! can relax the request and retry.
//!
//! ## Example
//!
//! ```rust
//! use folio_core::math::linalg::SymmetricMatrix;
//! use folio_models::ReturnStatistics;
//! use folio_optimiser::{Objective, OptimizationRequest, PortfolioOptimizer};
//!
//! let stats = ReturnStatistics::from_annualised(
//!     vec!["EQ".into(), "BD".into(), "CASH".into()],
//!     vec![0.07, 0.04, 0.01],
//!     SymmetricMatrix::diagonal(&[0.0225, 0.0025, 0.0001]),
//! )
//! .unwrap();
//! let request = OptimizationRequest::new(
//!     stats.symbols().to_vec(),
//!     Objective::EfficientFrontier { points: Some(5) },
//! );
//! let outcome = PortfolioOptimizer::with_defaults().optimise(&request, &stats).unwrap();
//! let result = outcome.result().unwrap();
//! let frontier = result.frontier.as_ref().unwrap();
//! assert!(frontier.windows(2).all(|p| p[0].volatility <= p[1].volatility));
//! assert!((result.weights.iter().sum::<f64>() - 1.0).abs() < 1e-6);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod frontier;
pub mod lagrangian;
pub mod request;
pub mod result;

mod optimizer;
mod problem;

pub use lagrangian::{ALConfig, AugmentedLagrangian, LinearConstraint};
pub use optimizer::{OptimizerConfig, PortfolioOptimizer, DEFAULT_FRONTIER_POINTS};
pub use request::{
    AssetBounds, Objective, OptimizationRequest, SectorConstraint, TurnoverConstraint,
};
pub use result::{
    ConstraintDiagnostic, FailureReason, FrontierPoint, OptimizationFailure,
    OptimizationOutcome, OptimizationResult,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::request::*;
    pub use crate::result::*;
    pub use crate::{OptimizerConfig, PortfolioOptimizer};
}

//! # Folio Models (L2: Business Logic)
//!
//! Statistical and stochastic models for portfolio projection.
//!
//! This crate provides:
//! - Return statistics estimation with covariance regularisation
//!   ([`estimation`])
//! - Correlated geometric Brownian motion for multi-asset paths ([`models`])
//! - Contribution and drift-triggered rebalancing policy applied to a
//!   portfolio book ([`policy`])
//!
//! ## Design Principles
//!
//! - **Validated construction**: every public type checks its invariants once
//!   and is immutable afterwards
//! - **No I/O, no global state**: all randomness is supplied by the caller
//! - **Shared policy**: the simulator and the rebalancing analyzer drive the
//!   same [`policy::ContributionRebalancingPolicy`]

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod estimation;
pub mod models;
pub mod policy;

pub use estimation::{
    regularise_covariance, EstimatorConfig, Regularisation, ReturnStatistics,
    ReturnStatisticsEstimator,
};
pub use models::{CorrelatedGbm, StepModel};
pub use policy::{
    Contribution, ContributionRebalancingPolicy, PortfolioBook, RebalanceAction, RebalanceEvent,
    RebalancingRule, StepOutcome,
};

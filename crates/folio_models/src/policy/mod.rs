//! Contribution and rebalancing policy.
//!
//! - [`PortfolioBook`]: Per-path holdings with policy bookkeeping
//! - [`Contribution`], [`RebalancingRule`]: Policy parameters
//! - [`ContributionRebalancingPolicy`]: Applies both after each step of
//!   price evolution and reports [`RebalanceEvent`]s
//!
//! The same policy drives simulated paths and historical back-tests, so a
//! rule evaluated on history behaves exactly as it does in projection.

mod book;
mod rebalancing;
mod rules;

pub use book::PortfolioBook;
pub use rebalancing::{ContributionRebalancingPolicy, RebalanceAction, RebalanceEvent, StepOutcome};
pub use rules::{Contribution, RebalancingRule};

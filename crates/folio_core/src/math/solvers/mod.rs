//! Constrained minimisation for allocation problems.
//!
//! ## Available Solvers
//!
//! - [`ProjectedGradientSolver`]: First-order descent for smooth objectives
//!   over any convex set with a cheap Euclidean projection
//!
//! ## Feasible Sets
//!
//! - [`CappedSimplex`]: `{w : Σw = 1, lo ≤ w ≤ hi}` with exact projection
//!
//! ## Configuration
//!
//! [`PGConfig`] controls:
//! - `tolerance`: Projected gradient map tolerance (default: 1e-10)
//! - `max_iterations`: Maximum accepted steps (default: 20000)
//! - `armijo` / `backtrack`: Line search constants
//!
//! Penalty and multiplier handling for extra constraints (return targets,
//! sector limits, turnover) lives with the optimiser, which wraps this solver
//! in an augmented Lagrangian loop.

mod projected_gradient;
mod projection;

pub use projected_gradient::{PGConfig, PGResult, ProjectedGradientSolver};
pub use projection::CappedSimplex;

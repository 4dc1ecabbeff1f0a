//! Stochastic return models for path simulation.
//!
//! - [`StepModel`] trait: Maps independent standard normals to one step of
//!   per-asset log-returns
//! - [`CorrelatedGbm`]: Multi-asset geometric Brownian motion with Cholesky
//!   correlated shocks

pub mod gbm;

pub use gbm::CorrelatedGbm;

/// One-step generator of per-asset log-returns.
///
/// Implementations are immutable and shared across simulation threads; all
/// randomness is supplied by the caller as independent standard normals.
pub trait StepModel: Send + Sync {
    /// Number of assets (and of normals consumed per step).
    fn n_assets(&self) -> usize;

    /// Writes the log-return of every asset for one step into `out`, given
    /// `n_assets()` independent standard normals in `z`.
    fn evolve_step(&self, z: &[f64], out: &mut [f64]);
}

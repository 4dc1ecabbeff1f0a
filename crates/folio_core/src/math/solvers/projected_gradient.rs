//! Projected gradient descent with Armijo backtracking.
//!
//! Minimises a smooth objective `f` over a closed convex set `C` given only
//! the Euclidean projection `P_C`:
//!
//! ```text
//! x_{k+1} = P_C(x_k − α_k ∇f(x_k))
//! ```
//!
//! The step `α_k` is halved until the Armijo condition
//! `f(x_{k+1}) ≤ f(x_k) + c · ∇f(x_k)ᵀ(x_{k+1} − x_k)` holds, and doubled
//! after each accepted step. Convergence is declared when the projected
//! gradient map `‖P_C(x − ∇f(x)) − x‖∞` falls below the tolerance. A step
//! that no longer lowers `f` ends the run as a stall, judged against the
//! looser `stall_tolerance`.
//!
//! # Example
//!
//! ```
//! use folio_core::math::solvers::{CappedSimplex, ProjectedGradientSolver};
//!
//! // Minimise (w0 - 0.8)² + (w1 - 0.8)² on the simplex: optimum at (0.5, 0.5)
//! let simplex = CappedSimplex::long_only(2);
//! let solver = ProjectedGradientSolver::with_defaults();
//! let result = solver
//!     .solve(
//!         |w: &[f64]| {
//!             let f = (w[0] - 0.8).powi(2) + (w[1] - 0.8).powi(2);
//!             (f, vec![2.0 * (w[0] - 0.8), 2.0 * (w[1] - 0.8)])
//!         },
//!         |w: &mut [f64]| simplex.project(w),
//!         vec![1.0, 0.0],
//!     )
//!     .unwrap();
//! assert!(result.converged);
//! assert!((result.params[0] - 0.5).abs() < 1e-8);
//! ```

use crate::types::SolverError;

/// Configuration for the projected gradient solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PGConfig {
    /// Convergence tolerance on the projected gradient map (infinity norm).
    pub tolerance: f64,
    /// Maximum number of accepted steps.
    pub max_iterations: usize,
    /// Initial step length.
    pub initial_step: f64,
    /// Upper bound on the step length.
    pub max_step: f64,
    /// Minimum step length before the line search gives up.
    pub min_step: f64,
    /// Armijo sufficient-decrease constant.
    pub armijo: f64,
    /// Step shrink factor on rejection.
    pub backtrack: f64,
    /// Projected-gradient level accepted as converged when the line search
    /// stalls at round-off.
    pub stall_tolerance: f64,
}

impl Default for PGConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 20_000,
            initial_step: 1.0,
            max_step: 1e6,
            min_step: 1e-14,
            armijo: 1e-4,
            backtrack: 0.5,
            stall_tolerance: 1e-6,
        }
    }
}

impl PGConfig {
    /// Create a configuration with the given tolerance and iteration cap.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    /// Relaxed tolerances for inner solves that are re-run many times.
    pub fn fast() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 5_000,
            ..Default::default()
        }
    }
}

/// Result of a projected gradient run.
#[derive(Debug, Clone, PartialEq)]
pub struct PGResult {
    /// Final iterate (always feasible).
    pub params: Vec<f64>,
    /// Objective at the final iterate.
    pub objective: f64,
    /// Final projected gradient map norm.
    pub stationarity: f64,
    /// Number of accepted steps.
    pub iterations: usize,
    /// Whether convergence was achieved.
    pub converged: bool,
}

/// Projected gradient solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectedGradientSolver {
    config: PGConfig,
}

impl ProjectedGradientSolver {
    /// Create a solver with the given configuration.
    pub fn new(config: PGConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Solver configuration.
    pub fn config(&self) -> &PGConfig {
        &self.config
    }

    /// Minimise `objective` over the set defined by `project`.
    ///
    /// `objective` returns the value and gradient at a point. `project`
    /// replaces its argument with the nearest feasible point. The initial
    /// point is projected before the first evaluation.
    ///
    /// Hitting the iteration cap is not an error: the best iterate is
    /// returned with `converged = false`.
    ///
    /// # Errors
    ///
    /// [`SolverError::NumericalInstability`] if the objective or gradient at
    /// the initial point is not finite.
    pub fn solve<F, P>(
        &self,
        mut objective: F,
        project: P,
        initial: Vec<f64>,
    ) -> Result<PGResult, SolverError>
    where
        F: FnMut(&[f64]) -> (f64, Vec<f64>),
        P: Fn(&mut [f64]),
    {
        let cfg = &self.config;
        let n = initial.len();
        let mut x = initial;
        project(&mut x);

        let (mut f, mut g) = objective(&x);
        if !f.is_finite() || g.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NumericalInstability(format!(
                "objective not finite at initial point (f = {})",
                f
            )));
        }

        let mut step = cfg.initial_step;
        let mut trial = vec![0.0; n];
        let mut stationarity = projected_gradient_norm(&x, &g, &project, &mut trial);
        let mut iterations = 0;

        while iterations < cfg.max_iterations {
            if stationarity <= cfg.tolerance {
                return Ok(PGResult {
                    params: x,
                    objective: f,
                    stationarity,
                    iterations,
                    converged: true,
                });
            }

            let accepted = loop {
                for i in 0..n {
                    trial[i] = x[i] - step * g[i];
                }
                project(&mut trial);

                let directional: f64 = (0..n).map(|i| g[i] * (trial[i] - x[i])).sum();
                let (ft, gt) = objective(&trial);
                let finite = ft.is_finite() && gt.iter().all(|v| v.is_finite());
                if finite && ft <= f + cfg.armijo * directional {
                    break Some((ft, gt));
                }
                step *= cfg.backtrack;
                if step < cfg.min_step {
                    break None;
                }
            };

            match accepted {
                Some((ft, gt)) => {
                    let progressed = ft < f;
                    std::mem::swap(&mut x, &mut trial);
                    f = ft;
                    g = gt;
                    iterations += 1;
                    step = (step * 2.0).min(cfg.max_step);
                    stationarity = projected_gradient_norm(&x, &g, &project, &mut trial);
                    // Armijo admits a zero step when the directional derivative
                    // vanishes at round-off; treat it as a stall.
                    if !progressed && stationarity > cfg.tolerance {
                        return Ok(PGResult {
                            params: x,
                            objective: f,
                            stationarity,
                            iterations,
                            converged: stationarity <= cfg.stall_tolerance,
                        });
                    }
                }
                None => {
                    // Line search exhausted: no descent possible at machine precision
                    return Ok(PGResult {
                        params: x,
                        objective: f,
                        stationarity,
                        iterations,
                        converged: stationarity <= cfg.stall_tolerance,
                    });
                }
            }
        }

        Ok(PGResult {
            params: x,
            objective: f,
            converged: stationarity <= cfg.tolerance,
            stationarity,
            iterations,
        })
    }
}

fn projected_gradient_norm<P>(x: &[f64], g: &[f64], project: &P, buf: &mut [f64]) -> f64
where
    P: Fn(&mut [f64]),
{
    for i in 0..x.len() {
        buf[i] = x[i] - g[i];
    }
    project(buf);
    buf.iter()
        .zip(x)
        .map(|(b, xi)| (b - xi).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::solvers::CappedSimplex;
    use approx::assert_relative_eq;

    #[test]
    fn test_unconstrained_quadratic() {
        let solver = ProjectedGradientSolver::with_defaults();
        let result = solver
            .solve(
                |x: &[f64]| {
                    let f = (x[0] - 2.0).powi(2) + 10.0 * (x[1] + 1.0).powi(2);
                    (f, vec![2.0 * (x[0] - 2.0), 20.0 * (x[1] + 1.0)])
                },
                |_: &mut [f64]| {},
                vec![0.0, 0.0],
            )
            .unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(result.params[1], -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_minimum_variance_on_simplex() {
        // Uncorrelated variances 0.04 and 0.01: optimum w ∝ 1/σ² = (0.2, 0.8)
        let simplex = CappedSimplex::long_only(2);
        let solver = ProjectedGradientSolver::with_defaults();
        let result = solver
            .solve(
                |w: &[f64]| {
                    let f = 0.04 * w[0] * w[0] + 0.01 * w[1] * w[1];
                    (f, vec![0.08 * w[0], 0.02 * w[1]])
                },
                |w: &mut [f64]| simplex.project(w),
                vec![0.5, 0.5],
            )
            .unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.params[0], 0.2, epsilon = 1e-6);
        assert_relative_eq!(result.params[1], 0.8, epsilon = 1e-6);
        assert_relative_eq!(result.objective, 0.008, epsilon = 1e-10);
    }

    #[test]
    fn test_active_bound() {
        // Linear objective pushes all weight to the cheapest asset up to its cap
        let simplex = CappedSimplex::new(vec![0.0; 3], vec![0.6, 1.0, 1.0]).unwrap();
        let solver = ProjectedGradientSolver::with_defaults();
        let result = solver
            .solve(
                |w: &[f64]| (w[0] * -3.0 + w[1] * -2.0 + w[2], vec![-3.0, -2.0, 1.0]),
                |w: &mut [f64]| simplex.project(w),
                vec![1.0 / 3.0; 3],
            )
            .unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.params[0], 0.6, epsilon = 1e-9);
        assert_relative_eq!(result.params[1], 0.4, epsilon = 1e-9);
        assert_relative_eq!(result.params[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_correlated_minimum_variance_with_zero_weight() {
        // Optimum sits on the w0 = 0 face: (0, 0.264, 0.736) approximately
        let cov = [[0.04, 0.018, 0.006], [0.018, 0.0225, 0.003], [0.006, 0.003, 0.01]];
        let simplex = CappedSimplex::long_only(3);
        let solver = ProjectedGradientSolver::with_defaults();
        let result = solver
            .solve(
                |w: &[f64]| {
                    let sw: Vec<f64> = (0..3)
                        .map(|i| (0..3).map(|j| cov[i][j] * w[j]).sum())
                        .collect();
                    let f: f64 = (0..3).map(|i| w[i] * sw[i]).sum();
                    (f, sw.iter().map(|v| 2.0 * v).collect())
                },
                |w: &mut [f64]| simplex.project(w),
                vec![1.0 / 3.0; 3],
            )
            .unwrap();
        assert!(result.converged);
        assert!(result.iterations < 1_000, "took {} steps", result.iterations);
        assert_relative_eq!(result.params[0], 0.0, epsilon = 1e-9);
        // First-order conditions on the free pair: (Σw)_1 = (Σw)_2
        let w = &result.params;
        let g1 = 0.018 * w[0] + 0.0225 * w[1] + 0.003 * w[2];
        let g2 = 0.006 * w[0] + 0.003 * w[1] + 0.01 * w[2];
        assert_relative_eq!(g1, g2, epsilon = 1e-9);
        assert_relative_eq!(w[1], 0.007 / 0.0265, epsilon = 1e-7);
    }

    #[test]
    fn test_flat_objective_stalls_instead_of_spinning() {
        // Constant objective: every step is a zero-progress Armijo step
        let simplex = CappedSimplex::long_only(2);
        let solver = ProjectedGradientSolver::new(PGConfig {
            tolerance: 0.0,
            ..Default::default()
        });
        let result = solver
            .solve(
                |_: &[f64]| (1.0, vec![1.0, 1.0]),
                |w: &mut [f64]| simplex.project(w),
                vec![0.5, 0.5],
            )
            .unwrap();
        assert!(result.converged);
        assert!(result.iterations <= 1);
    }

    #[test]
    fn test_initial_nan_is_error() {
        let solver = ProjectedGradientSolver::with_defaults();
        let err = solver
            .solve(
                |_: &[f64]| (f64::NAN, vec![0.0]),
                |_: &mut [f64]| {},
                vec![0.0],
            )
            .unwrap_err();
        assert!(matches!(err, SolverError::NumericalInstability(_)));
    }

    #[test]
    fn test_iteration_cap_reports_not_converged() {
        let solver = ProjectedGradientSolver::new(PGConfig {
            max_iterations: 1,
            max_step: 1e-3,
            initial_step: 1e-3,
            ..Default::default()
        });
        let result = solver
            .solve(
                |x: &[f64]| ((x[0] - 100.0).powi(2), vec![2.0 * (x[0] - 100.0)]),
                |_: &mut [f64]| {},
                vec![0.0],
            )
            .unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
    }
}

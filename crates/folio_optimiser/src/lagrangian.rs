//! Augmented Lagrangian outer loop around the projected gradient solver.
//!
//! The projected gradient solver handles the set that has a cheap exact
//! projection (the capped simplex plus boxes for auxiliary variables). Every
//! other linear constraint is moved into the objective with the
//! Powell-Hestenes-Rockafellar penalty
//!
//! ```text
//! L(x) = f(x) + Σ_eq (λ h + ρ/2 h²) + Σ_ineq (max(0, λ + ρ g)² − λ²) / 2ρ
//! ```
//!
//! and the multipliers are updated between inner solves.

use folio_core::math::linalg::dot;
use folio_core::math::solvers::{PGConfig, ProjectedGradientSolver};
use folio_core::SolverError;
use tracing::trace;

/// Sense of a [`LinearConstraint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `a·x ≤ b`
    Inequality,
    /// `a·x = b`
    Equality,
}

/// Linear constraint, stored with a unit-norm coefficient vector so that
/// residuals are comparable across constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    kind: ConstraintKind,
    coefficients: Vec<f64>,
    bound: f64,
}

impl LinearConstraint {
    /// `a·x ≤ b`.
    pub fn less_equal(coefficients: Vec<f64>, bound: f64) -> Self {
        Self::normalised(ConstraintKind::Inequality, coefficients, bound)
    }

    /// `a·x = b`.
    pub fn equal(coefficients: Vec<f64>, bound: f64) -> Self {
        Self::normalised(ConstraintKind::Equality, coefficients, bound)
    }

    fn normalised(kind: ConstraintKind, mut coefficients: Vec<f64>, mut bound: f64) -> Self {
        let norm = dot(&coefficients, &coefficients).sqrt();
        if norm > 0.0 {
            coefficients.iter_mut().for_each(|a| *a /= norm);
            bound /= norm;
        }
        Self {
            kind,
            coefficients,
            bound,
        }
    }

    /// Constraint sense.
    #[inline]
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// `a·x − b`; feasible when `≤ 0` (inequality) or `= 0` (equality).
    #[inline]
    pub fn residual(&self, x: &[f64]) -> f64 {
        dot(&self.coefficients, x) - self.bound
    }

    /// Amount by which `x` violates the constraint.
    #[inline]
    pub fn violation(&self, x: &[f64]) -> f64 {
        let r = self.residual(x);
        match self.kind {
            ConstraintKind::Inequality => r.max(0.0),
            ConstraintKind::Equality => r.abs(),
        }
    }
}

/// Outer loop settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ALConfig {
    /// Inner projected gradient settings
    pub inner: PGConfig,
    /// Maximum normalised constraint violation accepted as feasible
    pub feasibility_tolerance: f64,
    /// Maximum multiplier updates
    pub max_outer_iterations: usize,
    /// Starting penalty weight ρ
    pub initial_penalty: f64,
    /// Factor applied to ρ when the violation does not shrink enough
    pub penalty_growth: f64,
    /// Cap on ρ
    pub max_penalty: f64,
    /// Required violation reduction per outer iteration before ρ grows
    pub sufficient_decrease: f64,
}

impl Default for ALConfig {
    fn default() -> Self {
        Self {
            inner: PGConfig::default(),
            feasibility_tolerance: 1e-8,
            max_outer_iterations: 50,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            max_penalty: 1e6,
            sufficient_decrease: 0.25,
        }
    }
}

/// Result of an augmented Lagrangian run.
#[derive(Debug, Clone, PartialEq)]
pub struct ALResult {
    /// Final iterate, inside the projected set
    pub params: Vec<f64>,
    /// Largest normalised violation of the penalised constraints
    pub violation: f64,
    /// Projected gradient steps over all inner solves
    pub iterations: usize,
    /// Multiplier updates performed
    pub outer_iterations: usize,
    /// Feasible within tolerance and the last inner solve converged
    pub converged: bool,
}

/// Augmented Lagrangian solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct AugmentedLagrangian {
    config: ALConfig,
}

impl AugmentedLagrangian {
    /// Solver with the given settings.
    pub fn new(config: ALConfig) -> Self {
        Self { config }
    }

    /// Settings.
    pub fn config(&self) -> &ALConfig {
        &self.config
    }

    /// Minimises `objective` over the set defined by `project` subject to
    /// `constraints`.
    ///
    /// Without constraints this is a single projected gradient solve.
    ///
    /// # Errors
    ///
    /// [`SolverError::NumericalInstability`] from the inner solver.
    pub fn solve<F, P>(
        &self,
        mut objective: F,
        project: P,
        constraints: &[LinearConstraint],
        initial: Vec<f64>,
    ) -> Result<ALResult, SolverError>
    where
        F: FnMut(&[f64]) -> (f64, Vec<f64>),
        P: Fn(&mut [f64]),
    {
        let cfg = &self.config;
        let inner = ProjectedGradientSolver::new(cfg.inner);

        if constraints.is_empty() {
            let pg = inner.solve(objective, project, initial)?;
            return Ok(ALResult {
                params: pg.params,
                violation: 0.0,
                iterations: pg.iterations,
                outer_iterations: 1,
                converged: pg.converged,
            });
        }

        let mut multipliers = vec![0.0; constraints.len()];
        let mut penalty = cfg.initial_penalty;
        let mut previous = f64::INFINITY;
        let mut iterations = 0;
        let mut x = initial;

        for outer in 1..=cfg.max_outer_iterations {
            let rho = penalty;
            let lambda = &multipliers;
            let pg = inner.solve(
                |x: &[f64]| {
                    let (mut f, mut g) = objective(x);
                    for (c, &l) in constraints.iter().zip(lambda) {
                        let r = c.residual(x);
                        let (value, slope) = match c.kind {
                            ConstraintKind::Inequality => {
                                let t = l + rho * r;
                                if t > 0.0 {
                                    ((t * t - l * l) / (2.0 * rho), t)
                                } else {
                                    (-l * l / (2.0 * rho), 0.0)
                                }
                            }
                            ConstraintKind::Equality => (l * r + 0.5 * rho * r * r, l + rho * r),
                        };
                        f += value;
                        if slope != 0.0 {
                            for (gi, ai) in g.iter_mut().zip(&c.coefficients) {
                                *gi += slope * ai;
                            }
                        }
                    }
                    (f, g)
                },
                &project,
                x,
            )?;
            iterations += pg.iterations;
            x = pg.params;

            // Primal violation combined with complementarity of inactive rows
            let kkt_gap = constraints
                .iter()
                .zip(&multipliers)
                .map(|(c, &l)| match c.kind {
                    ConstraintKind::Inequality => c.residual(&x).max(-l / rho).abs(),
                    ConstraintKind::Equality => c.residual(&x).abs(),
                })
                .fold(0.0, f64::max);

            for (c, l) in constraints.iter().zip(multipliers.iter_mut()) {
                let r = c.residual(&x);
                *l = match c.kind {
                    ConstraintKind::Inequality => (*l + rho * r).max(0.0),
                    ConstraintKind::Equality => *l + rho * r,
                };
            }

            trace!(outer, rho, kkt_gap, inner = pg.iterations, "augmented lagrangian step");

            if kkt_gap <= cfg.feasibility_tolerance && pg.converged {
                return Ok(ALResult {
                    violation: max_violation(constraints, &x),
                    params: x,
                    iterations,
                    outer_iterations: outer,
                    converged: true,
                });
            }
            if kkt_gap > cfg.sufficient_decrease * previous {
                penalty = (penalty * cfg.penalty_growth).min(cfg.max_penalty);
            }
            previous = kkt_gap;
        }

        Ok(ALResult {
            violation: max_violation(constraints, &x),
            params: x,
            iterations,
            outer_iterations: cfg.max_outer_iterations,
            converged: false,
        })
    }
}

fn max_violation(constraints: &[LinearConstraint], x: &[f64]) -> f64 {
    constraints
        .iter()
        .map(|c| c.violation(x))
        .fold(0.0, f64::max)
}

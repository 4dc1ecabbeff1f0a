//! Allocation problems in solver form.
//!
//! The decision vector is `x = (w, u)`: the asset weights, followed by one
//! auxiliary variable per asset when a turnover limit is present. The
//! auxiliaries bound `|w − w_current|` from above, which turns the turnover
//! limit into the linear rows
//!
//! ```text
//!  w_i − u_i ≤ c_i,   −w_i − u_i ≤ −c_i,   Σu ≤ T
//! ```
//!
//! Weights live on the capped simplex and auxiliaries in `[0, 1]`, both of
//! which the projected gradient solver handles by projection.

use crate::lagrangian::{ALResult, AugmentedLagrangian, LinearConstraint};
use crate::request::{OptimizationRequest, TurnoverConstraint};
use crate::result::ConstraintDiagnostic;
use folio_core::math::linalg::dot;
use folio_core::math::solvers::CappedSimplex;
use folio_core::SolverError;
use folio_models::ReturnStatistics;

/// Variance below which the Sharpe objective is undefined.
const MIN_VARIANCE: f64 = 1e-16;

/// Quantity to optimise over the feasible set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Goal {
    MinVariance,
    MaxSharpe { risk_free_rate: f64 },
    TargetReturn(f64),
    MaxReturn,
}

#[derive(Debug, Clone)]
struct SectorLimit {
    name: String,
    members: Vec<usize>,
    min: f64,
    max: f64,
}

/// Feasible set and data of one optimisation request.
#[derive(Debug, Clone)]
pub(crate) struct Allocation<'a> {
    stats: &'a ReturnStatistics,
    simplex: CappedSimplex,
    sectors: Vec<SectorLimit>,
    turnover: Option<&'a TurnoverConstraint>,
    rows: Vec<LinearConstraint>,
    variance_scale: f64,
}

impl<'a> Allocation<'a> {
    /// Builds the problem for a validated request on matching statistics.
    ///
    /// # Errors
    ///
    /// [`SolverError::InfeasibleConstraints`] when the bounds cannot sum to one.
    pub(crate) fn new(
        request: &'a OptimizationRequest,
        stats: &'a ReturnStatistics,
    ) -> Result<Self, SolverError> {
        let n = stats.n_assets();
        let (lower, upper) = request.bound_vectors();
        let simplex = CappedSimplex::new(lower, upper)?;
        let turnover = request.turnover.as_ref();
        let dim = n + turnover.map_or(0, |_| n);

        let sectors: Vec<SectorLimit> = request
            .sector_constraints
            .iter()
            .map(|s| SectorLimit {
                name: s.name.clone(),
                members: s
                    .symbols
                    .iter()
                    .filter_map(|sym| stats.index_of(sym))
                    .collect(),
                min: s.min_weight,
                max: s.max_weight,
            })
            .collect();

        let mut rows = Vec::new();
        for sector in &sectors {
            if sector.max < 1.0 {
                let mut a = vec![0.0; dim];
                sector.members.iter().for_each(|&i| a[i] = 1.0);
                rows.push(LinearConstraint::less_equal(a, sector.max));
            }
            if sector.min > 0.0 {
                let mut a = vec![0.0; dim];
                sector.members.iter().for_each(|&i| a[i] = -1.0);
                rows.push(LinearConstraint::less_equal(a, -sector.min));
            }
        }
        if let Some(t) = turnover {
            for (i, &c) in t.current_weights.iter().enumerate() {
                let mut up = vec![0.0; dim];
                up[i] = 1.0;
                up[n + i] = -1.0;
                rows.push(LinearConstraint::less_equal(up, c));

                let mut down = vec![0.0; dim];
                down[i] = -1.0;
                down[n + i] = -1.0;
                rows.push(LinearConstraint::less_equal(down, -c));
            }
            let mut total = vec![0.0; dim];
            total[n..].iter_mut().for_each(|a| *a = 1.0);
            rows.push(LinearConstraint::less_equal(total, t.max_turnover));
        }

        let diag = stats.covariance().diag();
        let mean_variance = diag.iter().sum::<f64>() / n as f64;
        let variance_scale = if mean_variance > 0.0 {
            mean_variance
        } else {
            1.0
        };

        Ok(Self {
            stats,
            simplex,
            sectors,
            turnover,
            rows,
            variance_scale,
        })
    }

    #[inline]
    pub(crate) fn n_assets(&self) -> usize {
        self.stats.n_assets()
    }

    #[inline]
    fn dim(&self) -> usize {
        self.n_assets() + self.turnover.map_or(0, |_| self.n_assets())
    }

    #[inline]
    pub(crate) fn stats(&self) -> &'a ReturnStatistics {
        self.stats
    }

    /// Returns `true` when sector or turnover rows are present.
    pub(crate) fn has_linear_constraints(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Lowest and highest returns reachable under the bounds alone.
    pub(crate) fn bound_return_range(&self) -> (f64, f64) {
        let mean = self.stats.mean_returns();
        (
            extreme_return(mean, self.simplex.lower(), self.simplex.upper(), false),
            extreme_return(mean, self.simplex.lower(), self.simplex.upper(), true),
        )
    }

    /// Asset weights of a solver iterate.
    pub(crate) fn weights(&self, params: &[f64]) -> Vec<f64> {
        params[..self.n_assets()].to_vec()
    }

    fn initial_point(&self) -> Vec<f64> {
        let n = self.n_assets();
        let mut w = match self.turnover {
            Some(t) => t.current_weights.clone(),
            None => vec![1.0 / n as f64; n],
        };
        self.simplex.project(&mut w);
        if let Some(t) = self.turnover {
            let aux: Vec<f64> = w
                .iter()
                .zip(&t.current_weights)
                .map(|(a, b)| (a - b).abs())
                .collect();
            w.extend(aux);
        }
        w
    }

    fn project(&self, x: &mut [f64]) {
        let n = self.n_assets();
        let (w, aux) = x.split_at_mut(n);
        self.simplex.project(w);
        aux.iter_mut().for_each(|u| *u = u.clamp(0.0, 1.0));
    }

    /// Value and gradient of `goal` at `x`, scaled to order one.
    fn evaluate(&self, goal: Goal, x: &[f64]) -> (f64, Vec<f64>) {
        let n = self.n_assets();
        let w = &x[..n];
        let mean = self.stats.mean_returns();
        let mut grad = vec![0.0; self.dim()];

        match goal {
            Goal::MinVariance | Goal::TargetReturn(_) => {
                let sw = self.stats.covariance().mul_vec(w);
                let scale = self.variance_scale;
                for (g, s) in grad.iter_mut().zip(&sw) {
                    *g = 2.0 * s / scale;
                }
                (dot(w, &sw) / scale, grad)
            }
            Goal::MaxSharpe { risk_free_rate } => {
                let sw = self.stats.covariance().mul_vec(w);
                let variance = dot(w, &sw);
                if variance <= MIN_VARIANCE {
                    return (f64::INFINITY, grad);
                }
                let sd = variance.sqrt();
                let excess = dot(w, mean) - risk_free_rate;
                for i in 0..n {
                    grad[i] = -(mean[i] / sd - excess * sw[i] / (variance * sd));
                }
                (-excess / sd, grad)
            }
            Goal::MaxReturn => {
                let scale = mean.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
                let scale = if scale > 0.0 { scale } else { 1.0 };
                for (g, m) in grad.iter_mut().zip(mean) {
                    *g = -m / scale;
                }
                (-dot(w, mean) / scale, grad)
            }
        }
    }

    /// Runs the augmented Lagrangian for `goal`.
    pub(crate) fn solve(
        &self,
        goal: Goal,
        solver: &AugmentedLagrangian,
    ) -> Result<ALResult, SolverError> {
        let mut rows = self.rows.clone();
        if let Goal::TargetReturn(target) = goal {
            let mut a = vec![0.0; self.dim()];
            a[..self.n_assets()].copy_from_slice(self.stats.mean_returns());
            rows.push(LinearConstraint::equal(a, target));
        }
        solver.solve(
            |x: &[f64]| self.evaluate(goal, x),
            |x: &mut [f64]| self.project(x),
            &rows,
            self.initial_point(),
        )
    }

    /// State of the budget, sector, turnover and target constraints at `weights`.
    pub(crate) fn diagnostics(&self, weights: &[f64], goal: Goal) -> Vec<ConstraintDiagnostic> {
        let mut out = vec![ConstraintDiagnostic::new(
            "budget",
            weights.iter().sum(),
            Some(1.0),
            Some(1.0),
        )];
        for sector in &self.sectors {
            let value = sector.members.iter().map(|&i| weights[i]).sum();
            out.push(ConstraintDiagnostic::new(
                format!("sector:{}", sector.name),
                value,
                Some(sector.min),
                Some(sector.max),
            ));
        }
        if let Some(t) = self.turnover {
            out.push(ConstraintDiagnostic::new(
                "turnover",
                t.turnover(weights),
                None,
                Some(t.max_turnover),
            ));
        }
        if let Goal::TargetReturn(target) = goal {
            out.push(ConstraintDiagnostic::new(
                "target_return",
                self.stats.expected_return(weights),
                Some(target),
                Some(target),
            ));
        }
        out
    }
}

/// Highest (or lowest) `wᵀμ` on the capped simplex: start from the lower
/// bounds and fill the best assets up to their upper bounds.
fn extreme_return(mean: &[f64], lower: &[f64], upper: &[f64], highest: bool) -> f64 {
    let mut order: Vec<usize> = (0..mean.len()).collect();
    order.sort_by(|&a, &b| mean[a].total_cmp(&mean[b]));
    if highest {
        order.reverse();
    }
    let mut remaining = 1.0 - lower.iter().sum::<f64>();
    let mut value = dot(lower, mean);
    for i in order {
        if remaining <= 0.0 {
            break;
        }
        let add = (upper[i] - lower[i]).min(remaining);
        value += add * mean[i];
        remaining -= add;
    }
    value
}

//! Optimisation requests.
//!
//! A request names the asset universe, the objective and any constraints on
//! top of the budget `Σw = 1`. Requests are plain data: they deserialise from
//! JSON or TOML and are checked by [`OptimizationRequest::validate`] before
//! any solver work starts.

use folio_core::{validate_weights, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// What the optimiser is asked to find.
///
/// # Examples
///
/// ```
/// use folio_optimiser::Objective;
///
/// let json = r#"{"kind":"constrained","base":{"kind":"target_return","target":0.06}}"#;
/// let objective: Objective = serde_json::from_str(json).unwrap();
/// assert!(objective.is_constrained());
/// assert_eq!(objective.base(), &Objective::TargetReturn { target: 0.06 });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Objective {
    /// Maximise `(wᵀμ − rf) / √(wᵀΣw)`.
    MaxSharpe,
    /// Minimise `wᵀΣw`.
    MinVolatility,
    /// Minimise `wᵀΣw` subject to `wᵀμ = target`.
    TargetReturn {
        /// Annualised target return
        target: f64,
    },
    /// Trace minimum-variance portfolios from the min-volatility return to
    /// the highest achievable return.
    EfficientFrontier {
        /// Number of target returns to sweep; the optimiser default when absent
        #[serde(default)]
        points: Option<usize>,
    },
    /// Any of the above, with sector and turnover constraints enabled.
    Constrained {
        /// Underlying objective
        base: Box<Objective>,
    },
}

impl Objective {
    /// Wraps `base` so that sector and turnover constraints apply.
    pub fn constrained(base: Objective) -> Self {
        Objective::Constrained {
            base: Box::new(base),
        }
    }

    /// Returns `true` for [`Objective::Constrained`].
    pub fn is_constrained(&self) -> bool {
        matches!(self, Objective::Constrained { .. })
    }

    /// Objective with any [`Objective::Constrained`] wrapper removed.
    pub fn base(&self) -> &Objective {
        match self {
            Objective::Constrained { base } => base.base(),
            other => other,
        }
    }

    /// Stable snake_case name.
    pub fn label(&self) -> &'static str {
        match self {
            Objective::MaxSharpe => "max_sharpe",
            Objective::MinVolatility => "min_volatility",
            Objective::TargetReturn { .. } => "target_return",
            Objective::EfficientFrontier { .. } => "efficient_frontier",
            Objective::Constrained { .. } => "constrained",
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Objective::TargetReturn { target } if !target.is_finite() => Err(
                ValidationError::out_of_range("target", format!("must be finite, got {}", target)),
            ),
            Objective::EfficientFrontier { points: Some(p) } if *p < 2 => Err(
                ValidationError::out_of_range("points", format!("must be at least 2, got {}", p)),
            ),
            Objective::Constrained { base } if base.is_constrained() => Err(
                ValidationError::InvalidRequest("constrained objectives cannot be nested".into()),
            ),
            Objective::Constrained { base } => base.validate(),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Constrained { base } => write!(f, "constrained {}", base),
            Objective::TargetReturn { target } => write!(f, "target_return({})", target),
            other => f.write_str(other.label()),
        }
    }
}

/// Weight bounds for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetBounds {
    /// Minimum weight
    #[serde(default)]
    pub lower: f64,
    /// Maximum weight
    #[serde(default = "one")]
    pub upper: f64,
}

impl Default for AssetBounds {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }
}

impl AssetBounds {
    /// Bounds `[lower, upper]`.
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

/// Aggregate weight limits for a group of assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorConstraint {
    /// Sector name, used in diagnostics
    pub name: String,
    /// Member symbols
    pub symbols: Vec<String>,
    /// Minimum total weight
    #[serde(default)]
    pub min_weight: f64,
    /// Maximum total weight
    #[serde(default = "one")]
    pub max_weight: f64,
}

impl SectorConstraint {
    /// Sector `name` whose total weight must lie in `[min_weight, max_weight]`.
    pub fn new(
        name: impl Into<String>,
        symbols: Vec<String>,
        min_weight: f64,
        max_weight: f64,
    ) -> Self {
        Self {
            name: name.into(),
            symbols,
            min_weight,
            max_weight,
        }
    }
}

/// Limit on `Σ|w − w_current|`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnoverConstraint {
    /// Currently held weights
    pub current_weights: Vec<f64>,
    /// Maximum one-way plus return-way turnover
    pub max_turnover: f64,
}

impl TurnoverConstraint {
    /// Turnover limit against `current_weights`.
    pub fn new(current_weights: Vec<f64>, max_turnover: f64) -> Self {
        Self {
            current_weights,
            max_turnover,
        }
    }

    /// Turnover of `weights` against the current holdings.
    pub fn turnover(&self, weights: &[f64]) -> f64 {
        weights
            .iter()
            .zip(&self.current_weights)
            .map(|(w, c)| (w - c).abs())
            .sum()
    }
}

fn one() -> f64 {
    1.0
}

/// Allocation problem handed to
/// [`PortfolioOptimizer`](crate::PortfolioOptimizer).
///
/// Per-asset bounds apply to every objective. Sector and turnover
/// constraints are accepted only under [`Objective::Constrained`].
///
/// # Examples
///
/// ```
/// use folio_optimiser::{Objective, OptimizationRequest, SectorConstraint};
///
/// let request = OptimizationRequest::new(
///     vec!["EQ".into(), "BD".into(), "RE".into()],
///     Objective::constrained(Objective::MinVolatility),
/// )
/// .with_sector(SectorConstraint::new("real", vec!["RE".into()], 0.1, 0.3));
/// assert!(request.validate().is_ok());
///
/// let plain = OptimizationRequest::new(vec!["EQ".into()], Objective::MaxSharpe)
///     .with_sector(SectorConstraint::new("eq", vec!["EQ".into()], 0.0, 1.0));
/// assert!(plain.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// Asset universe, in the order of the return statistics
    pub symbols: Vec<String>,
    /// Objective
    pub objective: Objective,
    /// Per-asset bounds; `[0, 1]` for every asset when absent
    #[serde(default)]
    pub bounds: Option<Vec<AssetBounds>>,
    /// Sector aggregate limits
    #[serde(default)]
    pub sector_constraints: Vec<SectorConstraint>,
    /// Turnover limit against current holdings
    #[serde(default)]
    pub turnover: Option<TurnoverConstraint>,
    /// Annualised risk-free rate for Sharpe ratios
    #[serde(default)]
    pub risk_free_rate: f64,
}

impl OptimizationRequest {
    /// Long-only request without extra constraints.
    pub fn new(symbols: Vec<String>, objective: Objective) -> Self {
        Self {
            symbols,
            objective,
            bounds: None,
            sector_constraints: Vec::new(),
            turnover: None,
            risk_free_rate: 0.0,
        }
    }

    /// Sets per-asset bounds.
    pub fn with_bounds(mut self, bounds: Vec<AssetBounds>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Adds a sector constraint.
    pub fn with_sector(mut self, sector: SectorConstraint) -> Self {
        self.sector_constraints.push(sector);
        self
    }

    /// Sets the turnover limit.
    pub fn with_turnover(mut self, turnover: TurnoverConstraint) -> Self {
        self.turnover = Some(turnover);
        self
    }

    /// Sets the risk-free rate.
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Lower and upper bound vectors, defaulting to `[0, 1]`.
    pub fn bound_vectors(&self) -> (Vec<f64>, Vec<f64>) {
        match &self.bounds {
            Some(b) => b.iter().map(|x| (x.lower, x.upper)).unzip(),
            None => (vec![0.0; self.symbols.len()], vec![1.0; self.symbols.len()]),
        }
    }

    /// Returns `true` when sector or turnover constraints are present.
    pub fn has_linear_constraints(&self) -> bool {
        !self.sector_constraints.is_empty() || self.turnover.is_some()
    }

    /// Checks the request for malformed values.
    ///
    /// Bounds whose sum cannot reach one are not a validation error: the
    /// optimiser reports them as an infeasible outcome with diagnostics.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbols.is_empty() {
            return Err(ValidationError::EmptySymbols);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.symbols.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(ValidationError::DuplicateSymbol(dup.clone()));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ValidationError::out_of_range(
                "risk_free_rate",
                format!("must be finite, got {}", self.risk_free_rate),
            ));
        }
        self.objective.validate()?;

        if self.has_linear_constraints() && !self.objective.is_constrained() {
            return Err(ValidationError::InvalidRequest(format!(
                "sector and turnover constraints require a constrained objective, got {}",
                self.objective.label()
            )));
        }

        let n = self.symbols.len();
        if let Some(bounds) = &self.bounds {
            if bounds.len() != n {
                return Err(ValidationError::length_mismatch("bounds", n, bounds.len()));
            }
            for (b, symbol) in bounds.iter().zip(&self.symbols) {
                check_interval(&format!("bounds[{}]", symbol), b.lower, b.upper)?;
            }
        }

        for sector in &self.sector_constraints {
            if sector.symbols.is_empty() {
                return Err(ValidationError::InvalidRequest(format!(
                    "sector '{}' has no symbols",
                    sector.name
                )));
            }
            let mut members = HashSet::new();
            for s in &sector.symbols {
                if !self.symbols.contains(s) {
                    return Err(ValidationError::UnknownSymbol(s.clone()));
                }
                if !members.insert(s.as_str()) {
                    return Err(ValidationError::DuplicateSymbol(s.clone()));
                }
            }
            check_interval(
                &format!("sector[{}]", sector.name),
                sector.min_weight,
                sector.max_weight,
            )?;
        }

        if let Some(turnover) = &self.turnover {
            validate_weights(&turnover.current_weights, n)?;
            if !(turnover.max_turnover.is_finite() && turnover.max_turnover >= 0.0) {
                return Err(ValidationError::out_of_range(
                    "max_turnover",
                    format!("must be non-negative, got {}", turnover.max_turnover),
                ));
            }
        }
        Ok(())
    }
}

fn check_interval(name: &str, lower: f64, upper: f64) -> Result<(), ValidationError> {
    if !(lower.is_finite() && upper.is_finite() && 0.0 <= lower && lower <= upper && upper <= 1.0)
    {
        return Err(ValidationError::out_of_range(
            name,
            format!("need 0 <= lower <= upper <= 1, got [{}, {}]", lower, upper),
        ));
    }
    Ok(())
}

//! Simulation parameters.
//!
//! This module provides [`SimulationParameters`] and its validating
//! builder.

use folio_core::{validate_weights, EngineConfig, Frequency, ValidationError};
use folio_models::{Contribution, RebalancingRule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Minimum number of simulated paths.
pub const MIN_SIMULATIONS: usize = 100;

/// Maximum number of simulated paths.
pub const MAX_SIMULATIONS: usize = 1_000_000;

/// Minimum horizon in years.
pub const MIN_HORIZON_YEARS: f64 = 1.0;

/// Validated inputs of one simulation run.
///
/// Use [`SimulationParameters::builder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use folio_simulation::SimulationParameters;
///
/// let params = SimulationParameters::builder()
///     .symbols(vec!["EQ".into(), "BD".into()])
///     .target_weights(vec![0.6, 0.4])
///     .horizon_years(10.0)
///     .simulation_count(1000)
///     .initial_value(10_000.0)
///     .random_seed(42)
///     .build()
///     .expect("valid parameters");
///
/// assert_eq!(params.total_steps(), 2520);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    symbols: Vec<String>,
    target_weights: Vec<f64>,
    horizon_years: f64,
    simulation_count: usize,
    initial_value: f64,
    contribution: Option<Contribution>,
    rebalancing: Option<RebalancingRule>,
    periods_per_year: u32,
    random_seed: Option<u64>,
    confidence: f64,
    risk_free_rate: f64,
    recording_frequency: Frequency,
}

impl SimulationParameters {
    /// Creates a new parameter builder.
    #[inline]
    pub fn builder() -> SimulationParametersBuilder {
        SimulationParametersBuilder::default()
    }

    /// Builder pre-filled from engine configuration.
    ///
    /// Copies the path count, horizon, grid, seed, VaR confidence,
    /// risk-free rate and the rebalancing rule.
    pub fn builder_from_config(config: &EngineConfig) -> SimulationParametersBuilder {
        let mut builder = SimulationParametersBuilder::default()
            .horizon_years(config.horizon_years)
            .simulation_count(config.simulation_count)
            .periods_per_year(config.periods_per_year)
            .confidence(config.var_confidence)
            .risk_free_rate(config.risk_free_rate)
            .rebalancing(RebalancingRule::from(config));
        if let Some(seed) = config.random_seed {
            builder = builder.random_seed(seed);
        }
        builder
    }

    /// Asset symbols.
    #[inline]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Target allocation.
    #[inline]
    pub fn target_weights(&self) -> &[f64] {
        &self.target_weights
    }

    /// Horizon in years.
    #[inline]
    pub fn horizon_years(&self) -> f64 {
        self.horizon_years
    }

    /// Number of simulated paths.
    #[inline]
    pub fn simulation_count(&self) -> usize {
        self.simulation_count
    }

    /// Starting portfolio value.
    #[inline]
    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Contribution schedule, if any.
    #[inline]
    pub fn contribution(&self) -> Option<&Contribution> {
        self.contribution.as_ref()
    }

    /// Rebalancing rule, if any.
    #[inline]
    pub fn rebalancing(&self) -> Option<&RebalancingRule> {
        self.rebalancing.as_ref()
    }

    /// Simulation steps per year.
    #[inline]
    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    /// Optional base seed.
    #[inline]
    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    /// VaR / CVaR confidence level.
    #[inline]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Annual risk-free rate.
    #[inline]
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Frequency at which percentile bands are recorded.
    #[inline]
    pub fn recording_frequency(&self) -> Frequency {
        self.recording_frequency
    }

    /// Steps per path, `max(1, round(horizon · periods_per_year))`.
    #[inline]
    pub fn total_steps(&self) -> usize {
        ((self.horizon_years * self.periods_per_year as f64).round() as usize).max(1)
    }

    /// Steps between recorded time points.
    #[inline]
    pub fn recording_interval(&self) -> usize {
        self.recording_frequency
            .interval_in_periods(self.periods_per_year)
    }

    /// Checks every invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`ValidationError`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbols.is_empty() {
            return Err(ValidationError::EmptySymbols);
        }
        let mut seen = HashSet::with_capacity(self.symbols.len());
        for s in &self.symbols {
            if !seen.insert(s.as_str()) {
                return Err(ValidationError::DuplicateSymbol(s.clone()));
            }
        }
        validate_weights(&self.target_weights, self.symbols.len())?;
        if !(self.horizon_years >= MIN_HORIZON_YEARS && self.horizon_years.is_finite()) {
            return Err(ValidationError::out_of_range(
                "horizon_years",
                format!("must be >= {}, got {}", MIN_HORIZON_YEARS, self.horizon_years),
            ));
        }
        if !(MIN_SIMULATIONS..=MAX_SIMULATIONS).contains(&self.simulation_count) {
            return Err(ValidationError::out_of_range(
                "simulation_count",
                format!(
                    "must be in [{}, {}], got {}",
                    MIN_SIMULATIONS, MAX_SIMULATIONS, self.simulation_count
                ),
            ));
        }
        if !(self.initial_value > 0.0 && self.initial_value.is_finite()) {
            return Err(ValidationError::out_of_range(
                "initial_value",
                format!("must be positive, got {}", self.initial_value),
            ));
        }
        if self.periods_per_year == 0 {
            return Err(ValidationError::out_of_range(
                "periods_per_year",
                "must be positive",
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ValidationError::out_of_range(
                "confidence",
                format!("must be in (0, 1), got {}", self.confidence),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ValidationError::out_of_range(
                "risk_free_rate",
                "must be finite",
            ));
        }
        if let Some(c) = &self.contribution {
            c.validate()?;
        }
        if let Some(r) = &self.rebalancing {
            r.validate()?;
        }
        Ok(())
    }
}

/// Builder for [`SimulationParameters`].
///
/// `symbols`, `target_weights`, `horizon_years`, `simulation_count` and
/// `initial_value` are required; everything else has a default.
#[derive(Clone, Debug, Default)]
pub struct SimulationParametersBuilder {
    symbols: Option<Vec<String>>,
    target_weights: Option<Vec<f64>>,
    horizon_years: Option<f64>,
    simulation_count: Option<usize>,
    initial_value: Option<f64>,
    contribution: Option<Contribution>,
    rebalancing: Option<RebalancingRule>,
    periods_per_year: Option<u32>,
    random_seed: Option<u64>,
    confidence: Option<f64>,
    risk_free_rate: f64,
    recording_frequency: Option<Frequency>,
}

impl SimulationParametersBuilder {
    /// Sets the asset symbols.
    #[inline]
    pub fn symbols(mut self, symbols: Vec<String>) -> Self {
        self.symbols = Some(symbols);
        self
    }

    /// Sets the target allocation.
    #[inline]
    pub fn target_weights(mut self, weights: Vec<f64>) -> Self {
        self.target_weights = Some(weights);
        self
    }

    /// Sets the horizon in years (at least 1).
    #[inline]
    pub fn horizon_years(mut self, years: f64) -> Self {
        self.horizon_years = Some(years);
        self
    }

    /// Sets the number of simulated paths (at least 100).
    #[inline]
    pub fn simulation_count(mut self, count: usize) -> Self {
        self.simulation_count = Some(count);
        self
    }

    /// Sets the starting portfolio value.
    #[inline]
    pub fn initial_value(mut self, value: f64) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Adds a periodic contribution.
    #[inline]
    pub fn contribution(mut self, contribution: Contribution) -> Self {
        self.contribution = Some(contribution);
        self
    }

    /// Sets the rebalancing rule.
    #[inline]
    pub fn rebalancing(mut self, rule: RebalancingRule) -> Self {
        self.rebalancing = Some(rule);
        self
    }

    /// Removes any rebalancing rule.
    #[inline]
    pub fn no_rebalancing(mut self) -> Self {
        self.rebalancing = None;
        self
    }

    /// Sets the simulation grid (default 252).
    #[inline]
    pub fn periods_per_year(mut self, ppy: u32) -> Self {
        self.periods_per_year = Some(ppy);
        self
    }

    /// Sets the base seed for reproducibility.
    #[inline]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the VaR / CVaR confidence (default 0.95).
    #[inline]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Sets the annual risk-free rate (default 0).
    #[inline]
    pub fn risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Sets how often percentile bands are recorded (default monthly).
    #[inline]
    pub fn recording_frequency(mut self, frequency: Frequency) -> Self {
        self.recording_frequency = Some(frequency);
        self
    }

    /// Builds and validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a missing required field or any
    /// violated invariant.
    pub fn build(self) -> Result<SimulationParameters, ValidationError> {
        let params = SimulationParameters {
            symbols: self.symbols.ok_or(ValidationError::EmptySymbols)?,
            target_weights: self.target_weights.ok_or_else(|| missing("target_weights"))?,
            horizon_years: self.horizon_years.ok_or_else(|| missing("horizon_years"))?,
            simulation_count: self
                .simulation_count
                .ok_or_else(|| missing("simulation_count"))?,
            initial_value: self.initial_value.ok_or_else(|| missing("initial_value"))?,
            contribution: self.contribution,
            rebalancing: self.rebalancing,
            periods_per_year: self.periods_per_year.unwrap_or(252),
            random_seed: self.random_seed,
            confidence: self.confidence.unwrap_or(0.95),
            risk_free_rate: self.risk_free_rate,
            recording_frequency: self.recording_frequency.unwrap_or(Frequency::Monthly),
        };
        params.validate()?;
        Ok(params)
    }
}

fn missing(name: &str) -> ValidationError {
    ValidationError::out_of_range(name, "must be specified")
}

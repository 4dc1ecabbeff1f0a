//! Risk metric bundles for historical series and simulated ensembles.

use super::functions::{
    cagr, conditional_value_at_risk, drawdown_summary, max_drawdown, sharpe_ratio, sortino_ratio,
    value_at_risk, DrawdownSummary,
};
use folio_core::math::statistics::{median, ReturnMoments};
use folio_core::{validate_weights, EngineConfig, ReturnSeries, ValidationError};
use serde::{Deserialize, Serialize};

/// Risk metrics of one return series or one simulated ensemble.
///
/// Every metric is `None` (serialised as `null`) when fewer than two
/// observations were available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Confidence level used for VaR and CVaR
    pub confidence: f64,
    /// Observations (periods or paths) the metrics were computed from
    pub observations: usize,
    /// Value at risk as a positive loss fraction
    pub value_at_risk: Option<f64>,
    /// Conditional value at risk as a positive loss fraction
    pub conditional_value_at_risk: Option<f64>,
    /// Maximum drawdown; median and worst across paths for ensembles
    pub max_drawdown: Option<DrawdownSummary>,
    /// Annualised Sharpe ratio
    pub sharpe_ratio: Option<f64>,
    /// Annualised Sortino ratio
    pub sortino_ratio: Option<f64>,
    /// Compound annual growth rate; the median path for ensembles
    pub cagr: Option<f64>,
}

impl RiskMetrics {
    /// Metrics with every value undefined.
    pub fn undefined(confidence: f64, observations: usize) -> Self {
        Self {
            confidence,
            observations,
            value_at_risk: None,
            conditional_value_at_risk: None,
            max_drawdown: None,
            sharpe_ratio: None,
            sortino_ratio: None,
            cagr: None,
        }
    }

    /// Returns `true` when no metric could be computed.
    pub fn is_undefined(&self) -> bool {
        self.value_at_risk.is_none()
            && self.conditional_value_at_risk.is_none()
            && self.max_drawdown.is_none()
            && self.sharpe_ratio.is_none()
            && self.sortino_ratio.is_none()
            && self.cagr.is_none()
    }
}

/// Per-path outcomes of a simulated ensemble, measured on the wealth index
/// (growth of one unit of initial value, external contributions excluded).
#[derive(Debug, Clone, Copy)]
pub struct EnsembleSample<'a> {
    /// Terminal wealth index per path
    pub terminal_growth: &'a [f64],
    /// Maximum drawdown of the wealth index per path
    pub max_drawdowns: &'a [f64],
    /// Per-period wealth-index returns pooled across all paths
    pub moments: ReturnMoments,
    /// Horizon in years
    pub years: f64,
}

/// Computes [`RiskMetrics`] with a fixed confidence, risk-free rate and
/// period grid.
///
/// # Examples
///
/// ```
/// use folio_risk::RiskMetricsCalculator;
///
/// let calc = RiskMetricsCalculator::new(0.95, 0.0, 12).unwrap();
/// let metrics = calc.for_returns(&[0.01]);
/// assert!(metrics.is_undefined());
///
/// let metrics = calc.for_returns(&[0.02, -0.01, 0.03, -0.02, 0.01]);
/// assert!(metrics.value_at_risk.unwrap() > 0.0);
/// assert!(metrics.max_drawdown.unwrap().worst > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMetricsCalculator {
    confidence: f64,
    risk_free_rate: f64,
    periods_per_year: u32,
}

impl RiskMetricsCalculator {
    /// Creates a calculator.
    ///
    /// # Errors
    ///
    /// Fails when `confidence` is outside `(0, 1)`, the risk-free rate is
    /// not finite, or `periods_per_year` is zero.
    pub fn new(
        confidence: f64,
        risk_free_rate: f64,
        periods_per_year: u32,
    ) -> Result<Self, ValidationError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(ValidationError::out_of_range(
                "confidence",
                format!("must be in (0, 1), got {}", confidence),
            ));
        }
        if !risk_free_rate.is_finite() {
            return Err(ValidationError::out_of_range(
                "risk_free_rate",
                "must be finite",
            ));
        }
        if periods_per_year == 0 {
            return Err(ValidationError::out_of_range(
                "periods_per_year",
                "must be positive",
            ));
        }
        Ok(Self {
            confidence,
            risk_free_rate,
            periods_per_year,
        })
    }

    /// Calculator using the engine-wide confidence, rate and grid.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ValidationError> {
        Self::new(
            config.var_confidence,
            config.risk_free_rate,
            config.periods_per_year,
        )
    }

    /// Same calculator on a different period grid.
    pub fn with_periods_per_year(self, periods_per_year: u32) -> Result<Self, ValidationError> {
        Self::new(self.confidence, self.risk_free_rate, periods_per_year)
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

    /// Periods per year of the returns this calculator expects.
    #[inline]
    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    /// Empty moment accumulator with the per-period risk-free threshold.
    pub fn moments(&self) -> ReturnMoments {
        ReturnMoments::new(self.risk_free_rate / self.periods_per_year as f64)
    }

    /// Metrics of a single stream of per-period portfolio returns.
    ///
    /// VaR and CVaR are per-period loss fractions; drawdown and CAGR are
    /// measured on the compounded wealth index.
    pub fn for_returns(&self, returns: &[f64]) -> RiskMetrics {
        if returns.len() < 2 {
            return RiskMetrics::undefined(self.confidence, returns.len());
        }

        let mut wealth = Vec::with_capacity(returns.len() + 1);
        wealth.push(1.0);
        let mut moments = self.moments();
        let mut w = 1.0;
        for &r in returns {
            w *= 1.0 + r;
            wealth.push(w);
            moments.push(r);
        }
        let years = returns.len() as f64 / self.periods_per_year as f64;

        RiskMetrics {
            confidence: self.confidence,
            observations: returns.len(),
            value_at_risk: value_at_risk(returns, self.confidence),
            conditional_value_at_risk: conditional_value_at_risk(returns, self.confidence),
            max_drawdown: max_drawdown(&wealth).map(DrawdownSummary::single),
            sharpe_ratio: sharpe_ratio(&moments, self.risk_free_rate, self.periods_per_year),
            sortino_ratio: sortino_ratio(&moments, self.risk_free_rate, self.periods_per_year),
            cagr: cagr(1.0, w, years),
        }
    }

    /// Metrics of a constant-mix portfolio over a historical series.
    ///
    /// The portfolio return of each period is `Σ w_i r_i`; the series'
    /// own `periods_per_year` is used for annualisation.
    ///
    /// # Errors
    ///
    /// Fails when `weights` is not a valid allocation for the series.
    pub fn for_series(
        &self,
        series: &ReturnSeries,
        weights: &[f64],
    ) -> Result<RiskMetrics, ValidationError> {
        validate_weights(weights, series.n_assets())?;
        let calc = self.with_periods_per_year(series.periods_per_year())?;

        let mut obs = vec![0.0; series.n_assets()];
        let returns: Vec<f64> = (0..series.len())
            .map(|t| {
                series.observation_into(t, &mut obs);
                obs.iter().zip(weights).map(|(r, w)| r * w).sum()
            })
            .collect();
        Ok(calc.for_returns(&returns))
    }

    /// Metrics of a simulated ensemble.
    ///
    /// - VaR / CVaR: on the terminal loss `1 − G` relative to initial value
    /// - max drawdown: median and worst of the per-path drawdowns
    /// - Sharpe / Sortino: pooled per-period wealth-index returns
    /// - CAGR: of the median terminal wealth index
    pub fn for_ensemble(&self, sample: &EnsembleSample<'_>) -> RiskMetrics {
        let n = sample.terminal_growth.len();
        if n < 2 {
            return RiskMetrics::undefined(self.confidence, n);
        }

        let growth_returns: Vec<f64> = sample.terminal_growth.iter().map(|g| g - 1.0).collect();
        RiskMetrics {
            confidence: self.confidence,
            observations: n,
            value_at_risk: value_at_risk(&growth_returns, self.confidence),
            conditional_value_at_risk: conditional_value_at_risk(
                &growth_returns,
                self.confidence,
            ),
            max_drawdown: drawdown_summary(sample.max_drawdowns),
            sharpe_ratio: sharpe_ratio(&sample.moments, self.risk_free_rate, self.periods_per_year),
            sortino_ratio: sortino_ratio(
                &sample.moments,
                self.risk_free_rate,
                self.periods_per_year,
            ),
            cagr: median(sample.terminal_growth).and_then(|g| cagr(1.0, g, sample.years)),
        }
    }
}

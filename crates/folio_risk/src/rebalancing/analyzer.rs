//! Drift-triggered rebalance scanning over a realised return path.

use super::recommendation::{BreachRecord, RebalancingRecommendation};
use crate::metrics::{annualised_volatility, sharpe_ratio};
use crate::parallel::parallel_map;
use folio_core::math::statistics::ReturnMoments;
use folio_core::{
    validate_weights, AnalyticsError, AnalyticsResult, EngineConfig, ReturnSeries, ValidationError,
};
use folio_models::{ContributionRebalancingPolicy, PortfolioBook, RebalanceAction, RebalancingRule};
use tracing::debug;

/// Scans a return path for drift threshold breaches and scores the
/// resulting rebalances against an unrebalanced control.
///
/// Both portfolios start at target weights and see identical simple
/// returns. After each period the rebalancing rule is applied to the
/// rebalanced book only, using the same yearly cap and final-period rule
/// as the simulator. Drift is measured at the end of each period, after the
/// rule has been applied.
///
/// # Examples
///
/// ```
/// use folio_core::ReturnSeries;
/// use folio_models::RebalancingRule;
/// use folio_risk::RebalancingTimingAnalyzer;
///
/// let series = ReturnSeries::new(
///     vec!["EQ".into(), "BD".into()],
///     vec![vec![0.04; 12], vec![0.0; 12]],
///     12,
/// )
/// .unwrap();
/// let analyzer = RebalancingTimingAnalyzer::new(vec![0.5, 0.5], RebalancingRule::default(), 0.0).unwrap();
/// let rec = analyzer.analyze(&series).unwrap();
/// assert!(rec.recommends_rebalancing());
/// assert!(rec.average_drift <= rec.control_average_drift);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RebalancingTimingAnalyzer {
    target_weights: Vec<f64>,
    rule: RebalancingRule,
    risk_free_rate: f64,
    initial_value: f64,
}

impl RebalancingTimingAnalyzer {
    /// Creates an analyzer for `target_weights` under `rule`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid allocation, rule or risk-free rate.
    pub fn new(
        target_weights: Vec<f64>,
        rule: RebalancingRule,
        risk_free_rate: f64,
    ) -> Result<Self, ValidationError> {
        if target_weights.is_empty() {
            return Err(ValidationError::EmptySymbols);
        }
        validate_weights(&target_weights, target_weights.len())?;
        rule.validate()?;
        if !risk_free_rate.is_finite() {
            return Err(ValidationError::out_of_range(
                "risk_free_rate",
                "must be finite",
            ));
        }
        Ok(Self {
            target_weights,
            rule,
            risk_free_rate,
            initial_value: 1.0,
        })
    }

    /// Analyzer using the engine-wide rule parameters and risk-free rate.
    pub fn from_config(
        target_weights: Vec<f64>,
        config: &EngineConfig,
    ) -> Result<Self, ValidationError> {
        Self::new(
            target_weights,
            RebalancingRule::from(config),
            config.risk_free_rate,
        )
    }

    /// Sets the starting portfolio value (default 1.0).
    pub fn with_initial_value(mut self, initial_value: f64) -> Result<Self, ValidationError> {
        if !(initial_value > 0.0 && initial_value.is_finite()) {
            return Err(ValidationError::out_of_range(
                "initial_value",
                format!("must be positive, got {}", initial_value),
            ));
        }
        self.initial_value = initial_value;
        Ok(self)
    }

    /// Target allocation.
    #[inline]
    pub fn target_weights(&self) -> &[f64] {
        &self.target_weights
    }

    /// Rebalancing rule.
    #[inline]
    pub fn rule(&self) -> &RebalancingRule {
        &self.rule
    }

    /// Runs the rebalanced and control portfolios over `series`.
    ///
    /// # Errors
    ///
    /// - `Validation` when the series has a different asset count
    /// - `InsufficientData` for fewer than two observations
    pub fn analyze(&self, series: &ReturnSeries) -> AnalyticsResult<RebalancingRecommendation> {
        let n_assets = self.target_weights.len();
        if series.n_assets() != n_assets {
            return Err(
                ValidationError::length_mismatch("series assets", n_assets, series.n_assets())
                    .into(),
            );
        }
        let n = series.len();
        if n < 2 {
            return Err(AnalyticsError::InsufficientData { got: n, need: 2 });
        }

        let ppy = series.periods_per_year();
        let policy = ContributionRebalancingPolicy::new(
            self.target_weights.clone(),
            None,
            Some(self.rule),
            ppy,
            n,
        )?;

        let mut book = policy.open_book(self.initial_value);
        let mut control = PortfolioBook::new(self.initial_value, &self.target_weights);
        let threshold = self.risk_free_rate / ppy as f64;
        let mut book_moments = ReturnMoments::new(threshold);
        let mut control_moments = ReturnMoments::new(threshold);

        let mut rebalance_indices = Vec::new();
        let mut drift_at_rebalance = Vec::new();
        let mut suppressed_breaches = Vec::new();
        let mut drift_sum = 0.0;
        let mut control_drift_sum = 0.0;
        let mut obs = vec![0.0; n_assets];

        for t in 0..n {
            series.observation_into(t, &mut obs);
            let book_prev = book.value();
            let control_prev = control.value();

            book.apply_simple_returns(&obs);
            control.apply_simple_returns(&obs);

            if let Some(event) = policy.apply(&mut book, t).event {
                match event.action {
                    RebalanceAction::Executed => {
                        rebalance_indices.push(t);
                        drift_at_rebalance.push(event.drift);
                    }
                    action => suppressed_breaches.push(BreachRecord {
                        index: t,
                        date: series.date(t),
                        drift: event.drift,
                        action,
                    }),
                }
            }

            drift_sum += book.max_drift(&self.target_weights);
            control_drift_sum += control.max_drift(&self.target_weights);
            if book_prev > 0.0 {
                book_moments.push(book.value() / book_prev - 1.0);
            }
            if control_prev > 0.0 {
                control_moments.push(control.value() / control_prev - 1.0);
            }
        }

        let years = n as f64 / ppy as f64;
        let rebalanced_volatility = annualised_volatility(&book_moments, ppy);
        let control_volatility = annualised_volatility(&control_moments, ppy);
        let rebalanced_sharpe = sharpe_ratio(&book_moments, self.risk_free_rate, ppy);
        let control_sharpe = sharpe_ratio(&control_moments, self.risk_free_rate, ppy);

        let total_cost = book.total_cost();
        let cost_benefit_ratio = match (control_volatility, rebalanced_volatility) {
            (Some(vc), Some(vr)) if total_cost > 0.0 => {
                Some((vc - vr) * years / (total_cost / self.initial_value))
            }
            _ => None,
        };

        debug!(
            observations = n,
            executed = rebalance_indices.len(),
            suppressed = suppressed_breaches.len(),
            total_cost,
            "Rebalancing timing analysis complete"
        );

        Ok(RebalancingRecommendation {
            observations: n,
            years,
            rebalance_dates: series
                .dates()
                .map(|d| rebalance_indices.iter().map(|&i| d[i]).collect()),
            rebalance_indices,
            drift_at_rebalance,
            suppressed_breaches,
            average_drift: drift_sum / n as f64,
            control_average_drift: control_drift_sum / n as f64,
            total_transaction_cost: total_cost,
            cost_benefit_ratio,
            sharpe_improvement: rebalanced_sharpe
                .zip(control_sharpe)
                .map(|(r, c)| r - c),
            rebalanced_sharpe,
            control_sharpe,
            rebalanced_volatility,
            control_volatility,
            final_value: book.value(),
            control_final_value: control.value(),
        })
    }

    /// Analyzes several independent paths in parallel, preserving order.
    ///
    /// Used on simulated return paths from the path simulator.
    pub fn analyze_many(
        &self,
        paths: &[ReturnSeries],
    ) -> Vec<AnalyticsResult<RebalancingRecommendation>> {
        parallel_map(paths, |series| self.analyze(series))
    }
}

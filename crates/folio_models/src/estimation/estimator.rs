//! Sample estimator for annualised return statistics.

use super::regularisation::regularise_covariance;
use super::statistics::ReturnStatistics;
use folio_core::math::linalg::SymmetricMatrix;
use folio_core::math::statistics::{covariance, mean};
use folio_core::{AnalyticsError, AnalyticsResult, EngineConfig, ReturnSeries, ValidationError};
use tracing::{debug, warn};

/// Configuration for [`ReturnStatisticsEstimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Minimum number of observations per asset.
    pub min_observations: usize,
    /// Condition number above which the covariance is diagonally loaded.
    pub max_condition_number: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_observations: 20,
            max_condition_number: 1e8,
        }
    }
}

impl From<&EngineConfig> for EstimatorConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            min_observations: config.min_observations,
            max_condition_number: config.max_condition_number,
        }
    }
}

/// Estimates annualised mean, volatility and covariance from historical
/// returns.
///
/// - mean: `mean(r) · periods_per_year`
/// - covariance: sample covariance (n − 1) `· periods_per_year`
/// - volatility: square root of the annualised sample variance
///
/// # Examples
///
/// ```
/// use folio_core::ReturnSeries;
/// use folio_models::ReturnStatisticsEstimator;
///
/// let returns: Vec<f64> = (0..60).map(|t| if t % 2 == 0 { 0.02 } else { -0.01 }).collect();
/// let series = ReturnSeries::new(vec!["A".to_string()], vec![returns], 12).unwrap();
///
/// let stats = ReturnStatisticsEstimator::with_defaults().estimate(&series).unwrap();
/// assert!((stats.mean_returns()[0] - 0.06).abs() < 1e-12);
/// assert_eq!(stats.observations(), Some(60));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnStatisticsEstimator {
    config: EstimatorConfig,
}

impl ReturnStatisticsEstimator {
    /// Create an estimator with the given configuration.
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Create an estimator with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Estimator configuration.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates statistics for every asset in `series`.
    ///
    /// # Errors
    ///
    /// - [`AnalyticsError::InsufficientData`] when the series is shorter than
    ///   `min_observations`
    /// - [`AnalyticsError::NumericalInstability`] when the sample covariance
    ///   is not finite or cannot be regularised
    pub fn estimate(&self, series: &ReturnSeries) -> AnalyticsResult<ReturnStatistics> {
        let need = self.config.min_observations.max(2);
        let got = series.len();
        if got < need {
            return Err(AnalyticsError::InsufficientData { got, need });
        }
        if !(self.config.max_condition_number > 1.0) {
            return Err(ValidationError::out_of_range(
                "max_condition_number",
                "must be greater than 1",
            )
            .into());
        }

        let n = series.n_assets();
        let ppy = series.periods_per_year() as f64;

        let mut mean_returns = Vec::with_capacity(n);
        for i in 0..n {
            let m = mean(series.asset(i)).unwrap_or(0.0) * ppy;
            mean_returns.push(m);
        }

        let mut cov = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..=i {
                let c = covariance(series.asset(i), series.asset(j)).unwrap_or(0.0) * ppy;
                cov[i * n + j] = c;
                cov[j * n + i] = c;
            }
        }
        if cov.iter().chain(&mean_returns).any(|x| !x.is_finite()) {
            return Err(AnalyticsError::NumericalInstability(
                "sample covariance contains non-finite values".to_string(),
            ));
        }

        let sample = SymmetricMatrix::new(cov, n)
            .map_err(|e| AnalyticsError::NumericalInstability(e.to_string()))?;
        let volatilities: Vec<f64> = sample.diag().iter().map(|v| v.max(0.0).sqrt()).collect();

        let (covariance, regularisation) =
            regularise_covariance(&sample, self.config.max_condition_number)?;
        if let Some(reg) = &regularisation {
            warn!(
                condition_before = reg.condition_before,
                shift = reg.shift,
                "Covariance ill-conditioned; applied diagonal loading"
            );
        }

        debug!(
            assets = n,
            observations = got,
            regularised = regularisation.is_some(),
            "Estimated return statistics"
        );

        Ok(ReturnStatistics::from_estimate(
            series.symbols().to_vec(),
            mean_returns,
            volatilities,
            covariance,
            regularisation,
            got,
        ))
    }
}

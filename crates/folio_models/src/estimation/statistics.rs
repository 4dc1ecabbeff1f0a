//! Annualised return statistics.

use super::regularisation::{regularise_covariance, Regularisation};
use folio_core::math::linalg::{dot, SymmetricMatrix};
use folio_core::{AnalyticsResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Annualised mean returns, volatilities and covariance for a set of assets.
///
/// Produced by [`ReturnStatisticsEstimator`](super::ReturnStatisticsEstimator)
/// or built directly from external estimates with
/// [`from_annualised`](Self::from_annualised).
///
/// When the estimator had to regularise the sample covariance,
/// [`covariance`](Self::covariance) returns the loaded matrix and
/// [`regularisation`](Self::regularisation) describes the shift applied.
/// Volatilities always come from the unloaded sample variances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatistics {
    symbols: Vec<String>,
    mean_returns: Vec<f64>,
    volatilities: Vec<f64>,
    covariance: SymmetricMatrix,
    regularisation: Option<Regularisation>,
    observations: Option<usize>,
}

impl ReturnStatistics {
    /// Builds statistics from already annualised inputs.
    ///
    /// Volatilities are the square roots of the covariance diagonal.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] on empty or duplicate symbols, length mismatches,
    /// non-finite means or negative variances.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_core::math::linalg::SymmetricMatrix;
    /// use folio_models::ReturnStatistics;
    ///
    /// let stats = ReturnStatistics::from_annualised(
    ///     vec!["EQ".to_string(), "BD".to_string()],
    ///     vec![0.07, 0.03],
    ///     SymmetricMatrix::diagonal(&[0.04, 0.0025]),
    /// )
    /// .unwrap();
    /// assert!((stats.volatilities()[0] - 0.2).abs() < 1e-12);
    /// assert!((stats.expected_return(&[0.5, 0.5]) - 0.05).abs() < 1e-12);
    /// ```
    pub fn from_annualised(
        symbols: Vec<String>,
        mean_returns: Vec<f64>,
        covariance: SymmetricMatrix,
    ) -> Result<Self, ValidationError> {
        validate_universe(&symbols)?;
        let n = symbols.len();
        if mean_returns.len() != n {
            return Err(ValidationError::length_mismatch(
                "mean_returns",
                n,
                mean_returns.len(),
            ));
        }
        if covariance.dim() != n {
            return Err(ValidationError::length_mismatch(
                "covariance",
                n,
                covariance.dim(),
            ));
        }
        if let Some(m) = mean_returns.iter().find(|m| !m.is_finite()) {
            return Err(ValidationError::out_of_range(
                "mean_returns",
                format!("must be finite, got {}", m),
            ));
        }
        let diag = covariance.diag();
        if let Some(i) = diag.iter().position(|v| *v < 0.0) {
            return Err(ValidationError::out_of_range(
                "covariance",
                format!("variance of {} is negative ({})", symbols[i], diag[i]),
            ));
        }

        Ok(Self {
            symbols,
            mean_returns,
            volatilities: diag.iter().map(|v| v.sqrt()).collect(),
            covariance,
            regularisation: None,
            observations: None,
        })
    }

    pub(crate) fn from_estimate(
        symbols: Vec<String>,
        mean_returns: Vec<f64>,
        volatilities: Vec<f64>,
        covariance: SymmetricMatrix,
        regularisation: Option<Regularisation>,
        observations: usize,
    ) -> Self {
        Self {
            symbols,
            mean_returns,
            volatilities,
            covariance,
            regularisation,
            observations: Some(observations),
        }
    }

    /// Asset symbols.
    #[inline]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of assets.
    #[inline]
    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Annualised mean returns.
    #[inline]
    pub fn mean_returns(&self) -> &[f64] {
        &self.mean_returns
    }

    /// Annualised volatilities.
    #[inline]
    pub fn volatilities(&self) -> &[f64] {
        &self.volatilities
    }

    /// Annualised covariance used downstream (loaded if regularised).
    #[inline]
    pub fn covariance(&self) -> &SymmetricMatrix {
        &self.covariance
    }

    /// Whether the covariance was regularised.
    #[inline]
    pub fn is_regularised(&self) -> bool {
        self.regularisation.is_some()
    }

    /// Regularisation diagnostics, if loading was applied.
    #[inline]
    pub fn regularisation(&self) -> Option<&Regularisation> {
        self.regularisation.as_ref()
    }

    /// Number of historical observations behind the estimate, if estimated.
    #[inline]
    pub fn observations(&self) -> Option<usize> {
        self.observations
    }

    /// Position of `symbol`.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Checks that `symbols` names exactly this universe in the same order.
    pub fn ensure_symbols(&self, symbols: &[String]) -> Result<(), ValidationError> {
        if symbols != self.symbols.as_slice() {
            return Err(ValidationError::SymbolMismatch {
                expected: self.symbols.clone(),
                got: symbols.to_vec(),
            });
        }
        Ok(())
    }

    /// Correlation matrix implied by the covariance.
    ///
    /// Assets with zero variance get zero correlation with every other asset.
    pub fn correlation(&self) -> SymmetricMatrix {
        let n = self.n_assets();
        let sd: Vec<f64> = self.covariance.diag().iter().map(|v| v.sqrt()).collect();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                data[i * n + j] = if i == j {
                    1.0
                } else if sd[i] > 0.0 && sd[j] > 0.0 {
                    (self.covariance.get(i, j) / (sd[i] * sd[j])).clamp(-1.0, 1.0)
                } else {
                    0.0
                };
            }
        }
        SymmetricMatrix::new(data, n).unwrap_or_else(|_| SymmetricMatrix::identity(n))
    }

    /// Covariance after regularisation to `max_condition`, regardless of
    /// whether the estimator already loaded it.
    pub fn regularised_covariance(
        &self,
        max_condition: f64,
    ) -> AnalyticsResult<(SymmetricMatrix, Option<Regularisation>)> {
        regularise_covariance(&self.covariance, max_condition)
    }

    /// Portfolio expected return `wᵀμ`.
    #[inline]
    pub fn expected_return(&self, weights: &[f64]) -> f64 {
        dot(weights, &self.mean_returns)
    }

    /// Portfolio variance `wᵀΣw`.
    #[inline]
    pub fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        self.covariance.quadratic_form(weights)
    }

    /// Portfolio volatility `√(wᵀΣw)`.
    #[inline]
    pub fn portfolio_volatility(&self, weights: &[f64]) -> f64 {
        self.portfolio_variance(weights).max(0.0).sqrt()
    }
}

fn validate_universe(symbols: &[String]) -> Result<(), ValidationError> {
    if symbols.is_empty() {
        return Err(ValidationError::EmptySymbols);
    }
    let mut seen = HashSet::new();
    for s in symbols {
        if !seen.insert(s) {
            return Err(ValidationError::DuplicateSymbol(s.clone()));
        }
    }
    Ok(())
}

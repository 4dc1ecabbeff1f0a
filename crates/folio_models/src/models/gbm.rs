//! Correlated multi-asset Geometric Brownian Motion.
//!
//! Each asset follows
//! ```text
//! dS_i / S_i = μ_i dt + σ_i dW_i,    d⟨W_i, W_j⟩ = ρ_ij dt
//! ```
//!
//! ## Log-space formulation
//!
//! The exact one-step solution is used:
//! ```text
//! ln(S_i(t+dt) / S_i(t)) = (μ_i − Σ_ii/2)·dt + (L·z)_i·√dt
//! ```
//! where `L` is the Cholesky factor of the annualised covariance `Σ` and `z`
//! is a vector of independent standard normals.

use super::StepModel;
use crate::estimation::{load_to_condition, ReturnStatistics};
use folio_core::math::linalg::{CholeskyFactor, LinalgError, SymmetricMatrix};
use folio_core::{AnalyticsError, AnalyticsResult, ValidationError};
use tracing::warn;

/// Correlated GBM step model.
///
/// # Examples
///
/// ```
/// use folio_core::math::linalg::SymmetricMatrix;
/// use folio_models::{CorrelatedGbm, StepModel};
///
/// let cov = SymmetricMatrix::diagonal(&[0.04, 0.01]);
/// let model = CorrelatedGbm::new(&[0.08, 0.03], &cov, 252).unwrap();
///
/// let mut out = [0.0; 2];
/// model.evolve_step(&[0.0, 0.0], &mut out);
/// // Zero shocks leave only the drift (μ − σ²/2)·dt
/// assert!((out[0] - (0.08 - 0.02) / 252.0).abs() < 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct CorrelatedGbm {
    drift: Vec<f64>,
    cholesky: CholeskyFactor,
    sqrt_dt: f64,
}

impl CorrelatedGbm {
    /// Creates the model from annualised means and covariance on a grid with
    /// `periods_per_year` steps per year.
    ///
    /// # Errors
    ///
    /// Fails if the covariance is not positive definite or the dimensions
    /// disagree.
    pub fn new(
        mean_returns: &[f64],
        covariance: &SymmetricMatrix,
        periods_per_year: u32,
    ) -> Result<Self, LinalgError> {
        Self::with_shock_covariance(mean_returns, &covariance.diag(), covariance, periods_per_year)
    }

    /// Drift from `variances`, correlated shocks from the Cholesky factor of
    /// `shock_covariance`.
    fn with_shock_covariance(
        mean_returns: &[f64],
        variances: &[f64],
        shock_covariance: &SymmetricMatrix,
        periods_per_year: u32,
    ) -> Result<Self, LinalgError> {
        if mean_returns.len() != shock_covariance.dim() || variances.len() != mean_returns.len() {
            return Err(LinalgError::DimensionMismatch {
                expected: shock_covariance.dim(),
                got: mean_returns.len(),
            });
        }
        let cholesky = shock_covariance.cholesky()?;
        let dt = 1.0 / periods_per_year.max(1) as f64;
        let drift = mean_returns
            .iter()
            .zip(variances)
            .map(|(mu, var)| (mu - 0.5 * var) * dt)
            .collect();
        Ok(Self {
            drift,
            cholesky,
            sqrt_dt: dt.sqrt(),
        })
    }

    /// Creates the model from estimated statistics.
    ///
    /// If the covariance cannot be factorised it is diagonally loaded to
    /// `max_condition` and the returned flag is `true`. The loaded matrix
    /// only drives the shocks; the drift keeps the estimated variances.
    ///
    /// # Errors
    ///
    /// [`AnalyticsError::NumericalInstability`] if the loaded covariance
    /// still cannot be factorised.
    pub fn from_statistics(
        stats: &ReturnStatistics,
        periods_per_year: u32,
        max_condition: f64,
    ) -> AnalyticsResult<(Self, bool)> {
        if periods_per_year == 0 {
            return Err(ValidationError::out_of_range("periods_per_year", "must be positive").into());
        }
        match Self::new(stats.mean_returns(), stats.covariance(), periods_per_year) {
            Ok(model) => Ok((model, false)),
            Err(LinalgError::NotPositiveDefinite { pivot }) => {
                warn!(
                    pivot,
                    "Cholesky factorisation failed; falling back to regularised covariance"
                );
                let (loaded, _) = load_to_condition(stats.covariance(), max_condition)?;
                let model = Self::with_shock_covariance(
                    stats.mean_returns(),
                    &stats.covariance().diag(),
                    &loaded,
                    periods_per_year,
                )
                    .map_err(|e| {
                        AnalyticsError::NumericalInstability(format!(
                            "regularised covariance still not factorisable: {}",
                            e
                        ))
                    })?;
                Ok((model, true))
            }
            Err(e) => Err(AnalyticsError::NumericalInstability(e.to_string())),
        }
    }

    /// Per-step log drift `(μ_i − Σ_ii/2)·dt`.
    #[inline]
    pub fn drift(&self) -> &[f64] {
        &self.drift
    }

    /// Cholesky factor of the annualised covariance.
    #[inline]
    pub fn cholesky(&self) -> &CholeskyFactor {
        &self.cholesky
    }
}

impl StepModel for CorrelatedGbm {
    #[inline]
    fn n_assets(&self) -> usize {
        self.drift.len()
    }

    #[inline]
    fn evolve_step(&self, z: &[f64], out: &mut [f64]) {
        self.cholesky.transform_into(z, out);
        for (o, d) in out.iter_mut().zip(&self.drift) {
            *o = d + *o * self.sqrt_dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_drift_and_diffusion() {
        let cov = SymmetricMatrix::from_rows(&[vec![0.04, 0.012], vec![0.012, 0.09]]).unwrap();
        let model = CorrelatedGbm::new(&[0.1, 0.05], &cov, 4).unwrap();
        assert_eq!(model.n_assets(), 2);
        assert_relative_eq!(model.drift()[0], (0.1 - 0.02) * 0.25, epsilon = 1e-15);
        assert_relative_eq!(model.drift()[1], (0.05 - 0.045) * 0.25, epsilon = 1e-15);

        let mut out = [0.0; 2];
        model.evolve_step(&[1.0, 0.0], &mut out);
        // First column of L is Σ[:,0] / √Σ00
        assert_relative_eq!(out[0], model.drift()[0] + 0.2 * 0.5, epsilon = 1e-15);
        assert_relative_eq!(out[1], model.drift()[1] + 0.06 * 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_dimension_mismatch() {
        let cov = SymmetricMatrix::identity(2);
        assert!(matches!(
            CorrelatedGbm::new(&[0.1], &cov, 252),
            Err(LinalgError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_from_statistics_fallback() {
        let stats = ReturnStatistics::from_annualised(
            vec!["A".into(), "B".into()],
            vec![0.05, 0.05],
            SymmetricMatrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap(),
        )
        .unwrap();
        let (model, fallback) = CorrelatedGbm::from_statistics(&stats, 252, 1e8).unwrap();
        assert!(fallback);
        assert_eq!(model.n_assets(), 2);
        // Drift stays on the unloaded variance of 1.0
        assert_relative_eq!(model.drift()[0], (0.05 - 0.5) / 252.0, epsilon = 1e-15);
        assert_relative_eq!(model.drift()[1], (0.05 - 0.5) / 252.0, epsilon = 1e-15);
    }

    #[test]
    fn test_from_statistics_no_fallback() {
        let stats = ReturnStatistics::from_annualised(
            vec!["A".into()],
            vec![0.05],
            SymmetricMatrix::diagonal(&[0.04]),
        )
        .unwrap();
        let (_, fallback) = CorrelatedGbm::from_statistics(&stats, 252, 1e8).unwrap();
        assert!(!fallback);
    }
}

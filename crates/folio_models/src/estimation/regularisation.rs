//! Covariance regularisation by diagonal loading.
//!
//! An ill-conditioned covariance `Σ` with eigenvalues `λ_min ≤ … ≤ λ_max` is
//! replaced by `Σ + δI`. The shift is the smallest one that brings the
//! condition number down to the threshold `κ`:
//!
//! ```text
//! (λ_max + δ) / (λ_min + δ) = κ   ⇔   δ = (λ_max − κ·λ_min) / (κ − 1)
//! ```
//!
//! Loading preserves the eigenvectors, so correlations shrink towards zero
//! uniformly while variances grow by the same absolute amount.

use folio_core::math::linalg::{condition_from_eigenvalues, SymmetricMatrix};
use folio_core::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

/// Relative slack so that rounding never leaves the result above `κ`.
const SHIFT_SLACK: f64 = 1e-9;

/// Diagnostics of an applied diagonal loading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regularisation {
    /// Amount added to every diagonal entry
    pub shift: f64,
    /// Condition number before loading (`inf` for singular input)
    pub condition_before: f64,
    /// Condition number after loading
    pub condition_after: f64,
}

/// Returns `cov` unchanged when its condition number is within
/// `max_condition`, otherwise the diagonally loaded matrix and its
/// diagnostics.
///
/// # Errors
///
/// [`AnalyticsError::NumericalInstability`] if the eigenvalues are not finite
/// or the loaded matrix is still degenerate.
///
/// # Examples
///
/// ```
/// use folio_core::math::linalg::SymmetricMatrix;
/// use folio_models::regularise_covariance;
///
/// // Perfectly correlated assets: singular covariance
/// let cov = SymmetricMatrix::from_rows(&[vec![0.04, 0.04], vec![0.04, 0.04]]).unwrap();
/// let (loaded, reg) = regularise_covariance(&cov, 1e4).unwrap();
/// let reg = reg.expect("singular matrix must be regularised");
/// assert!(reg.shift > 0.0);
/// assert!(loaded.condition_number() <= 1e4 * (1.0 + 1e-6));
/// assert!(loaded.cholesky().is_ok());
/// ```
pub fn regularise_covariance(
    cov: &SymmetricMatrix,
    max_condition: f64,
) -> AnalyticsResult<(SymmetricMatrix, Option<Regularisation>)> {
    let eig = finite_eigenvalues(cov)?;
    if condition_from_eigenvalues(&eig) <= max_condition {
        return Ok((cov.clone(), None));
    }
    let (loaded, reg) = load_with_eigenvalues(cov, &eig, max_condition)?;
    Ok((loaded, Some(reg)))
}

/// Unconditionally loads `cov` so that its condition number does not exceed
/// `max_condition`, applying at least a minimal positive shift.
///
/// Used as the fallback when a Cholesky factorisation fails even though the
/// condition number looked acceptable.
pub fn load_to_condition(
    cov: &SymmetricMatrix,
    max_condition: f64,
) -> AnalyticsResult<(SymmetricMatrix, Regularisation)> {
    let eig = finite_eigenvalues(cov)?;
    load_with_eigenvalues(cov, &eig, max_condition)
}

fn finite_eigenvalues(cov: &SymmetricMatrix) -> AnalyticsResult<Vec<f64>> {
    let eig = cov.eigenvalues();
    if eig.iter().any(|x| !x.is_finite()) {
        return Err(AnalyticsError::NumericalInstability(
            "covariance eigenvalues are not finite".to_string(),
        ));
    }
    Ok(eig)
}

fn load_with_eigenvalues(
    cov: &SymmetricMatrix,
    eig: &[f64],
    max_condition: f64,
) -> AnalyticsResult<(SymmetricMatrix, Regularisation)> {
    let (lambda_min, lambda_max) = match (eig.first(), eig.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => {
            return Err(AnalyticsError::NumericalInstability(
                "empty covariance matrix".to_string(),
            ))
        }
    };

    let required = (lambda_max - max_condition * lambda_min) / (max_condition - 1.0);
    let floor = if lambda_max > 0.0 {
        lambda_max * 1e-12
    } else {
        1e-12
    };
    let shift = (required * (1.0 + SHIFT_SLACK)).max(floor);

    let condition_after = (lambda_max + shift) / (lambda_min + shift);
    if !condition_after.is_finite() || lambda_min + shift <= 0.0 {
        return Err(AnalyticsError::NumericalInstability(format!(
            "diagonal loading by {:e} did not produce a positive definite covariance",
            shift
        )));
    }

    Ok((
        cov.diagonal_loaded(shift),
        Regularisation {
            shift,
            condition_before: condition_from_eigenvalues(eig),
            condition_after,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_well_conditioned_untouched() {
        let cov = SymmetricMatrix::from_rows(&[vec![0.04, 0.01], vec![0.01, 0.09]]).unwrap();
        let (out, reg) = regularise_covariance(&cov, 1e8).unwrap();
        assert!(reg.is_none());
        assert_eq!(out, cov);
    }

    #[test]
    fn test_singular_loaded_to_threshold() {
        let cov = SymmetricMatrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        let (out, reg) = regularise_covariance(&cov, 100.0).unwrap();
        let reg = reg.unwrap();
        // λ = {0, 2}: δ = 2 / 99
        assert_relative_eq!(reg.shift, 2.0 / 99.0, max_relative = 1e-6);
        assert!(reg.condition_before.is_infinite() || reg.condition_before > 1e12);
        assert_relative_eq!(reg.condition_after, 100.0, max_relative = 1e-6);
        assert!(out.condition_number() <= 100.0 * (1.0 + 1e-6));
        assert!(out.cholesky().is_ok());
    }

    #[test]
    fn test_ill_conditioned_diagonal() {
        let cov = SymmetricMatrix::diagonal(&[1.0, 1e-12]);
        let (out, reg) = regularise_covariance(&cov, 1e6).unwrap();
        assert!(reg.is_some());
        assert!(out.condition_number() <= 1e6 * (1.0 + 1e-6));
    }

    #[test]
    fn test_zero_matrix_gets_floor_shift() {
        let cov = SymmetricMatrix::zeros(3);
        let (out, reg) = regularise_covariance(&cov, 1e8).unwrap();
        let reg = reg.unwrap();
        assert!(reg.shift > 0.0);
        assert!(out.cholesky().is_ok());
    }

    #[test]
    fn test_load_to_condition_always_shifts() {
        let cov = SymmetricMatrix::identity(2);
        let (out, reg) = load_to_condition(&cov, 1e8).unwrap();
        assert!(reg.shift > 0.0);
        assert!(out.get(0, 0) > 1.0);
    }
}

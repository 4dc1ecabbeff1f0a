//! Target weight validation.

use super::error::ValidationError;

/// Accepted absolute deviation of a weight vector's sum from one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Checks a long-only target allocation.
///
/// Requires `expected_len` entries, each finite and in `[0, 1]`, summing to
/// one within [`WEIGHT_SUM_TOLERANCE`].
///
/// # Examples
///
/// ```
/// use folio_core::types::{validate_weights, ValidationError};
///
/// assert!(validate_weights(&[0.6, 0.4], 2).is_ok());
/// assert!(matches!(
///     validate_weights(&[0.6, 0.3], 2),
///     Err(ValidationError::WeightsDoNotSumToOne { .. })
/// ));
/// ```
pub fn validate_weights(weights: &[f64], expected_len: usize) -> Result<(), ValidationError> {
    if weights.len() != expected_len {
        return Err(ValidationError::length_mismatch(
            "weights",
            expected_len,
            weights.len(),
        ));
    }
    if let Some((i, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0 || **w > 1.0)
    {
        return Err(ValidationError::out_of_range(
            format!("weights[{}]", i),
            format!("must be in [0, 1], got {}", w),
        ));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ValidationError::WeightsDoNotSumToOne {
            sum,
            tolerance: WEIGHT_SUM_TOLERANCE,
        });
    }
    Ok(())
}

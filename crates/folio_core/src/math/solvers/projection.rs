//! Euclidean projection onto the capped simplex.
//!
//! The capped simplex is `{w : Σw = 1, lo ≤ w ≤ hi}`. The projection of `v`
//! has the form `w_i = clamp(v_i − τ, lo_i, hi_i)` for the unique `τ` that
//! makes the weights sum to one. The sum is piecewise linear and
//! non-increasing in `τ` with kinks at `v_i − hi_i` and `v_i − lo_i`; `τ` is
//! located between two sorted kinks by binary search and then solved for
//! exactly on that linear piece.

use crate::types::SolverError;

const FEASIBILITY_TOLERANCE: f64 = 1e-12;

/// Box-constrained probability simplex.
///
/// # Examples
///
/// ```
/// use folio_core::math::solvers::CappedSimplex;
///
/// let simplex = CappedSimplex::new(vec![0.0; 3], vec![0.5; 3]).unwrap();
/// let mut w = vec![2.0, 0.0, 0.0];
/// simplex.project(&mut w);
/// assert!((w[0] - 0.5).abs() < 1e-12);
/// assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CappedSimplex {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl CappedSimplex {
    /// Creates the set, checking that it is non-empty.
    ///
    /// # Errors
    ///
    /// [`SolverError::InfeasibleConstraints`] if the bounds have different
    /// lengths, a lower bound exceeds its upper bound, `Σlo > 1` or `Σhi < 1`.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, SolverError> {
        if lower.len() != upper.len() || lower.is_empty() {
            return Err(SolverError::InfeasibleConstraints(format!(
                "bound vectors have lengths {} and {}",
                lower.len(),
                upper.len()
            )));
        }
        if let Some(i) = (0..lower.len()).find(|&i| !(lower[i] <= upper[i])) {
            return Err(SolverError::InfeasibleConstraints(format!(
                "lower bound {} exceeds upper bound {} at index {}",
                lower[i], upper[i], i
            )));
        }
        let sum_lo: f64 = lower.iter().sum();
        let sum_hi: f64 = upper.iter().sum();
        if sum_lo > 1.0 + FEASIBILITY_TOLERANCE {
            return Err(SolverError::InfeasibleConstraints(format!(
                "lower bounds sum to {:.6} > 1",
                sum_lo
            )));
        }
        if sum_hi < 1.0 - FEASIBILITY_TOLERANCE {
            return Err(SolverError::InfeasibleConstraints(format!(
                "upper bounds sum to {:.6} < 1",
                sum_hi
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Unconstrained long-only simplex of dimension `n`.
    pub fn long_only(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            upper: vec![1.0; n],
        }
    }

    /// Dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Lower bounds.
    #[inline]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds.
    #[inline]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Projects `v` onto the set in place.
    ///
    /// # Panics
    ///
    /// Panics if `v.len() != dim()`.
    pub fn project(&self, v: &mut [f64]) {
        assert_eq!(v.len(), self.dim(), "vector length must match dimension");
        if v.is_empty() {
            return;
        }

        let mut kinks: Vec<f64> = v
            .iter()
            .zip(&self.lower)
            .zip(&self.upper)
            .flat_map(|((&x, &lo), &hi)| [x - hi, x - lo])
            .collect();
        kinks.sort_by(f64::total_cmp);

        let tau = self.threshold(v, &kinks);
        for ((x, &lo), &hi) in v.iter_mut().zip(&self.lower).zip(&self.upper) {
            *x = (*x - tau).clamp(lo, hi);
        }
    }

    /// Shift `τ` with `Σ clamp(v_i − τ, lo_i, hi_i) = 1`, given sorted kinks.
    fn threshold(&self, v: &[f64], kinks: &[f64]) -> f64 {
        let first = kinks[0];
        let last = kinks[kinks.len() - 1];
        // Σhi or Σlo equal to one (within the feasibility tolerance)
        if self.clamped_sum(v, first) <= 1.0 {
            return first;
        }
        if self.clamped_sum(v, last) >= 1.0 {
            return last;
        }

        // sum(kinks[a]) > 1 > sum(kinks[b])
        let (mut a, mut b) = (0, kinks.len() - 1);
        while b - a > 1 {
            let mid = (a + b) / 2;
            let sum = self.clamped_sum(v, kinks[mid]);
            if sum > 1.0 {
                a = mid;
            } else if sum < 1.0 {
                b = mid;
            } else {
                return kinks[mid];
            }
        }

        let (left, right) = (kinks[a], kinks[b]);
        let mid = 0.5 * (left + right);
        let mut clamped = 0.0;
        let mut free_sum = 0.0;
        let mut free = 0usize;
        for ((&x, &lo), &hi) in v.iter().zip(&self.lower).zip(&self.upper) {
            if x - mid >= hi {
                clamped += hi;
            } else if x - mid <= lo {
                clamped += lo;
            } else {
                free_sum += x;
                free += 1;
            }
        }
        if free == 0 {
            return left;
        }
        ((free_sum + clamped - 1.0) / free as f64).clamp(left, right)
    }

    /// Returns `true` if `w` lies in the set within `tol`.
    pub fn contains(&self, w: &[f64], tol: f64) -> bool {
        w.len() == self.dim()
            && (w.iter().sum::<f64>() - 1.0).abs() <= tol
            && w
                .iter()
                .zip(&self.lower)
                .zip(&self.upper)
                .all(|((&x, &lo), &hi)| x >= lo - tol && x <= hi + tol)
    }

    fn clamped_sum(&self, v: &[f64], tau: f64) -> f64 {
        v.iter()
            .zip(&self.lower)
            .zip(&self.upper)
            .map(|((&x, &lo), &hi)| (x - tau).clamp(lo, hi))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_interior_point_unchanged() {
        let s = CappedSimplex::long_only(3);
        let mut w = vec![0.2, 0.3, 0.5];
        s.project(&mut w);
        assert_relative_eq!(w[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.3, epsilon = 1e-12);
        assert_relative_eq!(w[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_shift() {
        let s = CappedSimplex::long_only(2);
        let mut w = vec![1.0, 1.0];
        s.project(&mut w);
        assert_relative_eq!(w[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_lower_bounds_bind() {
        let s = CappedSimplex::new(vec![0.1, 0.1, 0.1], vec![1.0; 3]).unwrap();
        let mut w = vec![5.0, -3.0, -3.0];
        s.project(&mut w);
        assert_relative_eq!(w[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(w[2], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_is_exact_on_mixed_bounds() {
        // tau = 0.35: w = (0.6 capped, 0.25, 0.15, 0 floored)
        let s = CappedSimplex::new(vec![0.0; 4], vec![0.6; 4]).unwrap();
        let mut w = vec![1.5, 0.6, 0.5, 0.1];
        s.project(&mut w);
        assert_eq!(w[0], 0.6);
        assert_eq!(w[3], 0.0);
        assert_relative_eq!(w[1], 0.25, epsilon = 1e-15);
        assert_relative_eq!(w[2], 0.15, epsilon = 1e-15);
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_infeasible_bounds() {
        assert!(matches!(
            CappedSimplex::new(vec![0.6, 0.6], vec![1.0, 1.0]),
            Err(SolverError::InfeasibleConstraints(_))
        ));
        assert!(CappedSimplex::new(vec![0.0, 0.0], vec![0.4, 0.4]).is_err());
        assert!(CappedSimplex::new(vec![0.5, 0.0], vec![0.4, 1.0]).is_err());
        assert!(CappedSimplex::new(vec![0.0], vec![1.0, 1.0]).is_err());
        // Degenerate but feasible: single point
        assert!(CappedSimplex::new(vec![0.5, 0.5], vec![0.5, 0.5]).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_projection_is_feasible(v in prop::collection::vec(-10.0f64..10.0, 1..12)) {
            let n = v.len();
            let cap = (2.0 / n as f64).min(1.0);
            let s = CappedSimplex::new(vec![0.0; n], vec![cap; n]).unwrap();
            let mut w = v.clone();
            s.project(&mut w);
            prop_assert!(s.contains(&w, 1e-12));
        }

        #[test]
        fn prop_projection_is_idempotent(v in prop::collection::vec(-5.0f64..5.0, 2..8)) {
            let s = CappedSimplex::long_only(v.len());
            let mut once = v.clone();
            s.project(&mut once);
            let mut twice = once.clone();
            s.project(&mut twice);
            for (a, b) in once.iter().zip(&twice) {
                prop_assert!((a - b).abs() < 1e-9);
            }
        }
    }
}

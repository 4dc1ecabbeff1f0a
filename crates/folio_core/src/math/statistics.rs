//! Sample statistics.
//!
//! Generic over [`num_traits::Float`] where the computation is a plain
//! reduction; percentile routines work on `f64` cross-sections.

use num_traits::Float;

/// Arithmetic mean. Returns `None` for an empty slice.
pub fn mean<T: Float>(xs: &[T]) -> Option<T> {
    if xs.is_empty() {
        return None;
    }
    let n = T::from(xs.len())?;
    Some(xs.iter().fold(T::zero(), |acc, &x| acc + x) / n)
}

/// Unbiased sample covariance (n − 1 denominator).
///
/// Returns `None` when fewer than two paired observations are supplied or
/// the slices differ in length.
pub fn covariance<T: Float>(xs: &[T], ys: &[T]) -> Option<T> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sum = xs
        .iter()
        .zip(ys)
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - mx) * (y - my));
    Some(sum / T::from(xs.len() - 1)?)
}

/// Unbiased sample variance (n − 1 denominator).
pub fn variance<T: Float>(xs: &[T]) -> Option<T> {
    covariance(xs, xs)
}

/// Sample standard deviation.
pub fn std_dev<T: Float>(xs: &[T]) -> Option<T> {
    variance(xs).map(Float::sqrt)
}

/// Sorts a copy of `xs` ascending using IEEE total ordering.
pub fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Percentile `p ∈ [0, 100]` of an ascending slice.
///
/// Uses linear interpolation between adjacent order statistics at rank
/// `h = (n − 1)·p/100`, so the result is monotone in `p` and equals the
/// minimum at 0 and the maximum at 100.
///
/// # Examples
///
/// ```
/// use folio_core::math::statistics::percentile_sorted;
///
/// let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(percentile_sorted(&xs, 50.0), Some(3.0));
/// assert_eq!(percentile_sorted(&xs, 25.0), Some(2.0));
/// assert_eq!(percentile_sorted(&xs, 12.5), Some(1.5));
/// ```
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p / 100.0;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Percentile of an unsorted slice.
pub fn percentile(xs: &[f64], p: f64) -> Option<f64> {
    percentile_sorted(&sorted(xs), p)
}

/// Median of an unsorted slice.
pub fn median(xs: &[f64]) -> Option<f64> {
    percentile(xs, 50.0)
}

/// Streaming first and second moments of a return stream.
///
/// Uses Welford's update for the mean and variance and additionally tracks
/// the sum of squared shortfalls below a fixed per-period threshold, which
/// is what the Sortino ratio needs. Two accumulators built over disjoint
/// data can be combined with [`merge`](Self::merge).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnMoments {
    count: usize,
    mean: f64,
    m2: f64,
    downside_sq: f64,
    threshold: f64,
}

impl ReturnMoments {
    /// Empty accumulator with the given downside threshold.
    pub fn new(threshold: f64) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            downside_sq: 0.0,
            threshold,
        }
    }

    /// Accumulator filled from a slice.
    pub fn from_slice(xs: &[f64], threshold: f64) -> Self {
        let mut m = Self::new(threshold);
        for &x in xs {
            m.push(x);
        }
        m
    }

    /// Adds one observation.
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        let shortfall = (x - self.threshold).min(0.0);
        self.downside_sq += shortfall * shortfall;
    }

    /// Combines two accumulators (Chan et al. parallel update).
    ///
    /// Both must use the same threshold.
    pub fn merge(&self, other: &Self) -> Self {
        debug_assert_eq!(self.threshold, other.threshold);
        if self.count == 0 {
            return *other;
        }
        if other.count == 0 {
            return *self;
        }
        let n = (self.count + other.count) as f64;
        let delta = other.mean - self.mean;
        Self {
            count: self.count + other.count,
            mean: self.mean + delta * other.count as f64 / n,
            m2: self.m2 + other.m2 + delta * delta * self.count as f64 * other.count as f64 / n,
            downside_sq: self.downside_sq + other.downside_sq,
            threshold: self.threshold,
        }
    }

    /// Number of observations.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Downside threshold per period.
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Sample mean, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Unbiased sample variance, `None` below two observations.
    pub fn variance(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).max(0.0))
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Root mean squared shortfall below the threshold (n − 1 denominator).
    pub fn downside_deviation(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.downside_sq / (self.count - 1) as f64).sqrt())
    }
}

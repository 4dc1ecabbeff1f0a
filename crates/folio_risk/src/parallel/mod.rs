//! Rayon helpers shared by the path simulator and the timing analyser.
//!
//! Results always come back in input order, so work that seeds its
//! randomness per path index gives the same output on any thread count.

use rayon::prelude::*;

/// Minimum number of paths handed to a single rayon task.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Paths below this count are processed on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 100;

/// Maps every element of `items` in parallel, preserving order.
pub fn parallel_map<T, R, F>(items: &[T], mapper: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(mapper).collect()
}

/// Maps path indices `0..n` through `mapper`, in parallel when `config`
/// allows it. Output is in index order either way.
pub fn map_indices<R, F>(n: usize, config: &ParallelConfig, mapper: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    if config.should_parallelize(n) {
        (0..n)
            .into_par_iter()
            .with_min_len(config.batch_size)
            .map(mapper)
            .collect()
    } else {
        (0..n).map(mapper).collect()
    }
}

/// When and how finely to split path work across threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Minimum paths per rayon task
    pub batch_size: usize,
    /// Path count at which parallelism kicks in
    pub parallel_threshold: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ParallelConfig {
    /// Creates a configuration; a zero batch size is raised to one.
    pub fn new(batch_size: usize, parallel_threshold: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            parallel_threshold,
        }
    }

    /// Configuration that keeps everything on the calling thread.
    pub fn sequential() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallel_threshold: usize::MAX,
        }
    }

    /// Whether `n_paths` is enough work to split.
    #[inline]
    pub fn should_parallelize(&self, n_paths: usize) -> bool {
        n_paths >= self.parallel_threshold
    }
}

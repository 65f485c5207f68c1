//! Train/held-out partitioning.

use super::error::TraderError;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitPolicy {
    /// Random permutation from a fixed seed.
    Shuffled { test_ratio: f64, seed: u64 },
    /// By position: first rows train, last rows are held out.
    Chronological { test_ratio: f64 },
}

impl SplitPolicy {
    pub fn test_ratio(&self) -> f64 {
        match *self {
            SplitPolicy::Shuffled { test_ratio, .. } | SplitPolicy::Chronological { test_ratio } => {
                test_ratio
            }
        }
    }
}

/// Row indices of each partition.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Held-out rows for `n` samples: `ceil(test_ratio * n)`.
pub fn held_out_len(n: usize, test_ratio: f64) -> usize {
    ((test_ratio * n as f64).ceil() as usize).min(n)
}

pub fn split_indices(n: usize, policy: &SplitPolicy) -> Result<SplitIndices, TraderError> {
    let ratio = policy.test_ratio();
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(TraderError::fit(format!(
            "test_ratio must be between 0 and 1, got {ratio}"
        )));
    }

    let n_test = held_out_len(n, ratio);
    let n_train = n - n_test;
    if n_train == 0 || n_test == 0 {
        return Err(TraderError::fit(format!(
            "cannot split {n} samples into non-empty train and held-out sets"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    match *policy {
        SplitPolicy::Shuffled { seed, .. } => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            order.shuffle(&mut rng);
            let train = order.split_off(n_test);
            Ok(SplitIndices { train, test: order })
        }
        SplitPolicy::Chronological { .. } => {
            let test = order.split_off(n_train);
            Ok(SplitIndices { train: order, test })
        }
    }
}

/// Select rows of `items` by index.
pub fn take<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

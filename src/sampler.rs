//! Sampler
//!
//! Seeded strategies for choosing rows: the held-out validation split, and the
//! per-tree row subsampling of stochastic gradient boosting.
use crate::errors::CalibrationError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Seed used by the validation split unless one is given.
pub const DEFAULT_SPLIT_SEED: u64 = 0;
/// Fraction of rows held out for validation.
pub const DEFAULT_TEST_FRACTION: f64 = 0.4;

// A sampler can be used to subset the data prior to fitting a new tree.
pub trait Sampler {
    /// Sample the data, returning a tuple, where the first item is the samples
    /// chosen for training, and the second are the samples excluded.
    fn sample<R: Rng>(&mut self, rng: &mut R, index: &[usize]) -> (Vec<usize>, Vec<usize>);
}

pub struct RandomSampler {
    subsample: f64,
}

impl RandomSampler {
    pub fn new(subsample: f64) -> Self {
        RandomSampler { subsample }
    }
}

impl Sampler for RandomSampler {
    fn sample<R: Rng>(&mut self, rng: &mut R, index: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let subsample = self.subsample;
        let mut chosen = Vec::new();
        let mut excluded = Vec::new();
        for i in index {
            if rng.gen::<f64>() < subsample {
                chosen.push(*i);
            } else {
                excluded.push(*i)
            }
        }
        (chosen, excluded)
    }
}

/// Deterministic train/test partition of row indices.
///
/// The rows are shuffled with the random source and the first
/// `ceil(test_fraction * n)` shuffled rows are held out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrainTestSplit {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainTestSplit {
    fn default() -> Self {
        TrainTestSplit {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}

impl TrainTestSplit {
    pub fn new(test_fraction: f64, seed: u64) -> Self {
        TrainTestSplit { test_fraction, seed }
    }

    /// Split `0..n` with a generator seeded from `self.seed`.
    pub fn split(&self, n: usize) -> Result<(Vec<usize>, Vec<usize>), CalibrationError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.split_with_rng(&mut rng, n)
    }

    /// Split `0..n` drawing the permutation from `rng`.
    ///
    /// Returns `(train, test)` row indices. Both parts must be non empty.
    pub fn split_with_rng<R: Rng>(&self, rng: &mut R, n: usize) -> Result<(Vec<usize>, Vec<usize>), CalibrationError> {
        let n_test = (self.test_fraction * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(CalibrationError::DataShape(format!(
                "cannot hold out {} of {} rows for validation, both splits need at least one row",
                n_test, n
            )));
        }
        let mut index: Vec<usize> = (0..n).collect();
        index.shuffle(rng);
        let train = index.split_off(n_test);
        Ok((train, index))
    }
}

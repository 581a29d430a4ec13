//! Random sources.
//!
//! Every stochastic operation draws from a [`RandomSource`] passed in by the
//! caller, so a run is fully determined by the source it is given. Draw
//! order matters: each operation documents the draws it makes.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// The capability the engine needs from a random number generator.
pub trait RandomSource {
    /// A uniform draw from `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// A uniform integer from `low..=high`. Returns `low` if `high < low`.
    fn uniform_int(&mut self, low: u64, high: u64) -> u64;

    /// `k` distinct indices from `0..n`, in draw order. `k` is clamped to `n`.
    fn sample_without_replacement(&mut self, n: usize, k: usize) -> Vec<usize>;
}

/// Seeded random number generator used by real runs.
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }
}

impl RandomSource for SimRng {
    fn uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    fn uniform_int(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.0.gen_range(low..=high)
    }

    fn sample_without_replacement(&mut self, n: usize, k: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.0, n, k.min(n)).into_vec()
    }
}

/// Replays a fixed list of uniform draws, cycling when it runs out.
///
/// Integer draws and samples are derived from the same list, so a test can
/// predict every decision a run makes.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    values: Vec<f64>,
    position: usize,
}

impl ScriptedRng {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }

    /// Number of uniform draws taken so far
    pub fn draws(&self) -> usize {
        self.position
    }
}

impl RandomSource for ScriptedRng {
    fn uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }

    fn uniform_int(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as f64;
        let offset = (self.uniform() * span).floor() as u64;
        low + offset.min(high - low)
    }

    fn sample_without_replacement(&mut self, n: usize, k: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..n).collect();
        let k = k.min(n);
        for i in 0..k {
            let j = self.uniform_int(i as u64, (n - 1) as u64) as usize;
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }
}

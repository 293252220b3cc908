//! Per-replication random number stream.
//!
//! Each replication owns a [`RandomProcess`]. Streams are derived from one
//! base seed with ChaCha stream selection, so replication `i` sees the same
//! draws no matter which worker thread runs it.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Lowest processing rate a draw may produce.
pub const RATE_FLOOR: f64 = 0.1;

/// Seedable source of the uniform and Gaussian draws the engine needs.
#[derive(Debug, Clone)]
pub struct RandomProcess {
    rng: ChaCha8Rng,
}

impl RandomProcess {
    /// Stream `replication` of the generator seeded with `seed`.
    #[must_use]
    pub fn for_replication(seed: u64, replication: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(replication);
        Self { rng }
    }

    /// A generator seeded directly, for tests and single trials.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::for_replication(seed, 0)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    /// Gaussian draw with the given mean and standard deviation.
    pub fn normal(&mut self, mean: f64, std: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + std * z
    }

    /// Processing rate drawn from `Normal(mean, std)`, floored at [`RATE_FLOOR`].
    pub fn rate(&mut self, mean: f64, std: f64) -> f64 {
        self.normal(mean, std).max(RATE_FLOOR)
    }

    /// Index drawn uniformly from `0..len`. `len` must be positive.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// `true` with the given probability (clamped to `[0, 1]`).
    pub fn keep(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        values.shuffle(&mut self.rng);
    }
}

// File: src/review/sampler.rs
use crate::core::types::Entry;
use crate::core::word_set::WordSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Draws review samples. Generic over the random source so tests can seed it.
pub struct ReviewSampler<R: Rng> {
    rng: R,
}

impl ReviewSampler<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> ReviewSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Returns `min(n, len)` distinct entries from `entries`, taken from a
    /// uniform random permutation. `n == 0` yields an empty set.
    pub fn select_random<'a, I>(&mut self, entries: I, n: usize) -> WordSet
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        if n == 0 {
            return WordSet::new();
        }
        let mut pool: Vec<&Entry> = entries.into_iter().collect();
        pool.shuffle(&mut self.rng);
        pool.into_iter().take(n).cloned().collect()
    }
}

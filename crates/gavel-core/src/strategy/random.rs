// Injectable randomness for the bidding engine.
//
// Every probabilistic choice in the auction (whether an AI fires a bid, the
// order of interested bidders, whether a poll runs at all) draws from a
// `RandomSource`, so a run can be replayed exactly from a seed or a script.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn sample(&mut self) -> f64;
}

/// `StdRng`-backed source for real runs.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Reproducible source for tests and replays.
    pub fn from_seed(seed: u64) -> Self {
        SeededRandom {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Non-reproducible source seeded from the OS.
    pub fn from_entropy() -> Self {
        SeededRandom {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn sample(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    samples: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(samples: Vec<f64>) -> Self {
        ScriptedRandom { samples, cursor: 0 }
    }

    /// A source that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn sample(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let value = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        value
    }
}

/// Fisher-Yates shuffle driven by `rng`.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        // sample() < 1.0, so j <= i; min() guards float rounding at the top end.
        let j = ((rng.sample() * (i + 1) as f64) as usize).min(i);
        items.swap(i, j);
    }
}

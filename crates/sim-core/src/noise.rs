//! Bounded symmetric noise for occupancy ticks.
//!
//! Every draw is one of `-1`, `0` or `+1`. Production runs use an entropy-seeded
//! `SmallRng`; tests either fix the seed or script the exact draws.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub trait NoiseSource: Send {
    /// Next draw, in `-1..=1`.
    fn draw(&mut self) -> i64;
}

pub struct SeededNoise(SmallRng);

impl SeededNoise {
    pub fn from_seed(seed: u64) -> Self {
        SeededNoise(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        SeededNoise(SmallRng::from_entropy())
    }
}

impl NoiseSource for SeededNoise {
    fn draw(&mut self) -> i64 {
        self.0.gen_range(-1..=1)
    }
}

/// Replays a fixed sequence of draws, then yields `0` forever.
#[derive(Debug, Default, Clone)]
pub struct ScriptedNoise {
    draws: VecDeque<i64>,
}

impl ScriptedNoise {
    pub fn new(draws: impl IntoIterator<Item = i64>) -> Self {
        Self {
            draws: draws.into_iter().map(|draw| draw.clamp(-1, 1)).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl NoiseSource for ScriptedNoise {
    fn draw(&mut self) -> i64 {
        self.draws.pop_front().unwrap_or(0)
    }
}

//! Injected random source for damage rolls, map generation and food placement.
//!
//! Engines never call a global RNG. They are generic over [`Dice`], so a
//! session can be replayed from a seed ([`SeededDice`]) or driven by a fixed
//! script of rolls in tests ([`ScriptedDice`]).

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A source of uniform integer rolls.
pub trait Dice {
    /// Roll uniformly in `[0, bound)`.
    ///
    /// A `bound` of zero always yields zero.
    fn roll(&mut self, bound: u32) -> u32;

    /// Return `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        const RESOLUTION: u32 = 10_000;
        f64::from(self.roll(RESOLUTION)) < p * f64::from(RESOLUTION)
    }
}

/// Deterministic dice backed by ChaCha8.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    /// Create dice from a seed. Equal seeds produce equal roll sequences.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create dice seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }
}

/// Dice that replay a fixed sequence of rolls, cycling when exhausted.
///
/// Each scripted value is reduced into range with `value % bound`. An empty
/// script always rolls zero.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: VecDeque<u32>,
}

impl ScriptedDice {
    /// Create dice that replay `rolls` in order.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: rolls.into_iter().collect(),
        }
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        let Some(value) = self.script.pop_front() else {
            return 0;
        };
        self.script.push_back(value);
        value % bound
    }
}

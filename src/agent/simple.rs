use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::Agent;

/// Plays one action forever.
#[derive(Debug, Clone)]
pub struct FixedAgent {
    action: usize,
}

impl FixedAgent {
    pub fn new(action: usize) -> Self {
        Self { action }
    }
}

impl Agent for FixedAgent {
    fn reset(&mut self) {}

    fn perceive(&mut self, _observation: &[usize], _reward: f64) -> usize {
        self.action
    }

    fn name(&self) -> String {
        format!("Fixed({})", self.action)
    }
}

/// Plays uniformly random actions from a seeded generator.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    actions: usize,
    seed: u64,
    rng: Xoshiro256PlusPlus,
}

impl RandomAgent {
    pub fn new(actions: usize, seed: u64) -> Self {
        Self {
            actions: actions.max(1),
            seed,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn reset(&mut self) {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
    }

    fn perceive(&mut self, _observation: &[usize], _reward: f64) -> usize {
        self.rng.gen_range(0..self.actions)
    }

    fn name(&self) -> String {
        "Random".to_string()
    }
}

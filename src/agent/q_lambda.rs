//! Tabular Q(lambda) with accumulating eligibility traces.
//!
//! Observations are taken to be the state. On every perception the agent
//! picks a greedy action (ties broken at random), explores with
//! probability epsilon, and updates every state-action value by
//! `alpha * delta * e(s, a)`. Traces decay by `gamma * lambda` after a
//! greedy choice and are cleared after an exploratory one.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::Agent;
use crate::environment::Environment;

/// Largest state table the agent allocates; larger observation spaces wrap.
const MAX_STATES: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct QLambdaParams {
    pub init_q: f64,
    pub lambda: f64,
    pub alpha: f64,
    pub epsilon: f64,
    /// Internal discount, already resolved against the evaluation rate.
    pub gamma: f64,
}

/// Q(lambda) learner over a flattened observation index.
#[derive(Debug, Clone)]
pub struct QLambdaAgent {
    params: QLambdaParams,
    num_states: usize,
    num_actions: usize,
    obs_symbols: usize,
    q: Vec<f64>,
    traces: Vec<f64>,
    state: usize,
    action: usize,
    seed: u64,
    rng: Xoshiro256PlusPlus,
}

impl QLambdaAgent {
    pub(crate) fn new(environment: &dyn Environment, params: QLambdaParams, seed: u64) -> Self {
        let num_states = environment.num_observations().clamp(1, MAX_STATES);
        let num_actions = environment.num_actions().max(1);
        let mut agent = Self {
            params,
            num_states,
            num_actions,
            obs_symbols: environment.num_observation_symbols().max(1),
            q: Vec::new(),
            traces: Vec::new(),
            state: 0,
            action: 0,
            seed,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        };
        agent.reset();
        agent
    }

    fn encode(&self, observation: &[usize]) -> usize {
        observation
            .iter()
            .rev()
            .fold(0usize, |acc, &symbol| {
                acc.wrapping_mul(self.obs_symbols).wrapping_add(symbol)
            })
            % self.num_states
    }

    fn row(&self, state: usize) -> &[f64] {
        &self.q[state * self.num_actions..(state + 1) * self.num_actions]
    }

    /// Index of a maximal entry of `state`'s row, chosen uniformly among ties.
    fn greedy(&mut self, state: usize) -> usize {
        let row = self.row(state);
        let best = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ties: Vec<usize> = row
            .iter()
            .enumerate()
            .filter(|&(_, &q)| q == best)
            .map(|(a, _)| a)
            .collect();
        match ties.len() {
            0 => 0,
            1 => ties[0],
            n => ties[self.rng.gen_range(0..n)],
        }
    }

    #[cfg(test)]
    fn value(&self, state: usize, action: usize) -> f64 {
        self.q[state * self.num_actions + action]
    }
}

impl Agent for QLambdaAgent {
    fn reset(&mut self) {
        let cells = self.num_states * self.num_actions;
        self.q = vec![self.params.init_q; cells];
        self.traces = vec![0.0; cells];
        self.state = 0;
        self.action = 0;
        self.rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
    }

    fn perceive(&mut self, observation: &[usize], reward: f64) -> usize {
        let next_state = self.encode(observation);
        let optimal = self.greedy(next_state);

        let next_action = if self.rng.gen::<f64>() < self.params.epsilon {
            self.rng.gen_range(0..self.num_actions)
        } else {
            optimal
        };

        let QLambdaParams {
            lambda,
            alpha,
            gamma,
            ..
        } = self.params;
        let previous = self.state * self.num_actions + self.action;
        let delta = reward + gamma * self.q[next_state * self.num_actions + optimal] - self.q[previous];
        self.traces[previous] += 1.0;

        let keep = next_action == optimal;
        for (q, e) in self.q.iter_mut().zip(self.traces.iter_mut()) {
            *q += alpha * delta * *e;
            *e = if keep { *e * gamma * lambda } else { 0.0 };
        }

        self.state = next_state;
        self.action = next_action;
        next_action
    }

    fn name(&self) -> String {
        let p = &self.params;
        format!(
            "Q_l({},{},{},{},{})",
            p.init_q, p.lambda, p.alpha, p.epsilon, p.gamma
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SequenceEnvironment;

    fn params(epsilon: f64) -> QLambdaParams {
        QLambdaParams {
            init_q: 0.0,
            lambda: 0.9,
            alpha: 0.5,
            epsilon,
            gamma: 0.5,
        }
    }

    #[test]
    fn test_learns_rewarded_action() {
        let mut env = SequenceEnvironment::new(2, 10_000);
        let mut agent = QLambdaAgent::new(&env, params(0.0), 3);
        let (mut reward, mut obs) = env.reset("1");
        let mut hits = 0;
        for t in 0..200 {
            let action = agent.perceive(&obs, reward);
            let step = env.act(action);
            if t >= 100 && step.reward > 0.0 {
                hits += 1;
            }
            reward = step.reward;
            obs = step.observation;
        }
        assert_eq!(hits, 100);
        assert!(agent.value(1, 1) > agent.value(1, 0));
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let env = SequenceEnvironment::new(2, 100);
        let mut agent = QLambdaAgent::new(&env, params(0.1), 1);
        let first: Vec<usize> = (0..20).map(|i| agent.perceive(&[i % 2], 1.0)).collect();
        agent.reset();
        assert!(agent.q.iter().all(|&q| q == 0.0));
        let second: Vec<usize> = (0..20).map(|i| agent.perceive(&[i % 2], 1.0)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_state_encoding() {
        let env = SequenceEnvironment::new(3, 100);
        let agent = QLambdaAgent::new(&env, params(0.0), 0);
        assert_eq!(agent.encode(&[2]), 2);
        assert_eq!(agent.name(), "Q_l(0,0.9,0.5,0,0.5)");
    }
}

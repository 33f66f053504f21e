//! Trial executor: one antithetic pair of episodes for one program.
//!
//! Both runs build their own environment and agent from the job's specs,
//! so nothing live is shared between runs, jobs or threads. The first run
//! sees the rewards as given, the second with their sign flipped; either
//! run hitting the environment's step bound fails the whole pair.

use std::sync::Arc;

use aiq_core::statistics::{normalization_factor, uses_reset_reward};
use aiq_core::TrialResult;

use crate::agent::AgentSpec;
use crate::environment::EnvironmentSpec;
use crate::samples::ProgramSample;

/// Parameters shared by every trial of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSettings {
    pub environment: EnvironmentSpec,
    pub agent: AgentSpec,
    pub episode_length: usize,
    pub discount_rate: f64,
}

/// Self-contained description of one unit of work sent to a worker.
#[derive(Debug, Clone)]
pub struct TrialJob {
    pub settings: Arc<TrialSettings>,
    pub sample: ProgramSample,
    /// Seed handed to the agent for both runs.
    pub seed: u64,
}

impl TrialJob {
    /// Job for `sample`, seeded from `base_seed` and the sample's file position.
    pub fn new(settings: Arc<TrialSettings>, sample: ProgramSample, base_seed: u64) -> Self {
        let seed = job_seed(base_seed, sample.ordinal);
        Self {
            settings,
            sample,
            seed,
        }
    }
}

/// Mix a base seed with a job ordinal (SplitMix64 finalizer).
pub fn job_seed(base: u64, ordinal: usize) -> u64 {
    let mut z = base.wrapping_add((ordinal as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run one episode with rewards multiplied by `sign`.
///
/// Returns the normalized discounted return, or `None` if the environment
/// reached its step bound.
pub fn run_episode(settings: &TrialSettings, program: &str, sign: f64, seed: u64) -> Option<f64> {
    let mut environment = settings.environment.build();
    let mut agent = settings.agent.build(&*environment, settings.discount_rate, seed);
    agent.reset();

    let rate = settings.discount_rate;
    let (mut reward, mut observation) = environment.reset(program);

    let mut total = 0.0;
    let mut discount = 1.0;
    if uses_reset_reward(rate) {
        total += sign * reward;
        discount *= rate;
    }

    for _ in 0..settings.episode_length {
        let action = agent.perceive(&observation, sign * reward);
        let step = environment.act(action);
        if step.steps == environment.max_steps() {
            return None;
        }
        total += discount * sign * step.reward;
        discount *= rate;
        reward = step.reward;
        observation = step.observation;
    }

    Some(total / normalization_factor(rate, settings.episode_length))
}

/// Run both sign runs of `job`.
///
/// The negative run is skipped once the positive one truncates.
pub fn run_trial(job: &TrialJob) -> TrialResult {
    let program = job.sample.program.as_str();
    let stratum = job.sample.stratum;

    let Some(positive) = run_episode(&job.settings, program, 1.0, job.seed) else {
        return TrialResult::truncated(stratum);
    };
    match run_episode(&job.settings, program, -1.0, job.seed) {
        Some(negative) => TrialResult::new(stratum, positive, negative),
        None => TrialResult::new(stratum, positive, f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aiq_core::TrialOutcome;
    use proptest::prelude::*;

    fn settings(environment: EnvironmentSpec, agent: AgentSpec, length: usize, rate: f64) -> TrialSettings {
        TrialSettings {
            environment,
            agent,
            episode_length: length,
            discount_rate: rate,
        }
    }

    fn constant(reward: f64) -> EnvironmentSpec {
        EnvironmentSpec::Constant { reward, actions: 2 }
    }

    fn sample(program: &str) -> ProgramSample {
        ProgramSample {
            stratum: 1,
            program: program.to_string(),
            ordinal: 0,
        }
    }

    #[test]
    fn test_constant_reward_normalizes_to_reward() {
        for rate in [1.0, 0.99, 0.9, 0.5] {
            for length in [1, 5, 40] {
                let s = settings(constant(0.75), AgentSpec::Fixed { action: 0 }, length, rate);
                let r = run_episode(&s, "", 1.0, 0).unwrap();
                assert!((r - 0.75).abs() < 1e-12, "rate {rate} length {length}: {r}");
            }
        }
    }

    #[test]
    fn test_antithetic_returns_are_negated() {
        let s = Arc::new(settings(
            EnvironmentSpec::Sequence {
                actions: 2,
                max_steps: 1000,
            },
            AgentSpec::Fixed { action: 1 },
            12,
            0.9,
        ));
        let result = run_trial(&TrialJob::new(s, sample("0110"), 5));
        assert!(result.is_accepted());
        assert_eq!(result.return1, -result.return2);
        assert!(result.return1 != 0.0);
    }

    #[test]
    fn test_truncation_fails_pair() {
        let s = Arc::new(settings(
            EnvironmentSpec::Sequence {
                actions: 2,
                max_steps: 1000,
            },
            AgentSpec::Fixed { action: 0 },
            10,
            1.0,
        ));
        let result = run_trial(&TrialJob::new(Arc::clone(&s), sample("01#"), 0));
        assert_eq!(result.outcome(), TrialOutcome::Truncated);
        assert_eq!(result.stratum, 1);

        // The bound is only hit if the episode reaches the '#'.
        let short = Arc::new(TrialSettings {
            episode_length: 2,
            ..(*s).clone()
        });
        assert!(run_trial(&TrialJob::new(short, sample("01#"), 0)).is_accepted());
    }

    proptest! {
        #[test]
        fn prop_constant_reward_survives_normalization(
            reward in -10.0f64..10.0,
            rate in 0.01f64..=1.0,
            length in 1usize..200,
        ) {
            let s = settings(constant(reward), AgentSpec::Fixed { action: 0 }, length, rate);
            let r = run_episode(&s, "", 1.0, 0).unwrap();
            prop_assert!((r - reward).abs() < 1e-9 * (1.0 + reward.abs()));
        }
    }

    #[test]
    fn test_job_seed_varies_with_ordinal() {
        assert_ne!(job_seed(1, 0), job_seed(1, 1));
        assert_ne!(job_seed(1, 0), job_seed(2, 0));
        assert_eq!(job_seed(7, 3), job_seed(7, 3));
    }
}

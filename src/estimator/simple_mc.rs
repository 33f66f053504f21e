//! Plain Monte Carlo estimate, used to cross-check the stratified one.
//!
//! Programs are taken in file order, each run once with a random reward
//! sign. Truncated runs are skipped. There are no pairs, so there is no
//! pair log.

use std::time::Instant;

use aiq_core::constants::Z_95;
use aiq_core::statistics::OnlineStats;
use aiq_core::Estimate;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::{trial_settings, Progress, ProgressCallback};
use crate::agent::AgentSpec;
use crate::config::EngineConfig;
use crate::environment::EnvironmentSpec;
use crate::error::{AiqError, ConfigError};
use crate::samples::SampleSet;
use crate::trial::{job_seed, run_episode, TrialSettings};

/// Checkpoints are taken every this many accepted runs.
const CHECKPOINT_INTERVAL: usize = 10;

/// Running estimate after `samples` accepted runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub samples: usize,
    pub mean: f64,
    pub half_width: f64,
}

/// Result of a simple Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleMcReport {
    pub environment: String,
    pub agent: String,
    pub discount_rate: f64,
    pub episode_length: usize,
    /// Running estimates, every ten accepted runs past the first ten.
    pub checkpoints: Vec<Checkpoint>,
    /// Final estimate, `None` if every run was truncated.
    pub estimate: Option<Estimate>,
    /// Runs counted into the estimate.
    pub accepted: usize,
    /// Runs skipped because they were truncated.
    pub truncated: usize,
    pub elapsed_secs: f64,
}

/// Single-run-per-program estimator.
pub struct SimpleMcEstimator {
    settings: TrialSettings,
    config: EngineConfig,
    progress_callback: Option<ProgressCallback>,
}

impl SimpleMcEstimator {
    /// Create an estimator. A configured pair log is rejected.
    pub fn new(
        environment: EnvironmentSpec,
        agent: AgentSpec,
        config: EngineConfig,
    ) -> Result<Self, AiqError> {
        if config.pair_log.is_some() {
            return Err(ConfigError::PairLogUnsupported.into());
        }
        let settings = trial_settings(environment, agent, &config)?;
        Ok(Self {
            settings,
            config,
            progress_callback: None,
        })
    }

    /// Set progress callback, called after every accepted run.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Run until `sample_size` runs are accepted or the programs run out.
    pub fn run(&self, samples: &SampleSet) -> Result<SimpleMcReport, AiqError> {
        let start = Instant::now();
        let target = match self.config.sample_size {
            Some(0) => return Err(ConfigError::SampleSize.into()),
            Some(n) => n,
            None => samples.len(),
        };
        if target > samples.len() {
            tracing::warn!(
                target,
                available = samples.len(),
                "fewer programs than requested samples"
            );
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        let mut stats = OnlineStats::new();
        let mut checkpoints = Vec::new();
        let mut truncated = 0;

        for sample in samples.iter() {
            if stats.count() >= target {
                break;
            }
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let seed = job_seed(self.config.seed, sample.ordinal);
            let Some(value) = run_episode(&self.settings, &sample.program, sign, seed) else {
                truncated += 1;
                tracing::debug!(ordinal = sample.ordinal, stratum = sample.stratum, "truncated run skipped");
                continue;
            };

            stats.update(value);
            let n = stats.count();
            if n % CHECKPOINT_INTERVAL == 0 && n > CHECKPOINT_INTERVAL {
                let half_width = stats.half_width(Z_95).unwrap_or(f64::INFINITY);
                tracing::info!(samples = n, mean = stats.mean(), half_width, "checkpoint");
                checkpoints.push(Checkpoint {
                    samples: n,
                    mean: stats.mean(),
                    half_width,
                });
            }
            if let Some(ref callback) = self.progress_callback {
                callback(&Progress {
                    stage: 1,
                    stages: 1,
                    completed: n,
                    total: target,
                });
            }
        }

        let accepted = stats.count();
        let estimate = (accepted > 0).then(|| Estimate {
            value: stats.mean(),
            half_width: stats.half_width(Z_95).unwrap_or(f64::INFINITY),
        });

        Ok(SimpleMcReport {
            environment: self.settings.environment.to_string(),
            agent: self.settings.agent.to_string(),
            discount_rate: self.settings.discount_rate,
            episode_length: self.settings.episode_length,
            checkpoints,
            estimate,
            accepted,
            truncated,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }
}

impl std::fmt::Debug for SimpleMcEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleMcEstimator")
            .field("settings", &self.settings)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

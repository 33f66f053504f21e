//! Adaptive stratified estimation.
//!
//! The stage loop runs a fixed, budget-truncated schedule of cumulative
//! sample targets. Each stage goes through four steps:
//!
//! 1. **Allocating**: split the stage's increment across strata in
//!    proportion to `p_i * s_i` from the previous stage.
//! 2. **Dispatching**: pop `M_i / 2` programs per stratum and submit one
//!    antithetic-pair job for each.
//! 3. **Collecting**: retire jobs as they finish. A truncated pair is
//!    dropped and replaced with the next program of its stratum; running
//!    out of programs is fatal. The stage ends only when nothing is left
//!    outstanding, and its accepted pairs are then added to the strata in
//!    sample-file order.
//! 4. **Estimating**: summarize every stratum and combine them into the
//!    stage estimate.
//!
//! There is no early stop: the schedule length alone ends the run.

mod simple_mc;
mod state;

pub use simple_mc::{Checkpoint, SimpleMcEstimator, SimpleMcReport};
pub use state::{EstimateReport, EstimatorState, StageRecord, StratumState};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use aiq_core::constants::SHORT_EPISODE_COVERAGE;
use aiq_core::{active_strata, allocate, combine, stage_schedule, TrialOutcome};

use crate::agent::AgentSpec;
use crate::config::EngineConfig;
use crate::environment::EnvironmentSpec;
use crate::error::{AiqError, ConfigError};
use crate::pair_log::PairLog;
use crate::pool::WorkerPool;
use crate::samples::{SampleRepository, SampleSet};
use crate::trial::{TrialJob, TrialSettings};

/// Progress of a running estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Current stage (1-based).
    pub stage: usize,
    /// Number of stages in the schedule.
    pub stages: usize,
    /// Samples completed so far, across stages.
    pub completed: usize,
    /// Samples the whole run will complete.
    pub total: usize,
}

type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;

/// Validate the collaborators against the configuration and settle the episode length.
pub(crate) fn trial_settings(
    environment: EnvironmentSpec,
    agent: AgentSpec,
    config: &EngineConfig,
) -> Result<TrialSettings, ConfigError> {
    config.validate()?;
    environment.validate()?;
    agent.validate(&environment, config.discount_rate)?;

    let episode_length = config.resolve_episode_length()?;
    let coverage = config.episode_coverage()?;
    if coverage < SHORT_EPISODE_COVERAGE {
        tracing::warn!(
            episode_length,
            coverage,
            "episode length covers little of the discounted total"
        );
    }

    Ok(TrialSettings {
        environment,
        agent,
        episode_length,
        discount_rate: config.discount_rate,
    })
}

/// Adaptive stratified estimator with antithetic pairs.
///
/// # Example
///
/// ```ignore
/// use aiq::{AgentSpec, EngineConfig, EnvironmentSpec, StratifiedEstimator};
///
/// let estimator = StratifiedEstimator::new(
///     EnvironmentSpec::parse("Sequence,2")?,
///     AgentSpec::parse("Random")?,
///     EngineConfig::thorough(),
/// )?;
/// let report = estimator.run(&samples)?;
/// ```
pub struct StratifiedEstimator {
    settings: Arc<TrialSettings>,
    config: EngineConfig,
    progress_callback: Option<ProgressCallback>,
}

impl StratifiedEstimator {
    /// Create an estimator, validating everything that does not depend on the samples.
    pub fn new(
        environment: EnvironmentSpec,
        agent: AgentSpec,
        config: EngineConfig,
    ) -> Result<Self, AiqError> {
        let settings = trial_settings(environment, agent, &config)?;
        Ok(Self {
            settings: Arc::new(settings),
            config,
            progress_callback: None,
        })
    }

    /// Set progress callback, called after every retired job.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Episode settings shared by every trial.
    pub fn settings(&self) -> &TrialSettings {
        &self.settings
    }

    fn report_progress(&self, progress: Progress) {
        if let Some(ref callback) = self.progress_callback {
            callback(&progress);
        }
    }

    /// Run the full schedule over `samples`.
    pub fn run(&self, samples: &SampleSet) -> Result<EstimateReport, AiqError> {
        let start = Instant::now();

        let probabilities = samples.probabilities();
        let active = active_strata(&probabilities);
        if active == 0 {
            return Err(ConfigError::NoActiveStrata.into());
        }
        let available = samples.active_len();
        let requested = self.config.resolve_sample_size(available)?;
        let schedule = stage_schedule(active, available, requested);
        let stages = schedule.len().saturating_sub(1);
        let reporting_stage = self.config.reporting_start_stage.min(stages).max(1);
        let total = schedule.last().copied().unwrap_or(0);

        tracing::info!(
            environment = %self.settings.environment,
            agent = %self.settings.agent,
            strata = probabilities.len(),
            active,
            available,
            ?schedule,
            "starting stratified estimate"
        );

        let mut repository = SampleRepository::from_set(samples);
        let mut pool = WorkerPool::new(self.config.threads, self.config.worker_timeout)?;
        let mut pair_log = match &self.config.pair_log {
            Some(path) => Some(PairLog::create(path, &probabilities)?),
            None => None,
        };
        let mut state = EstimatorState::new(&probabilities);
        let mut truncated_pairs = 0;

        for stage in 1..schedule.len() {
            // Allocating
            let increment = schedule[stage].saturating_sub(schedule[stage - 1]);
            let allocation = allocate(&probabilities, &state.previous_std(), increment);
            if allocation.variance_fallback {
                tracing::warn!(stage, "all stratum deviations are zero; allocating by probability");
            }

            // Dispatching
            let mut ordinals = HashMap::new();
            for stratum in 0..probabilities.len() {
                for _ in 0..allocation.jobs(stratum) {
                    let sample = repository.pop(stratum)?;
                    let ordinal = sample.ordinal;
                    let job = TrialJob::new(Arc::clone(&self.settings), sample, self.config.seed);
                    ordinals.insert(pool.submit(job), ordinal);
                }
            }
            tracing::debug!(
                stage,
                jobs = pool.outstanding(),
                threads = pool.threads(),
                "dispatched stage"
            );

            // Collecting
            let mut retries = 0;
            let mut accepted = Vec::new();
            while let Some(done) = pool.next_completion()? {
                let stratum = done.result.stratum;
                let ordinal = ordinals.remove(&done.id).unwrap_or(usize::MAX);
                match done.result.outcome() {
                    TrialOutcome::Accepted(pair) => {
                        accepted.push((ordinal, stratum, pair));
                        if let Some(log) = pair_log.as_mut() {
                            log.record(stratum, pair)?;
                        }
                    }
                    TrialOutcome::Truncated => {
                        retries += 1;
                        let sample = repository.pop(stratum)?;
                        tracing::debug!(
                            stage,
                            stratum,
                            job = done.id,
                            replacement = sample.ordinal,
                            remaining = repository.remaining(stratum),
                            "truncated pair, resubmitting"
                        );
                        let ordinal = sample.ordinal;
                        let job = TrialJob::new(Arc::clone(&self.settings), sample, self.config.seed);
                        ordinals.insert(pool.submit(job), ordinal);
                    }
                }
                self.report_progress(Progress {
                    stage,
                    stages,
                    completed: 2 * (state.accepted_pairs() + accepted.len()),
                    total,
                });
            }
            truncated_pairs += retries;

            // Fold in file order so the moments do not depend on thread timing.
            accepted.sort_by_key(|&(ordinal, _, _)| ordinal);
            for (_, stratum, pair) in accepted {
                state.record(stratum, pair);
            }

            // Estimating
            let strata = state.estimates();
            let estimate = combine(&strata, schedule[stage]);
            let reportable = stage >= reporting_stage;
            if reportable {
                tracing::info!(
                    stage,
                    target = schedule[stage],
                    estimate = estimate.value,
                    half_width = estimate.half_width,
                    retries,
                    "stage complete"
                );
            } else {
                tracing::info!(stage, target = schedule[stage], retries, "stage complete");
            }

            state.push_stage(StageRecord {
                stage,
                target: schedule[stage],
                allocation: allocation.samples,
                strata,
                estimate,
                reportable,
                retries,
                variance_fallback: allocation.variance_fallback,
            });
        }

        let accepted_pairs = state.accepted_pairs();
        let stages = state.into_stages();
        Ok(EstimateReport {
            environment: self.settings.environment.to_string(),
            agent: self.settings.agent.to_string(),
            discount_rate: self.settings.discount_rate,
            episode_length: self.settings.episode_length,
            probabilities,
            estimate: stages.last().map(|s| s.estimate),
            schedule,
            stages,
            accepted_pairs,
            truncated_pairs,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }
}

impl std::fmt::Debug for StratifiedEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StratifiedEstimator")
            .field("settings", &self.settings)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_reward() -> EnvironmentSpec {
        EnvironmentSpec::Constant {
            reward: 0.0,
            actions: 2,
        }
    }

    #[test]
    fn test_new_rejects_bad_agent() {
        let err = StratifiedEstimator::new(
            zero_reward(),
            AgentSpec::Fixed { action: 5 },
            EngineConfig::quick(),
        )
        .unwrap_err();
        assert!(matches!(err, AiqError::Config(ConfigError::Parameter { .. })));
    }

    #[test]
    fn test_passive_only_pool_is_rejected() {
        let estimator = StratifiedEstimator::new(
            zero_reward(),
            AgentSpec::Fixed { action: 0 },
            EngineConfig::quick().threads(1),
        )
        .unwrap();
        let samples = SampleSet::new([(0, "a"), (0, "b")]).unwrap();
        assert!(matches!(
            estimator.run(&samples),
            Err(AiqError::Config(ConfigError::NoActiveStrata))
        ));
    }

    #[test]
    fn test_constant_reward_estimate() {
        let estimator = StratifiedEstimator::new(
            EnvironmentSpec::Constant {
                reward: 0.5,
                actions: 2,
            },
            AgentSpec::Fixed { action: 0 },
            EngineConfig::quick().episode_length(5).threads(2),
        )
        .unwrap();
        let samples = SampleSet::new((0..40).map(|i| (1 + i % 2, format!("p{i}")))).unwrap();
        let report = estimator.run(&samples).unwrap();

        // Antithetic pairs of a constant reward average to zero.
        let estimate = report.estimate.unwrap();
        assert!(estimate.value.abs() < 1e-12);
        assert_eq!(report.truncated_pairs, 0);
        assert_eq!(report.stages.len(), report.schedule.len() - 1);
    }
}

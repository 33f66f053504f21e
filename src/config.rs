//! Configuration for an AIQ estimation run.

use std::path::PathBuf;
use std::time::Duration;

use aiq_core::constants::{
    DEFAULT_REPORTING_START_STAGE, DEFAULT_SEED, DEFAULT_WORKER_TIMEOUT_SECS, EPISODE_COVERAGE,
};
use aiq_core::statistics::{coverage, episode_length_for_coverage};

use crate::error::ConfigError;

/// Configuration options for the estimators.
///
/// Values that can be checked on their own are checked by the builder
/// methods, which panic on out-of-range input. Combinations that depend on
/// the loaded sample pool are checked by [`EngineConfig::resolve_sample_size`]
/// and [`EngineConfig::validate`], which return [`ConfigError`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // =========================================================================
    // Episode
    // =========================================================================
    /// Number of agent/environment interactions per run.
    ///
    /// When `None`, derived from the discount rate so that an episode covers
    /// 95% of the infinite discounted total. Required when the discount
    /// rate is 1.0.
    pub episode_length: Option<usize>,

    /// Discount rate applied to rewards, in (0, 1]. Default: 1.0.
    pub discount_rate: f64,

    // =========================================================================
    // Sampling
    // =========================================================================
    /// Total number of samples to take across all stages.
    ///
    /// Each program is run twice (antithetic pair), so this may be up to
    /// twice the number of loaded programs. Default: None (the pool size).
    pub sample_size: Option<usize>,

    /// First stage whose global estimate is reported.
    ///
    /// Early stages have too few samples per stratum for the interval to
    /// mean much. Clamped to the last stage of short schedules. Default: 3.
    pub reporting_start_stage: usize,

    /// Seed for agent randomness and the simple estimator's sign choice.
    ///
    /// Each job derives its own seed from this and the program's position in
    /// the sample file, so runs are reproducible. Default: `DEFAULT_SEED`.
    pub seed: u64,

    // =========================================================================
    // Workers
    // =========================================================================
    /// Number of worker threads; 0 uses the host's available parallelism.
    pub threads: usize,

    /// Longest the orchestrator waits for any outstanding trial to resolve.
    ///
    /// Exceeding it is fatal. Default: 100 seconds.
    pub worker_timeout: Duration,

    // =========================================================================
    // Output
    // =========================================================================
    /// Append-only log of accepted antithetic pairs. Default: None.
    pub pair_log: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            episode_length: None,
            discount_rate: 1.0,
            sample_size: None,
            reporting_start_stage: DEFAULT_REPORTING_START_STAGE,
            seed: DEFAULT_SEED,
            threads: 0,
            worker_timeout: Duration::from_secs(DEFAULT_WORKER_TIMEOUT_SECS),
            pair_log: None,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for fast local runs and tests:
    /// - 100 step episodes, undiscounted
    /// - 10 second worker timeout
    pub fn quick() -> Self {
        Self {
            episode_length: Some(100),
            worker_timeout: Duration::from_secs(10),
            ..Default::default()
        }
    }

    /// Configuration for long evaluations:
    /// - discount 0.99 with a derived episode length
    /// - 10 minute worker timeout
    pub fn thorough() -> Self {
        Self {
            discount_rate: 0.99,
            worker_timeout: Duration::from_secs(600),
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Set the episode length.
    pub fn episode_length(mut self, length: usize) -> Self {
        assert!(length > 0, "episode_length must be positive");
        self.episode_length = Some(length);
        self
    }

    /// Set the discount rate.
    pub fn discount_rate(mut self, rate: f64) -> Self {
        assert!(rate > 0.0 && rate <= 1.0, "discount_rate must be in (0, 1]");
        self.discount_rate = rate;
        self
    }

    /// Set the total sample size.
    pub fn sample_size(mut self, size: usize) -> Self {
        assert!(size > 0, "sample_size must be positive");
        self.sample_size = Some(size);
        self
    }

    /// Set the number of worker threads (0 = host parallelism).
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the worker timeout.
    pub fn worker_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "worker_timeout must be positive");
        self.worker_timeout = timeout;
        self
    }

    /// Set the first reported stage.
    pub fn reporting_start_stage(mut self, stage: usize) -> Self {
        assert!(stage > 0, "reporting_start_stage must be at least 1");
        self.reporting_start_stage = stage;
        self
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Log accepted pairs to `path`.
    pub fn pair_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.pair_log = Some(path.into());
        self
    }

    // =========================================================================
    // Resolution methods
    // =========================================================================

    /// The episode length to run, deriving it from the discount rate if unset.
    pub fn resolve_episode_length(&self) -> Result<usize, ConfigError> {
        match self.episode_length {
            Some(0) => Err(ConfigError::EpisodeLength),
            Some(length) => Ok(length),
            None => episode_length_for_coverage(self.discount_rate, EPISODE_COVERAGE)
                .ok_or(ConfigError::EpisodeLengthRequired),
        }
    }

    /// Fraction of the infinite discounted total one episode covers.
    pub fn episode_coverage(&self) -> Result<f64, ConfigError> {
        Ok(coverage(self.discount_rate, self.resolve_episode_length()?))
    }

    /// The sample size to use given `available` loaded programs.
    ///
    /// Defaults to `available`. A request above twice the pool is rejected;
    /// a stratum can still run dry later, depending on how the allocator
    /// spreads samples and how many trials are truncated.
    pub fn resolve_sample_size(&self, available: usize) -> Result<usize, ConfigError> {
        let requested = self.sample_size.unwrap_or(available);
        if requested == 0 {
            return Err(ConfigError::SampleSize);
        }
        let max = 2 * available;
        if requested > max {
            return Err(ConfigError::SampleSizeTooLarge {
                requested,
                available,
                max,
            });
        }
        Ok(requested)
    }

    /// Check the configuration on its own.
    ///
    /// Fields are public, so this repeats the builder checks for values set
    /// directly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.discount_rate > 0.0 && self.discount_rate <= 1.0) {
            return Err(ConfigError::DiscountRate(self.discount_rate));
        }
        self.resolve_episode_length()?;
        if self.sample_size == Some(0) {
            return Err(ConfigError::SampleSize);
        }
        if self.reporting_start_stage == 0 {
            return Err(ConfigError::ReportingStage);
        }
        Ok(())
    }
}

//! # aiq
//!
//! Estimate the Algorithmic IQ of a reinforcement-learning agent.
//!
//! An agent is run against a large population of programs sampled from a
//! reference machine, grouped into strata. Its score is the probability
//! weighted average of its normalized discounted return, estimated with
//! adaptive stratified Monte Carlo:
//!
//! - every program is run twice, once with the rewards negated, and the
//!   two returns are averaged (antithetic pair)
//! - a fixed schedule of stages grows the sample count, and each stage
//!   spreads its new samples across strata in proportion to
//!   `p_i * s_i` from the previous stage
//! - trials run on a worker pool; a pair that hits the environment's step
//!   bound is replaced by a fresh program from the same stratum
//!
//! ## Quick Start
//!
//! ```ignore
//! use aiq::{load_samples, AgentSpec, EngineConfig, EnvironmentSpec, StratifiedEstimator};
//! use std::path::Path;
//!
//! let samples = load_samples(Path::new("refmachines/Sequence.samples"))?;
//! let estimator = StratifiedEstimator::new(
//!     EnvironmentSpec::parse("Sequence,2")?,
//!     AgentSpec::parse("Q_l,0,0.9,0.5,0.05")?,
//!     EngineConfig::thorough(),
//! )?;
//!
//! let report = estimator.run(&samples)?;
//! if let Some(estimate) = report.estimate {
//!     println!("AIQ: {:.4} +/- {:.4}", estimate.value, estimate.half_width);
//! }
//! ```
//!
//! The numerics (schedule, allocation, pair statistics) live in the
//! `aiq-core` crate and are re-exported here.

#![warn(clippy::all)]

// Core modules
mod config;
mod error;

// Functional modules
pub mod agent;
pub mod environment;
pub mod estimator;
pub mod output;
pub mod pair_log;
pub mod pool;
pub mod samples;
pub mod trial;

// Re-exports for public API
pub use agent::{Agent, AgentSpec};
pub use config::EngineConfig;
pub use environment::{Environment, EnvironmentSpec, Observation, Step};
pub use error::{AiqError, ConfigError, Result, SampleFileError};
pub use estimator::{
    Checkpoint, EstimateReport, Progress, SimpleMcEstimator, SimpleMcReport, StageRecord,
    StratifiedEstimator,
};
pub use pair_log::PairLog;
pub use samples::{load_samples, parse_samples, ProgramSample, SampleRepository, SampleSet};
pub use trial::{run_trial, TrialJob, TrialSettings};

pub use aiq_core::{
    constants, Estimate, PairReturns, StratumEstimate, StratumId, TrialOutcome, TrialResult,
};

//! Error taxonomy for an estimation run.
//!
//! Only a truncated episode is recoverable, and it never surfaces here: the
//! stage loop discards the pair and resubmits a fresh program. Everything in
//! [`AiqError`] aborts the run.

use std::path::PathBuf;
use std::time::Duration;

use aiq_core::StratumId;
use thiserror::Error;

/// Fatal errors of an estimation run.
#[derive(Debug, Error)]
pub enum AiqError {
    /// A stratum had no unused program left when one was needed.
    #[error("ran out of program samples in stratum {stratum}")]
    StratumExhausted {
        /// The exhausted stratum.
        stratum: StratumId,
    },

    /// No outstanding trial resolved within the worker timeout.
    #[error(
        "no trial resolved within {waited:?} ({outstanding} outstanding, oldest in stratum {stratum})"
    )]
    WorkerTimeout {
        /// Stratum of the oldest outstanding job.
        stratum: StratumId,
        /// How long the orchestrator waited.
        waited: Duration,
        /// Jobs still in flight when the wait gave up.
        outstanding: usize,
    },

    /// A worker panicked while running a trial.
    #[error("trial in stratum {stratum} panicked: {message}")]
    WorkerPanicked {
        /// Stratum of the failed job.
        stratum: StratumId,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// Invalid or inconsistent configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The program sample source could not be read or parsed.
    #[error(transparent)]
    SampleFile(#[from] SampleFileError),

    /// The worker thread pool could not be started.
    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The report could not be serialized.
    #[error("cannot serialize report: {0}")]
    Report(#[from] serde_json::Error),

    /// Writing the pair log failed.
    #[error("pair log {path}: {source}")]
    PairLog {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Invalid parameter or parameter combination.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Discount rate outside (0, 1].
    #[error("discount rate must be in (0, 1], got {0}")]
    DiscountRate(f64),

    /// Episode length of zero.
    #[error("episode length must be positive")]
    EpisodeLength,

    /// No episode length and no discounting to derive one from.
    #[error("with a discount rate of 1.0 the episode length must be set")]
    EpisodeLengthRequired,

    /// Requested more samples than the pool can supply, counting both antithetic runs.
    #[error(
        "requested {requested} samples but only {available} programs are available (at most {max} samples)"
    )]
    SampleSizeTooLarge {
        /// Requested sample size.
        requested: usize,
        /// Programs in the pool.
        available: usize,
        /// Largest sample size the pool supports.
        max: usize,
    },

    /// A sample size of zero.
    #[error("sample size must be positive")]
    SampleSize,

    /// The pool has no program in any active stratum.
    #[error("no active strata: every program is in the passive stratum 0")]
    NoActiveStrata,

    /// Reporting stage of zero.
    #[error("reporting start stage must be at least 1")]
    ReportingStage,

    /// Pair logging requested with an estimator that does not pair runs.
    #[error("the simple Monte Carlo estimator does not write a pair log")]
    PairLogUnsupported,

    /// Unknown environment name.
    #[error("unknown environment '{0}'")]
    UnknownEnvironment(String),

    /// Unknown agent name.
    #[error("unknown agent '{0}'")]
    UnknownAgent(String),

    /// A collaborator parameter is missing, extra, or out of range.
    #[error("{component}: {message}")]
    Parameter {
        /// Environment or agent name.
        component: String,
        /// What is wrong.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn parameter(component: &str, message: impl Into<String>) -> Self {
        Self::Parameter {
            component: component.to_string(),
            message: message.into(),
        }
    }
}

/// Errors reading the program sample file.
#[derive(Debug, Error)]
pub enum SampleFileError {
    /// The file could not be opened or read.
    #[error("cannot read sample file {path}: {source}")]
    Io {
        /// Sample file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line did not have the `<stratum> <program>` shape.
    #[error("sample file line {line}: expected '<stratum> <program>', got '{content}'")]
    Malformed {
        /// Line number (1-indexed).
        line: usize,
        /// Offending line.
        content: String,
    },

    /// The stratum field was not a non-negative integer.
    #[error("sample file line {line}: invalid stratum index '{value}'")]
    InvalidStratum {
        /// Line number (1-indexed).
        line: usize,
        /// Offending field.
        value: String,
    },

    /// Strata are not numbered contiguously from 1.
    #[error("sample file line {line}: stratum {stratum} appears but stratum {missing} has no programs")]
    StratumGap {
        /// Line of the first record in `stratum` (1-indexed).
        line: usize,
        /// Stratum found past the gap.
        stratum: StratumId,
        /// Lowest active stratum with no records.
        missing: StratumId,
    },

    /// The file contained no samples.
    #[error("sample file contains no programs")]
    Empty,
}

/// Result alias for estimation runs.
pub type Result<T, E = AiqError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_stratum() {
        let err = AiqError::StratumExhausted { stratum: 7 };
        assert!(err.to_string().contains("stratum 7"));

        let err = AiqError::WorkerTimeout {
            stratum: 3,
            waited: Duration::from_secs(100),
            outstanding: 2,
        };
        assert!(err.to_string().contains("stratum 3"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: AiqError = ConfigError::EpisodeLength.into();
        assert!(matches!(err, AiqError::Config(ConfigError::EpisodeLength)));
    }
}

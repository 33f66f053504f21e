//! Plain data types shared between the core and the engine.

use serde::{Deserialize, Serialize};

/// Index of a stratum in the sample population.
pub type StratumId = usize;

/// Normalized discounted returns of one antithetic pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairReturns {
    /// Return of the run with the reward as given.
    pub positive: f64,
    /// Return of the run with the reward sign flipped.
    pub negative: f64,
}

impl PairReturns {
    /// Create a pair from its two returns.
    pub fn new(positive: f64, negative: f64) -> Self {
        Self { positive, negative }
    }

    /// Average of the two antithetic returns.
    pub fn mean(&self) -> f64 {
        0.5 * (self.positive + self.negative)
    }
}

/// What the Trial Executor produced for one program.
///
/// A truncated run is reported as NaN in its slot; a pair is only usable
/// when both slots are numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    /// Stratum the program was drawn from.
    pub stratum: StratumId,
    /// Return of the positive-sign run, or NaN on truncation.
    pub return1: f64,
    /// Return of the negative-sign run, or NaN on truncation.
    pub return2: f64,
}

/// Classification of a [`TrialResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialOutcome {
    /// Both runs completed.
    Accepted(PairReturns),
    /// At least one run hit the environment step bound.
    Truncated,
}

impl TrialResult {
    /// Create a result from its raw returns.
    pub fn new(stratum: StratumId, return1: f64, return2: f64) -> Self {
        Self {
            stratum,
            return1,
            return2,
        }
    }

    /// A result in which both runs are treated as truncated.
    pub fn truncated(stratum: StratumId) -> Self {
        Self::new(stratum, f64::NAN, f64::NAN)
    }

    /// Whether the pair can be counted into its stratum.
    pub fn is_accepted(&self) -> bool {
        !self.return1.is_nan() && !self.return2.is_nan()
    }

    /// Classify the result; a half-truncated pair is a full failure.
    pub fn outcome(&self) -> TrialOutcome {
        if self.is_accepted() {
            TrialOutcome::Accepted(PairReturns::new(self.return1, self.return2))
        } else {
            TrialOutcome::Truncated
        }
    }
}

//! Estimator state owned by the stage loop.

use aiq_core::{
    Estimate, PairAccumulator, PairReturns, StratumEstimate, StratumId,
};
use serde::{Deserialize, Serialize};

/// Accumulated data of one stratum.
#[derive(Debug, Clone)]
pub struct StratumState {
    /// Sampling weight.
    pub probability: f64,
    /// Online moments of the accepted pairs.
    pub accumulator: PairAccumulator,
    /// Accepted pairs in retirement order.
    pub pairs: Vec<PairReturns>,
}

impl StratumState {
    fn new(probability: f64) -> Self {
        Self {
            probability,
            accumulator: PairAccumulator::new(),
            pairs: Vec::new(),
        }
    }

    /// Cumulative sample count (two per accepted pair).
    pub fn samples(&self) -> usize {
        2 * self.pairs.len()
    }

    fn estimate(&self, stratum: StratumId) -> StratumEstimate {
        if self.pairs.is_empty() {
            return StratumEstimate::empty(stratum, self.probability);
        }
        StratumEstimate::from_snapshot(
            stratum,
            self.probability,
            self.samples(),
            &self.accumulator.finalize(),
        )
    }
}

/// Record of one completed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage index `k`, starting at 1.
    pub stage: usize,
    /// Cumulative target `N_k`.
    pub target: usize,
    /// Samples allocated to each stratum this stage (`M_i`).
    pub allocation: Vec<usize>,
    /// Per-stratum summaries after the stage.
    pub strata: Vec<StratumEstimate>,
    /// Global estimate after the stage.
    pub estimate: Estimate,
    /// Whether the stage is at or past the reporting start stage.
    pub reportable: bool,
    /// Truncated pairs replaced with fresh programs during the stage.
    pub retries: usize,
    /// Whether the allocation ignored the variances because all were zero.
    pub variance_fallback: bool,
}

/// All strata plus the stage history.
#[derive(Debug, Clone)]
pub struct EstimatorState {
    strata: Vec<StratumState>,
    stages: Vec<StageRecord>,
}

impl EstimatorState {
    /// Empty state for strata with the given weights.
    pub fn new(probabilities: &[f64]) -> Self {
        Self {
            strata: probabilities.iter().map(|&p| StratumState::new(p)).collect(),
            stages: Vec::new(),
        }
    }

    /// Add an accepted pair to `stratum`.
    pub fn record(&mut self, stratum: StratumId, pair: PairReturns) {
        let state = &mut self.strata[stratum];
        state.accumulator.update(pair);
        state.pairs.push(pair);
    }

    /// Current per-stratum summaries.
    pub fn estimates(&self) -> Vec<StratumEstimate> {
        self.strata
            .iter()
            .enumerate()
            .map(|(i, s)| s.estimate(i))
            .collect()
    }

    /// Standard deviations from the last completed stage, 1 before the first.
    pub fn previous_std(&self) -> Vec<f64> {
        match self.stages.last() {
            Some(record) => record.strata.iter().map(|s| s.std_dev).collect(),
            None => self
                .strata
                .iter()
                .enumerate()
                .map(|(i, s)| StratumEstimate::empty(i, s.probability).std_dev)
                .collect(),
        }
    }

    /// Append a completed stage.
    pub fn push_stage(&mut self, record: StageRecord) {
        self.stages.push(record);
    }

    /// All strata.
    pub fn strata(&self) -> &[StratumState] {
        &self.strata
    }

    /// Completed stages in order.
    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    /// Consume the state, returning the stage history.
    pub fn into_stages(self) -> Vec<StageRecord> {
        self.stages
    }

    /// Accepted pairs across all strata.
    pub fn accepted_pairs(&self) -> usize {
        self.strata.iter().map(|s| s.pairs.len()).sum()
    }
}

/// Everything a stratified run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    /// Environment display name.
    pub environment: String,
    /// Agent display name.
    pub agent: String,
    pub discount_rate: f64,
    pub episode_length: usize,
    /// Stratum weights, passive stratum included.
    pub probabilities: Vec<f64>,
    /// Cumulative stage targets `N[0..K]`.
    pub schedule: Vec<usize>,
    pub stages: Vec<StageRecord>,
    /// Estimate of the last stage, if any stage ran.
    pub estimate: Option<Estimate>,
    /// Accepted antithetic pairs.
    pub accepted_pairs: usize,
    /// Truncated pairs that were replaced.
    pub truncated_pairs: usize,
    /// Wall-clock duration of the run.
    pub elapsed_secs: f64,
}

impl EstimateReport {
    /// Stages whose estimate is reported.
    pub fn reportable_stages(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages.iter().filter(|s| s.reportable)
    }
}

//! Aggregation of per-stratum pair statistics into the global estimate.
//!
//! For stratum `i` with `n_i` cumulative samples and accepted pairs
//! `(r1, r2)`:
//!
//! - `mean_i` is the mean of the pair averages `(r1 + r2) / 2`
//! - `s_i^2 = 0.25 * (var(r1) + var(r2) + 2 cov(r1, r2))`, falling back to
//!   `s_i = 1` while `n_i <= 2`
//!
//! and the stage estimate is `sum_i p_i * mean_i` with the 95% half-width
//! `1.96 * sum_i p_i * s_i / sqrt(N_k)`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    MIN_SAMPLES_FOR_HALF_WIDTH, MIN_SAMPLES_FOR_VARIANCE, UNINFORMATIVE_STD, Z_95,
};
use crate::statistics::PairSnapshot;
use crate::types::StratumId;

/// Summary of one stratum after a stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StratumEstimate {
    /// Stratum index.
    pub stratum: StratumId,
    /// Sampling weight of the stratum.
    pub probability: f64,
    /// Cumulative sample count `n_{k,i}` (two per accepted pair).
    pub samples: usize,
    /// Mean of the pair averages, `None` before the first accepted pair.
    pub mean: Option<f64>,
    /// Standard deviation `s_{k,i}` used by the next allocation.
    pub std_dev: f64,
}

impl StratumEstimate {
    /// Build the summary for a stratum from its pair moments.
    pub fn from_snapshot(
        stratum: StratumId,
        probability: f64,
        samples: usize,
        snapshot: &PairSnapshot,
    ) -> Self {
        let std_dev = if probability > 0.0 && samples > MIN_SAMPLES_FOR_VARIANCE {
            snapshot.pair_std_dev()
        } else {
            UNINFORMATIVE_STD
        };

        Self {
            stratum,
            probability,
            samples,
            mean: (snapshot.pairs > 0).then_some(snapshot.mean),
            std_dev,
        }
    }

    /// Summary for a stratum with no data yet.
    pub fn empty(stratum: StratumId, probability: f64) -> Self {
        Self {
            stratum,
            probability,
            samples: 0,
            mean: None,
            std_dev: UNINFORMATIVE_STD,
        }
    }

    /// Whether the stratum carries sampling weight.
    pub fn is_active(&self) -> bool {
        self.probability > 0.0
    }

    /// Per-stratum 95% half-width, once there are enough samples to quote one.
    pub fn half_width(&self) -> Option<f64> {
        (self.samples >= MIN_SAMPLES_FOR_HALF_WIDTH)
            .then(|| Z_95 * self.std_dev / (self.samples as f64).sqrt())
    }
}

/// Point estimate with a symmetric 95% interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Weighted mean over active strata.
    pub value: f64,
    /// Half-width of the normal-approximation 95% interval.
    pub half_width: f64,
}

impl Estimate {
    /// Lower end of the interval.
    pub fn lower(&self) -> f64 {
        self.value - self.half_width
    }

    /// Upper end of the interval.
    pub fn upper(&self) -> f64 {
        self.value + self.half_width
    }
}

/// Combine stratum summaries into the stage estimate.
///
/// `target` is the stage's cumulative sample target `N_k`. Active strata
/// without pairs contribute nothing to the mean.
pub fn combine(strata: &[StratumEstimate], target: usize) -> Estimate {
    let value = strata
        .iter()
        .filter(|s| s.is_active())
        .map(|s| s.probability * s.mean.unwrap_or(0.0))
        .sum();

    let weighted_std: f64 = strata.iter().map(|s| s.probability * s.std_dev).sum();
    let half_width = if target > 0 {
        Z_95 * weighted_std / (target as f64).sqrt()
    } else {
        f64::INFINITY
    };

    Estimate { value, half_width }
}

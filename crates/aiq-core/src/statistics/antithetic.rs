//! Online moments of antithetic return pairs using Welford's algorithm.
//!
//! Each stratum keeps one accumulator. The moments do not depend on the
//! order pairs are added in beyond floating-point rounding.

use crate::types::PairReturns;

/// Streaming accumulator for the two return series of a stratum.
///
/// Tracks both means, both sums of squared deviations and the co-moment,
/// which is everything needed for the variance of the pair average.
///
/// # Example
///
/// ```
/// use aiq_core::statistics::PairAccumulator;
/// use aiq_core::PairReturns;
///
/// let mut acc = PairAccumulator::new();
/// acc.update(PairReturns::new(1.0, -1.0));
/// acc.update(PairReturns::new(0.5, -0.5));
/// let snapshot = acc.finalize();
/// assert_eq!(snapshot.pairs, 2);
/// assert!(snapshot.mean.abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PairAccumulator {
    count: usize,
    mean_positive: f64,
    mean_negative: f64,
    m2_positive: f64,
    m2_negative: f64,
    /// Sum of (x - mean_x)(y - mean_y) products.
    comoment: f64,
}

impl PairAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one accepted pair.
    pub fn update(&mut self, pair: PairReturns) {
        self.count += 1;
        let n = self.count as f64;

        let dx = pair.positive - self.mean_positive;
        self.mean_positive += dx / n;
        let dy = pair.negative - self.mean_negative;
        self.mean_negative += dy / n;

        self.m2_positive += dx * (pair.positive - self.mean_positive);
        self.m2_negative += dy * (pair.negative - self.mean_negative);
        // Co-moment uses the old x deviation and the new y deviation.
        self.comoment += dx * (pair.negative - self.mean_negative);
    }

    /// Number of pairs seen.
    pub fn pairs(&self) -> usize {
        self.count
    }

    /// Mean of the pair averages, or `None` before the first pair.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| 0.5 * (self.mean_positive + self.mean_negative))
    }

    /// Snapshot of the current moments (unbiased, n-1 denominators).
    pub fn finalize(&self) -> PairSnapshot {
        let mean = 0.5 * (self.mean_positive + self.mean_negative);
        if self.count < 2 {
            return PairSnapshot {
                pairs: self.count,
                mean,
                variance_positive: 0.0,
                variance_negative: 0.0,
                covariance: 0.0,
            };
        }

        let dof = (self.count - 1) as f64;
        PairSnapshot {
            pairs: self.count,
            mean,
            variance_positive: self.m2_positive / dof,
            variance_negative: self.m2_negative / dof,
            covariance: self.comoment / dof,
        }
    }
}

/// Moments of a stratum's antithetic pairs at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSnapshot {
    /// Number of accepted pairs.
    pub pairs: usize,
    /// Mean of the pair averages.
    pub mean: f64,
    /// Sample variance of the positive-sign returns.
    pub variance_positive: f64,
    /// Sample variance of the negative-sign returns.
    pub variance_negative: f64,
    /// Sample covariance between the two return series.
    pub covariance: f64,
}

impl PairSnapshot {
    /// Variance of the pair average: `0.25 * (var1 + var2 + 2 cov)`.
    ///
    /// Clamped at zero; perfectly anti-correlated streams can round to a tiny
    /// negative number.
    pub fn pair_variance(&self) -> f64 {
        let var = 0.25 * (self.variance_positive + self.variance_negative + 2.0 * self.covariance);
        var.max(0.0)
    }

    /// Standard deviation of the pair average.
    pub fn pair_std_dev(&self) -> f64 {
        self.pair_variance().sqrt()
    }
}

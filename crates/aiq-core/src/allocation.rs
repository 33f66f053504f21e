//! Stage schedule and adaptive sample allocation.
//!
//! The estimator runs a fixed sequence of stages with cumulative sample
//! targets `N[0..K]`. At stage `k` the increment `N[k] - N[k-1]` is split
//! across strata in proportion to `p_i * s_{k-1,i}` (Neyman-style
//! allocation with the previous stage's standard deviations), then:
//!
//! 1. two samples per active stratum are reserved and the rest halved,
//! 2. the proportional shares are integerized with a cumulative floor so
//!    their sum never drifts from the floor of the real-valued total,
//! 3. the integer shares are doubled and the reserved two added back,
//!    which keeps every active stratum's count even for antithetic pairing.

use crate::constants::{ALLOCATION_FLOOR_EPSILON, STAGE_MULTIPLIERS};

/// Per-stage allocation of samples to strata.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Real-valued proportional shares (in pairs, before integerization).
    pub raw: Vec<f64>,
    /// Integerized pair shares from the cumulative floor.
    pub pairs: Vec<usize>,
    /// Samples assigned this stage: `2 * pairs + 2 * [p > 0]`. Always even.
    pub samples: Vec<usize>,
    /// True when every weighted deviation was zero and the split fell back
    /// to the stratum probabilities alone.
    pub variance_fallback: bool,
}

impl Allocation {
    /// Total samples assigned across strata.
    pub fn total(&self) -> usize {
        self.samples.iter().sum()
    }

    /// Number of antithetic-pair jobs for stratum `i` (`samples[i] / 2`).
    pub fn jobs(&self, stratum: usize) -> usize {
        self.samples.get(stratum).map_or(0, |m| m / 2)
    }
}

/// Number of strata with positive probability.
pub fn active_strata(probabilities: &[f64]) -> usize {
    probabilities.iter().filter(|&&p| p > 0.0).count()
}

/// Cumulative sample targets for each stage, starting with `N[0] = 0`.
///
/// The ramp is [`STAGE_MULTIPLIERS`] scaled by the number of active strata.
/// It is cut at the first stage whose target plus one sample per active
/// stratum would reach `min(available, requested)`; that stage's target is
/// set to the cap exactly.
pub fn stage_schedule(active: usize, available: usize, requested: usize) -> Vec<usize> {
    let cap = available.min(requested);
    let mut schedule = Vec::with_capacity(STAGE_MULTIPLIERS.len());

    for multiplier in STAGE_MULTIPLIERS {
        let target = multiplier * active;
        if target + active >= cap {
            schedule.push(cap);
            return schedule;
        }
        schedule.push(target);
    }

    schedule
}

/// Integerize non-negative shares with a cumulative floor.
///
/// `x_0 = floor(raw_0 + e)` and `x_i = floor(C_i + e) - floor(C_{i-1} + e)`
/// where `C_i` is the running sum and `e` is [`ALLOCATION_FLOOR_EPSILON`].
/// The result telescopes, so `sum(x) == floor(C_last + e)`.
pub fn cumulative_floor(raw: &[f64]) -> Vec<usize> {
    let mut out = Vec::with_capacity(raw.len());
    let mut cumulative = 0.0;
    let mut previous_floor = 0.0;

    for &share in raw {
        cumulative += share;
        let floor = (cumulative + ALLOCATION_FLOOR_EPSILON).floor();
        out.push((floor - previous_floor).max(0.0) as usize);
        previous_floor = floor;
    }

    out
}

/// Allocate one stage's increment of `increment` samples across strata.
///
/// `probabilities` and `prev_std` are indexed by stratum (including the
/// passive stratum 0 with probability 0). An increment smaller than the
/// per-stratum reserve allocates only the reserve.
pub fn allocate(probabilities: &[f64], prev_std: &[f64], increment: usize) -> Allocation {
    debug_assert_eq!(probabilities.len(), prev_std.len());

    let active = active_strata(probabilities);
    let budget = increment.saturating_sub(2 * active) as f64 / 2.0;

    let mut weights: Vec<f64> = probabilities
        .iter()
        .zip(prev_std)
        .map(|(&p, &s)| p * s)
        .collect();
    let mut total: f64 = weights.iter().sum();

    let variance_fallback = !(total > 0.0 && total.is_finite());
    if variance_fallback {
        weights = probabilities.to_vec();
        total = weights.iter().sum();
    }

    let raw: Vec<f64> = if total > 0.0 {
        weights.iter().map(|w| w / total * budget).collect()
    } else {
        vec![0.0; probabilities.len()]
    };

    let pairs = cumulative_floor(&raw);
    let samples = pairs
        .iter()
        .zip(probabilities)
        .map(|(&x, &p)| 2 * x + if p > 0.0 { 2 } else { 0 })
        .collect();

    Allocation {
        raw,
        pairs,
        samples,
        variance_fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_full_ramp() {
        let schedule = stage_schedule(1, 1_000_000, 1_000_000);
        assert_eq!(schedule.len(), STAGE_MULTIPLIERS.len());
        assert_eq!(schedule[1], 3);
        assert_eq!(*schedule.last().unwrap(), 5000);
    }

    #[test]
    fn test_schedule_truncated_by_request() {
        // A = 2: 0, 6, 12, 20, 40 ... 20 + 2 >= 20 cuts at stage 3
        assert_eq!(stage_schedule(2, 1000, 20), vec![0, 6, 12, 20]);
    }

    #[test]
    fn test_schedule_truncated_by_pool() {
        assert_eq!(stage_schedule(4, 50, 10_000), vec![0, 12, 24, 40, 50]);
    }

    #[test]
    fn test_schedule_tiny_pool() {
        assert_eq!(stage_schedule(3, 2, 2), vec![2]);
    }

    #[test]
    fn test_cumulative_floor_no_drift() {
        let raw = [0.4, 0.4, 0.4, 0.4, 0.4];
        let x = cumulative_floor(&raw);
        assert_eq!(x, vec![0, 0, 1, 0, 1]);
        assert_eq!(x.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_cumulative_floor_absorbs_rounding() {
        // 0.7 + 0.2 + 0.1 sums to 0.9999999999999999
        assert_eq!(cumulative_floor(&[0.7, 0.2, 0.1]), vec![0, 0, 1]);
    }

    #[test]
    fn test_equal_thirds_use_whole_budget() {
        let third = 1.0 / 3.0;
        let p = [0.0, third, third, third];
        let s = [1.0; 4];
        for budget in 1..60 {
            let alloc = allocate(&p, &s, 6 + 2 * budget);
            assert_eq!(alloc.pairs.iter().sum::<usize>(), budget, "budget {budget}");
            assert_eq!(alloc.total(), 6 + 2 * budget);
        }
    }

    #[test]
    fn test_equal_shares_use_whole_budget() {
        for n in 3..40 {
            let mut p = vec![1.0 / n as f64; n + 1];
            p[0] = 0.0;
            let s = vec![1.0; n + 1];
            for budget in 1..60 {
                let alloc = allocate(&p, &s, 2 * n + 2 * budget);
                assert_eq!(alloc.pairs.iter().sum::<usize>(), budget, "n {n}, budget {budget}");
            }
        }
    }

    #[test]
    fn test_first_stage_allocation() {
        let p = [0.0, 0.5, 0.5];
        let alloc = allocate(&p, &[1.0, 1.0, 1.0], 6);
        assert_eq!(alloc.samples, vec![0, 2, 4]);
        assert_eq!(alloc.total(), 6);
        assert!(!alloc.variance_fallback);
        assert_eq!(alloc.jobs(2), 2);
    }

    #[test]
    fn test_allocation_follows_deviation() {
        let p = [0.0, 0.5, 0.5];
        // Stratum 2 is three times as noisy: it gets three quarters of the budget.
        let alloc = allocate(&p, &[1.0, 1.0, 3.0], 4 + 16);
        assert_eq!(alloc.pairs, vec![0, 2, 6]);
        assert_eq!(alloc.samples, vec![0, 6, 14]);
    }

    #[test]
    fn test_zero_variance_falls_back_to_probabilities() {
        let p = [0.0, 0.25, 0.75];
        let alloc = allocate(&p, &[1.0, 0.0, 0.0], 4 + 8);
        assert!(alloc.variance_fallback);
        assert_eq!(alloc.pairs, vec![0, 1, 3]);
        assert_eq!(alloc.samples, vec![0, 4, 8]);
    }

    #[test]
    fn test_increment_below_reserve() {
        let p = [0.0, 0.5, 0.5];
        let alloc = allocate(&p, &[1.0, 1.0, 1.0], 3);
        assert_eq!(alloc.samples, vec![0, 2, 2]);
    }

    #[test]
    fn test_inactive_stratum_gets_nothing() {
        let p = [0.0, 0.6, 0.0, 0.4];
        let alloc = allocate(&p, &[1.0; 4], 40);
        assert_eq!(alloc.samples[0], 0);
        assert_eq!(alloc.samples[2], 0);
        assert!(alloc.samples.iter().all(|m| m % 2 == 0));
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let p = [0.0, 0.1, 0.2, 0.3, 0.4];
        let s = [1.0, 0.3, 0.7, 0.2, 0.9];
        assert_eq!(allocate(&p, &s, 123), allocate(&p, &s, 123));
    }
}

//! Discounting helpers for episode returns.
//!
//! A run accumulates `sign * r^t * reward` and is then divided by
//! [`normalization_factor`], so a constant reward `c` normalizes to `c`
//! whatever the episode length or discount rate. Under discounting the sum
//! runs over `t = 0..=L` (the reward returned by `reset` is the `t = 0`
//! term); without discounting it runs over the `L` step rewards only.

/// Whether the reward returned by `reset` is part of the discounted sum.
pub fn uses_reset_reward(discount_rate: f64) -> bool {
    discount_rate != 1.0
}

/// Total weight of the discounted terms of an episode of length `episode_length`.
///
/// `(1 - r^(L+1)) / (1 - r)` when `r != 1`, otherwise `L`.
pub fn normalization_factor(discount_rate: f64, episode_length: usize) -> f64 {
    if uses_reset_reward(discount_rate) {
        (1.0 - discount_rate.powf(episode_length as f64 + 1.0)) / (1.0 - discount_rate)
    } else {
        episode_length as f64
    }
}

/// Fraction of the infinite discounted total covered by `episode_length` steps.
///
/// Always 1.0 without discounting.
pub fn coverage(discount_rate: f64, episode_length: usize) -> f64 {
    if discount_rate == 1.0 {
        1.0
    } else {
        1.0 - discount_rate.powf(episode_length as f64)
    }
}

/// Shortest episode length whose discounted weight covers `proportion` of the total.
///
/// Returns `None` for a discount rate of 1, where no finite length is implied.
pub fn episode_length_for_coverage(discount_rate: f64, proportion: f64) -> Option<usize> {
    if discount_rate >= 1.0 || discount_rate <= 0.0 {
        return None;
    }
    let length = ((1.0 - proportion).ln() / discount_rate.ln()).floor();
    Some(length.max(1.0) as usize)
}

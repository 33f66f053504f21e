//! Statistical building blocks for the estimator.
//!
//! - [`PairAccumulator`]: online means, variances and covariance of the two
//!   antithetic return streams of a stratum
//! - [`OnlineStats`]: running mean and variance of one return series
//! - [`normalization_factor`]: scale that maps a discounted return onto the
//!   per-step reward range

mod antithetic;
mod discount;
mod online;

pub use antithetic::{PairAccumulator, PairSnapshot};
pub use discount::{coverage, episode_length_for_coverage, normalization_factor, uses_reset_reward};
pub use online::OnlineStats;

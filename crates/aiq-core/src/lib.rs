//! Core numerics for adaptive stratified AIQ estimation.
//!
//! This crate holds the parts of the estimator that are pure arithmetic:
//! no threads, no files, no agents. It is used through the main `aiq`
//! crate, which owns the sample pool, the worker pool and the stage loop.
//!
//! - [`allocation`]: the front-loaded stage schedule and the per-stage
//!   proportional allocation of samples to strata
//! - [`statistics`]: online moments for antithetic pairs and the
//!   discounted-return normalization
//! - [`estimate`]: per-stratum summaries combined into a global estimate
//!   with a 95% half-width
//!
//! ```
//! use aiq_core::allocation::{allocate, stage_schedule};
//!
//! let p = [0.0, 0.5, 0.5];
//! let schedule = stage_schedule(2, 200, 200);
//! assert_eq!(schedule[..4], [0, 6, 12, 20]);
//!
//! let first = allocate(&p, &[1.0, 1.0, 1.0], schedule[1] - schedule[0]);
//! assert_eq!(first.samples.iter().sum::<usize>(), 6);
//! ```

pub mod allocation;
pub mod constants;
pub mod estimate;
pub mod statistics;
pub mod types;

pub use allocation::{active_strata, allocate, cumulative_floor, stage_schedule, Allocation};
pub use estimate::{combine, Estimate, StratumEstimate};
pub use statistics::{normalization_factor, PairAccumulator, PairSnapshot};
pub use types::{PairReturns, StratumId, TrialOutcome, TrialResult};

//! Constants shared by the estimator.

/// Default deterministic seed for agent and sign randomness.
///
/// The value `0x616971` is "aiq" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x616971;

/// Two-sided 95% quantile of the standard normal distribution.
pub const Z_95: f64 = 1.96;

/// Cumulative stage targets as multiples of the active strata count.
///
/// Small early steps force a few samples into every stratum so the variance
/// estimates settle before the allocator starts to lean on them.
pub const STAGE_MULTIPLIERS: [usize; 22] = [
    0, 3, 6, 10, 20, 30, 50, 70, 100, 250, 500, 750, 1000, 1250, 1500, 1750, 2000, 2500, 3000,
    3500, 4000, 5000,
];

/// Slack added to running share sums before flooring.
///
/// Shares that should add up to a whole number of pairs can land just below
/// it after rounding.
pub const ALLOCATION_FLOOR_EPSILON: f64 = 0.001;

/// Standard deviation assumed for a stratum with too few samples to estimate one.
pub const UNINFORMATIVE_STD: f64 = 1.0;

/// A stratum needs more than this many samples before its variance is trusted.
pub const MIN_SAMPLES_FOR_VARIANCE: usize = 2;

/// Per-stratum half-widths are not reported below this many samples.
pub const MIN_SAMPLES_FOR_HALF_WIDTH: usize = 4;

/// First stage whose global estimate is considered reliable enough to report.
pub const DEFAULT_REPORTING_START_STAGE: usize = 3;

/// Upper bound on the wait for any single outstanding trial, in seconds.
pub const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 100;

/// Fraction of the infinite discounted total a derived episode length covers.
pub const EPISODE_COVERAGE: f64 = 0.95;

/// Coverage below which an explicit episode length is considered too short.
pub const SHORT_EPISODE_COVERAGE: f64 = 0.75;

/// Stratum index reserved for passive programs; never sampled by the stratified estimator.
pub const PASSIVE_STRATUM: usize = 0;

//! Streaming mean and variance using Welford's algorithm.

/// Online accumulator for a single series of returns.
///
/// # Example
///
/// ```
/// use aiq_core::statistics::OnlineStats;
///
/// let mut stats = OnlineStats::new();
/// for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
///     stats.update(x);
/// }
/// assert!((stats.mean() - 3.0).abs() < 1e-10);
/// assert!((stats.variance() - 2.5).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OnlineStats {
    count: usize,
    mean: f64,
    /// Sum of squared deviations from the running mean.
    m2: f64,
}

impl OnlineStats {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value.
    pub fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Number of values seen.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Running mean (0 before the first value).
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance with an n-1 denominator (0 below two values).
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Normal-approximation half-width `z * sd / sqrt(n)`, once there are two values.
    pub fn half_width(&self, z: f64) -> Option<f64> {
        (self.count >= 2).then(|| z * self.std_dev() / (self.count as f64).sqrt())
    }
}

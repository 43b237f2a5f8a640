//! Adaptive Sampling

use tof_core::base::*;
use tof_core::decomposition::*;

/// Outcome of adding a sample to an adaptively sampled pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdaptiveDecision {
    /// Take another sample.
    Continue,

    /// The hard cap on samples was reached.
    StopBudget,

    /// The confidence interval is narrow enough.
    StopConverged,
}

/// Decides when to stop sampling one frame of a pixel.
///
/// Sample luminances are folded into a running mean and variance. Once the nominal budget is spent the half-width of
/// the normal confidence interval of the mean is compared with the relative error target.
#[derive(Clone, Debug)]
pub struct AdaptiveController {
    /// Nominal samples per frame.
    budget: usize,

    /// Stop after this many samples; `None` for no cap.
    cap: Option<f64>,

    /// Target relative error.
    max_error: f64,

    /// Standard normal quantile of the confidence level.
    quantile: f64,

    /// Floor of the error base, a fraction of the average image luminance.
    floor: f64,

    /// Samples taken.
    n: usize,

    /// Running mean.
    mean: f64,

    /// Running sum of squared deviations.
    m2: f64,
}

impl AdaptiveController {
    /// Create a new `AdaptiveController`.
    ///
    /// * `params`           - Adaptive sampling parameters.
    /// * `budget`           - Nominal samples per frame.
    /// * `global_luminance` - Average luminance of the image.
    pub fn new(params: &AdaptiveParams, budget: usize, global_luminance: Float) -> Self {
        let cap = (params.max_sample_factor >= 0.0).then(|| params.max_sample_factor as f64 * budget as f64);
        Self {
            budget,
            cap,
            max_error: params.max_error as f64,
            quantile: normal_quantile(1.0 - params.p_value / 2.0) as f64,
            floor: 0.01 * global_luminance as f64,
            n: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Forgets all samples.
    pub fn reset(&mut self) {
        self.n = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
    }

    /// Adds a sample and decides whether to continue.
    ///
    /// * `luminance` - Luminance of the sample.
    pub fn update(&mut self, luminance: Float) -> AdaptiveDecision {
        let x = luminance as f64;
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);

        if self.cap.map_or(false, |cap| self.n as f64 >= cap) {
            return AdaptiveDecision::StopBudget;
        }
        if self.n >= self.budget && self.n >= 2 {
            let std_error = (self.variance() / self.n as f64).sqrt();
            let half_width = std_error * self.quantile;
            if half_width <= self.max_error * self.mean.max(self.floor) {
                return AdaptiveDecision::StopConverged;
            }
        }
        AdaptiveDecision::Continue
    }

    /// Returns the number of samples taken.
    pub fn sample_count(&self) -> usize {
        self.n
    }

    /// Returns the nominal samples per frame.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Returns the running mean.
    pub fn mean(&self) -> Float {
        self.mean as Float
    }

    /// Returns the unbiased sample variance.
    fn variance(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            self.m2 / (self.n - 1) as f64
        }
    }

    /// Returns the weight of the pixel's new samples relative to the snapshot taken before sampling.
    pub fn blend_factor(&self) -> Float {
        if self.n == 0 {
            1.0
        } else {
            self.budget as Float / self.n as Float
        }
    }
}

// ---- Tests ----

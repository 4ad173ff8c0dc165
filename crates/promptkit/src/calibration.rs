//! Token-estimation accuracy tracking (§4.F): the budgeter estimates tokens
//! at a fixed 4-chars-per-token ratio; this module records how that
//! estimate compares against the provider's actual reported usage so the
//! ratio can optionally be recalibrated.

/// Rolling average of `actual / estimated` ratios, bounded to the most
/// recent `window` samples so a stale estimate from hours ago doesn't
/// outweigh the current provider's behavior.
pub struct EstimationCalibrator {
    window: usize,
    samples: Vec<f64>,
}

impl EstimationCalibrator {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1), samples: Vec::new() }
    }

    /// Record one observation: `estimated_tokens` from the budgeter,
    /// `actual_tokens` reported by the provider for the same prompt.
    pub fn record(&mut self, estimated_tokens: usize, actual_tokens: u32) {
        if estimated_tokens == 0 {
            return;
        }
        let ratio = actual_tokens as f64 / estimated_tokens as f64;
        self.samples.push(ratio);
        if self.samples.len() > self.window {
            self.samples.remove(0);
        }
    }

    /// Mean observed ratio, or `1.0` (no adjustment) with no samples yet.
    pub fn mean_ratio(&self) -> f64 {
        if self.samples.is_empty() {
            return 1.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// A recalibrated chars-per-token ratio, starting from the default 4.0
    /// and adjusted by the observed error.
    pub fn recalibrated_chars_per_token(&self) -> f64 {
        let ratio = self.mean_ratio();
        if ratio <= 0.0 {
            return 4.0;
        }
        4.0 / ratio
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

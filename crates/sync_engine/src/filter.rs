//! First-order low-pass filter over vehicle speed.

use contracts::SpeedFilterConfig;

/// Discrete first-order low-pass filter
///
/// `x += k * (input - x)` with `k = (dt / rc) / (1 + dt / rc)`. Inputs are
/// raised to `floor` before filtering. The first sample initializes the state
/// directly.
#[derive(Debug, Clone)]
pub struct SpeedFilter {
    x: f64,
    k: f64,
    floor: f64,
    initialized: bool,
}

impl SpeedFilter {
    pub fn new(config: &SpeedFilterConfig) -> Self {
        let ratio = if config.time_constant > 0.0 {
            config.dt / config.time_constant
        } else {
            f64::INFINITY
        };
        let k = if ratio.is_finite() {
            ratio / (1.0 + ratio)
        } else {
            1.0
        };

        Self {
            x: config.initial,
            k,
            floor: config.floor,
            initialized: false,
        }
    }

    /// Feed one speed sample (m/s)
    pub fn update(&mut self, sample: f64) {
        let input = sample.max(self.floor);
        if self.initialized {
            self.x += self.k * (input - self.x);
        } else {
            self.x = input;
            self.initialized = true;
        }
    }

    /// Current filtered value
    #[inline]
    pub fn value(&self) -> f64 {
        self.x
    }

    /// Filter gain
    pub fn gain(&self) -> f64 {
        self.k
    }
}

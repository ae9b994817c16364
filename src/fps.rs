//! Rolling frames-per-second meter (display only)

use std::collections::VecDeque;

/// Samples kept in the window
const WINDOW: usize = 45;

/// Mean of the last 45 instantaneous frame rates
#[derive(Debug, Clone, Default)]
pub struct RollingFps {
    last_ms: Option<f64>,
    samples: VecDeque<f64>,
    value: f64,
}

impl RollingFps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a frame timestamp in milliseconds and get the current estimate.
    /// The first call only primes the meter and returns 0.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        let Some(last) = self.last_ms.replace(now_ms) else {
            return 0.0;
        };
        let delta = now_ms - last;
        if delta <= 0.0 {
            return self.value;
        }
        self.samples.push_back(1000.0 / delta);
        if self.samples.len() > WINDOW {
            self.samples.pop_front();
        }
        self.value = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

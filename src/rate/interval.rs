// Adaptive sampling interval with a hysteresis band.

use crate::config::MonitorConfig;
use std::time::Duration;

pub const MIB: f64 = 1024.0 * 1024.0;

/// Switch to the fast interval at or above this rate (bytes/s).
pub const DEFAULT_FAST_THRESHOLD: f64 = 1.1 * MIB;

/// Switch back to the slow interval at or below this rate (bytes/s).
pub const DEFAULT_SLOW_THRESHOLD: f64 = 0.9 * MIB;

pub const DEFAULT_FAST_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_SLOW_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct IntervalController {
    fast: Duration,
    slow: Duration,
    fast_threshold: f64,
    slow_threshold: f64,
    is_fast: bool,
}

impl Default for IntervalController {
    fn default() -> Self {
        Self::new(
            DEFAULT_FAST_INTERVAL,
            DEFAULT_SLOW_INTERVAL,
            DEFAULT_FAST_THRESHOLD,
            DEFAULT_SLOW_THRESHOLD,
        )
    }
}

impl IntervalController {
    /// Starts on the slow interval.
    pub fn new(fast: Duration, slow: Duration, fast_threshold: f64, slow_threshold: f64) -> Self {
        Self {
            fast,
            slow,
            fast_threshold,
            slow_threshold,
            is_fast: false,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            Duration::from_millis(config.fast_interval_ms),
            Duration::from_millis(config.slow_interval_ms),
            config.fast_threshold,
            config.slow_threshold,
        )
    }

    pub fn is_fast(&self) -> bool {
        self.is_fast
    }

    pub fn current(&self) -> Duration {
        if self.is_fast { self.fast } else { self.slow }
    }

    /// Feed the latest smoothed rates. Returns the new interval only when it changes.
    pub fn observe(&mut self, upload: f64, download: f64) -> Option<Duration> {
        let max_rate = upload.max(download);
        if self.is_fast {
            if max_rate <= self.slow_threshold {
                self.is_fast = false;
                return Some(self.slow);
            }
        } else if max_rate >= self.fast_threshold {
            self.is_fast = true;
            return Some(self.fast);
        }
        None
    }
}

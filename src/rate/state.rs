// Monitor state: counter deltas, sliding rate windows, magnitude-dependent smoothing.

use crate::models::{InterfaceSnapshotMap, Scope};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept per direction.
pub const WINDOW_CAPACITY: usize = 5;

/// At or above this instantaneous rate (bytes/s) only the latest sample is reported.
pub const HIGH_RATE_THRESHOLD: f64 = 1_048_576.0;

const HIGH_RATE_WINDOW: usize = 1;
const LOW_RATE_WINDOW: usize = 3;

/// Bytes moved between two readings of a cumulative counter. A decrease means the
/// counter reset, so the new value is taken as traffic since the reset.
pub fn counter_delta(prev: u64, curr: u64) -> u64 {
    if curr >= prev { curr - prev } else { curr }
}

/// What a refresh did to the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshOutcome {
    /// First sample captured; no rate yet.
    Baseline,
    /// Elapsed time was not positive; nothing changed.
    ClockAnomaly,
    /// No interface matched the scope; rates and windows reset to zero.
    NoSignal,
    Updated { upload: f64, download: f64 },
}

/// Bounded history of instantaneous rates for one direction.
#[derive(Debug, Clone)]
pub struct RateWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }
}

impl RateWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean of the newest 1 sample when `latest` is a high rate, else of the newest 3.
    pub fn smoothed(&self, latest: f64) -> f64 {
        let wanted = if latest >= HIGH_RATE_THRESHOLD {
            HIGH_RATE_WINDOW
        } else {
            LOW_RATE_WINDOW
        };
        let n = wanted.min(self.samples.len());
        if n == 0 {
            return 0.0;
        }
        self.samples.iter().rev().take(n).sum::<f64>() / n as f64
    }
}

#[derive(Debug, Default)]
pub struct MonitorState {
    previous_snapshot: InterfaceSnapshotMap,
    last_sample_time: Option<Instant>,
    upload_window: RateWindow,
    download_window: RateWindow,
    current_upload: f64,
    current_download: f64,
    scope: Scope,
}

impl MonitorState {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.last_sample_time.is_some()
    }

    pub fn current_upload(&self) -> f64 {
        self.current_upload
    }

    pub fn current_download(&self) -> f64 {
        self.current_download
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }

    pub fn upload_window(&self) -> &RateWindow {
        &self.upload_window
    }

    pub fn download_window(&self) -> &RateWindow {
        &self.download_window
    }

    /// Positive time since the last sample, or None when the clock did not advance.
    fn elapsed(&self, now: Instant) -> Option<Duration> {
        let last = self.last_sample_time?;
        now.checked_duration_since(last).filter(|d| !d.is_zero())
    }

    /// True once initialized when `now` is not after the last sample.
    pub(crate) fn clock_stalled(&self, now: Instant) -> bool {
        self.is_initialized() && self.elapsed(now).is_none()
    }

    /// The primary interface is only consulted for a rate, never for the baseline.
    pub(crate) fn wants_primary(&self) -> bool {
        self.scope == Scope::Primary && self.is_initialized()
    }

    /// Fold one snapshot taken at `now` into the state.
    pub fn apply(
        &mut self,
        snapshot: InterfaceSnapshotMap,
        primary: Option<&str>,
        fallback_prefixes: &[String],
        now: Instant,
    ) -> RefreshOutcome {
        if !self.is_initialized() {
            self.previous_snapshot = snapshot;
            self.last_sample_time = Some(now);
            return RefreshOutcome::Baseline;
        }
        let Some(elapsed) = self.elapsed(now) else {
            return RefreshOutcome::ClockAnomaly;
        };

        let mut up_delta: u64 = 0;
        let mut down_delta: u64 = 0;
        let mut considered = 0usize;
        for (name, curr) in &snapshot {
            if !self.scope.includes(name, primary, fallback_prefixes) {
                continue;
            }
            let (prev_tx, prev_rx) = self
                .previous_snapshot
                .get(name)
                .map_or((0, 0), |p| (p.tx_bytes, p.rx_bytes));
            up_delta = up_delta.wrapping_add(counter_delta(prev_tx, curr.tx_bytes));
            down_delta = down_delta.wrapping_add(counter_delta(prev_rx, curr.rx_bytes));
            considered += 1;
        }

        self.previous_snapshot = snapshot;
        self.last_sample_time = Some(now);

        if considered == 0 {
            self.upload_window.clear();
            self.download_window.clear();
            self.current_upload = 0.0;
            self.current_download = 0.0;
            return RefreshOutcome::NoSignal;
        }

        let secs = elapsed.as_secs_f64();
        let new_up = (up_delta as f64 / secs).max(0.0);
        let new_down = (down_delta as f64 / secs).max(0.0);

        self.upload_window.push(new_up);
        self.download_window.push(new_down);
        self.current_upload = self.upload_window.smoothed(new_up);
        self.current_download = self.download_window.smoothed(new_down);

        RefreshOutcome::Updated {
            upload: self.current_upload,
            download: self.current_download,
        }
    }
}

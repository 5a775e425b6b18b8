// Per-process traffic models

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One raw row of the traffic-accounting tool: cumulative bytes since the tool's epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub pid: i32,
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Bytes a process moved during the most recent poll interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessUsage {
    pub pid: i32,
    pub name: String,
    pub rx_delta: u64,
    pub tx_delta: u64,
}

impl ProcessUsage {
    pub fn total(&self) -> u64 {
        self.rx_delta.saturating_add(self.tx_delta)
    }
}

/// One poll's ranked consumers and the wall time their deltas span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessPoll {
    pub rows: Vec<ProcessUsage>,
    /// Time since the previous applied poll; `None` for a baseline.
    pub elapsed: Option<Duration>,
}

impl ProcessPoll {
    /// Scale a per-poll byte count to bytes per second over the measured span.
    pub fn per_second(&self, bytes: u64) -> f64 {
        match self.elapsed {
            Some(d) if !d.is_zero() => bytes as f64 / d.as_secs_f64(),
            _ => 0.0,
        }
    }
}

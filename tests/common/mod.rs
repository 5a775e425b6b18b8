// Shared test helpers: scripted sources standing in for the OS and the traffic tool

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use netspeed::accounting::AccountingSource;
use netspeed::counters::{CounterSource, RouteSource};
use netspeed::error::SourceError;
use netspeed::models::*;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn snapshot(entries: &[(&str, u64, u64)]) -> InterfaceSnapshotMap {
    entries
        .iter()
        .map(|(name, tx, rx)| {
            (
                name.to_string(),
                InterfaceCounters {
                    name: name.to_string(),
                    tx_bytes: *tx,
                    rx_bytes: *rx,
                },
            )
        })
        .collect()
}

pub fn record(pid: i32, name: &str, rx: u64, tx: u64) -> ProcessRecord {
    ProcessRecord {
        pid,
        name: name.to_string(),
        rx_bytes: rx,
        tx_bytes: tx,
    }
}

/// Hands out queued snapshots in order, repeating the last one when drained.
pub struct ScriptedCounters {
    queue: Mutex<VecDeque<InterfaceSnapshotMap>>,
    last: Mutex<InterfaceSnapshotMap>,
}

impl ScriptedCounters {
    pub fn new(snapshots: Vec<InterfaceSnapshotMap>) -> Self {
        Self {
            queue: Mutex::new(snapshots.into()),
            last: Mutex::new(InterfaceSnapshotMap::new()),
        }
    }
}

impl CounterSource for ScriptedCounters {
    fn snapshot(&self) -> Result<InterfaceSnapshotMap, SourceError> {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.queue.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

/// Every call adds `step` bytes to both counters of one interface.
pub struct GrowingCounters {
    name: String,
    step: u64,
    calls: AtomicUsize,
}

impl GrowingCounters {
    pub fn new(name: &str, step: u64) -> Self {
        Self {
            name: name.to_string(),
            step,
            calls: AtomicUsize::new(0),
        }
    }
}

impl CounterSource for GrowingCounters {
    fn snapshot(&self) -> Result<InterfaceSnapshotMap, SourceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
        let total = n * self.step;
        Ok(snapshot(&[(self.name.as_str(), total, total)]))
    }
}

pub struct FailingCounters;

impl CounterSource for FailingCounters {
    fn snapshot(&self) -> Result<InterfaceSnapshotMap, SourceError> {
        Err(SourceError::unavailable("getifaddrs: simulated"))
    }
}

pub struct FixedRoute(pub Option<&'static str>);

impl RouteSource for FixedRoute {
    fn primary_interface(&self) -> Option<String> {
        self.0.map(String::from)
    }
}

/// Resolves a fixed interface after blocking the calling thread for `delay`.
pub struct SlowRoute {
    pub name: &'static str,
    pub delay: Duration,
}

impl RouteSource for SlowRoute {
    fn primary_interface(&self) -> Option<String> {
        std::thread::sleep(self.delay);
        Some(self.name.to_string())
    }
}

/// Hands out queued process snapshots, then empty ones. Optionally sleeps per call.
pub struct ScriptedAccounting {
    queue: Mutex<VecDeque<Vec<ProcessRecord>>>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedAccounting {
    pub fn new(snapshots: Vec<Vec<ProcessRecord>>) -> Self {
        Self::with_delay(snapshots, Duration::ZERO)
    }

    pub fn with_delay(snapshots: Vec<Vec<ProcessRecord>>, delay: Duration) -> Self {
        Self {
            queue: Mutex::new(snapshots.into()),
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

impl AccountingSource for ScriptedAccounting {
    fn snapshot(&self) -> BoxFuture<'_, Result<Vec<ProcessRecord>, SourceError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.queue.lock().unwrap().pop_front().unwrap_or_default())
        })
    }
}

/// One process whose counters grow by `step` on every call.
pub struct GrowingAccounting {
    step: u64,
    calls: AtomicUsize,
}

impl GrowingAccounting {
    pub fn new(step: u64) -> Self {
        Self {
            step,
            calls: AtomicUsize::new(0),
        }
    }
}

impl AccountingSource for GrowingAccounting {
    fn snapshot(&self) -> BoxFuture<'_, Result<Vec<ProcessRecord>, SourceError>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
            Ok(vec![record(42, "curl", n * self.step, 0)])
        })
    }
}

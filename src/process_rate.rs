// Process rate engine: per-process deltas across polls, stale-pid eviction, top-N ranking.

use crate::accounting::AccountingSource;
use crate::models::{ProcessPoll, ProcessRecord, ProcessUsage};
use crate::rate::counter_delta;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::instrument;

/// Last-seen cumulative (rx, tx) per pid.
#[derive(Debug, Default)]
pub struct ProcessTracker {
    totals: HashMap<i32, (u64, u64)>,
    last_poll: Option<Instant>,
    generation: u64,
}

impl ProcessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every baseline, e.g. when a new observation session begins.
    pub fn reset(&mut self) {
        self.totals.clear();
        self.last_poll = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Bumped by every [`ProcessTracker::reset`]; a snapshot taken under an older
    /// generation belongs to a previous session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn totals(&self, pid: i32) -> Option<(u64, u64)> {
        self.totals.get(&pid).copied()
    }

    /// [`ProcessTracker::apply_at`] stamped with the current time, rows only.
    pub fn apply(&mut self, records: Vec<ProcessRecord>, limit: usize) -> Vec<ProcessUsage> {
        self.apply_at(records, limit, Instant::now()).rows
    }

    /// Fold one raw snapshot taken at `taken_at` and return up to `limit` consumers,
    /// busiest first. A pid seen for the first time only establishes its baseline.
    pub fn apply_at(
        &mut self,
        records: Vec<ProcessRecord>,
        limit: usize,
        taken_at: Instant,
    ) -> ProcessPoll {
        let elapsed = self
            .last_poll
            .and_then(|last| taken_at.checked_duration_since(last));
        self.last_poll = Some(taken_at);

        let records = merge_by_pid(records);
        let seen: HashSet<i32> = records.iter().map(|r| r.pid).collect();

        let mut usage = Vec::with_capacity(records.len());
        for record in records {
            let (rx_delta, tx_delta) = match self.totals.get(&record.pid) {
                Some(&(prev_rx, prev_tx)) => (
                    counter_delta(prev_rx, record.rx_bytes),
                    counter_delta(prev_tx, record.tx_bytes),
                ),
                None => (0, 0),
            };
            self.totals
                .insert(record.pid, (record.rx_bytes, record.tx_bytes));
            usage.push(ProcessUsage {
                pid: record.pid,
                name: record.name,
                rx_delta,
                tx_delta,
            });
        }
        self.totals.retain(|pid, _| seen.contains(pid));

        usage.retain(|u| u.total() > 0);
        // sort_by is stable: equal totals keep report order
        usage.sort_by(|a, b| b.total().cmp(&a.total()));
        usage.truncate(limit);
        ProcessPoll {
            rows: usage,
            elapsed,
        }
    }
}

/// Sum rows that share a pid (per-socket output), keeping first-seen order.
fn merge_by_pid(records: Vec<ProcessRecord>) -> Vec<ProcessRecord> {
    let mut index: HashMap<i32, usize> = HashMap::with_capacity(records.len());
    let mut merged: Vec<ProcessRecord> = Vec::with_capacity(records.len());
    for record in records {
        match index.get(&record.pid) {
            Some(&i) => {
                let existing = &mut merged[i];
                existing.rx_bytes = existing.rx_bytes.saturating_add(record.rx_bytes);
                existing.tx_bytes = existing.tx_bytes.saturating_add(record.tx_bytes);
            }
            None => {
                index.insert(record.pid, merged.len());
                merged.push(record);
            }
        }
    }
    merged
}

pub struct ProcessRateEngine {
    source: Arc<dyn AccountingSource>,
    tracker: Mutex<ProcessTracker>,
}

impl ProcessRateEngine {
    pub fn new(source: Arc<dyn AccountingSource>) -> Self {
        Self {
            source,
            tracker: Mutex::new(ProcessTracker::new()),
        }
    }

    pub async fn compute_top_consumers(&self, limit: usize) -> Vec<ProcessUsage> {
        self.poll(limit).await.rows
    }

    /// Snapshot the source and fold it. A snapshot that straddles a
    /// [`ProcessRateEngine::reset`] is discarded so it cannot seed the new baselines.
    #[instrument(skip(self), fields(engine = "process", operation = "process_poll"))]
    pub async fn poll(&self, limit: usize) -> ProcessPoll {
        let generation = self.tracker.lock().await.generation();
        let records = self.source.snapshot_or_empty().await;
        let taken_at = Instant::now();
        let mut tracker = self.tracker.lock().await;
        if tracker.generation() != generation {
            tracing::debug!("tracker reset during snapshot; poll discarded");
            return ProcessPoll::default();
        }
        tracker.apply_at(records, limit, taken_at)
    }

    pub async fn reset(&self) {
        self.tracker.lock().await.reset();
    }

    /// Number of pids with a stored baseline.
    pub async fn tracked(&self) -> usize {
        self.tracker.lock().await.len()
    }
}

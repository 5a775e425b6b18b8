// Polling loops: the always-on interface loop and the on-demand process session.
// Loop tasks own the timers; snapshot work runs on blocking workers or spawned tasks.

use crate::models::{ProcessPoll, RateUpdate};
use crate::process_rate::ProcessRateEngine;
use crate::rate::{IntervalController, RateMonitor, RefreshOutcome};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, interval_at};
use tracing::Instrument;

/// Shared handles and channels for the interface loop.
pub struct InterfaceLoopDeps {
    pub monitor: Arc<RateMonitor>,
    pub updates_tx: watch::Sender<RateUpdate>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct InterfaceLoopConfig {
    pub controller: IntervalController,
    /// How often to log monitor stats (real seconds).
    pub stats_log_interval_secs: u64,
}

fn ticker(period: Duration, start: Instant) -> Interval {
    let mut tick = interval_at(start, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tick
}

/// Spawns the interface loop. The first tick fires immediately and captures the
/// baseline; each later tick refreshes, feeds the interval controller and publishes
/// a [`RateUpdate`]. An interval switch rebuilds the timer.
pub fn spawn_interface_loop(deps: InterfaceLoopDeps, config: InterfaceLoopConfig) -> JoinHandle<()> {
    let InterfaceLoopDeps {
        monitor,
        updates_tx,
        mut shutdown_rx,
    } = deps;
    let InterfaceLoopConfig {
        mut controller,
        stats_log_interval_secs,
    } = config;

    tokio::spawn(async move {
        let mut tick = ticker(controller.current(), Instant::now());
        let stats_log_interval = Duration::from_secs(stats_log_interval_secs);
        let mut stats_log_tick = ticker(stats_log_interval, Instant::now() + stats_log_interval);

        let mut refreshes_total: u64 = 0;
        let mut no_signal_total: u64 = 0;
        let mut interval_switches_total: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let outcome = match monitor.refresh().await {
                        Ok(o) => o,
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "refresh", "interface refresh failed");
                            continue;
                        }
                    };
                    refreshes_total += 1;
                    match outcome {
                        RefreshOutcome::Baseline => {
                            tracing::debug!(operation = "refresh", "baseline captured");
                            continue;
                        }
                        RefreshOutcome::ClockAnomaly => {
                            tracing::debug!(operation = "refresh", "clock did not advance; sample skipped");
                            continue;
                        }
                        RefreshOutcome::NoSignal => {
                            no_signal_total += 1;
                            tracing::debug!(operation = "refresh", "no interface in scope");
                        }
                        RefreshOutcome::Updated { .. } => {}
                    }

                    let upload = monitor.current_upload();
                    let download = monitor.current_download();
                    if let Some(next) = controller.observe(upload, download) {
                        interval_switches_total += 1;
                        tracing::debug!(
                            interval_ms = next.as_millis() as u64,
                            fast = controller.is_fast(),
                            "sampling interval switched"
                        );
                        tick = ticker(next, Instant::now() + next);
                    }
                    updates_tx.send_replace(RateUpdate {
                        upload,
                        download,
                        interval_ms: controller.current().as_millis() as u64,
                    });
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Interface loop shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        refreshes_total,
                        no_signal_total,
                        interval_switches_total,
                        fast_interval = controller.is_fast(),
                        subscribers = updates_tx.receiver_count(),
                        "monitor stats"
                    );
                }
            }
        }
    })
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessSessionConfig {
    pub interval: Duration,
    pub limit: usize,
}

/// An open per-process observation. Polls until stopped or dropped; results go to
/// the consumer channel from the session's loop task.
pub struct ProcessSession {
    handle: JoinHandle<()>,
}

impl ProcessSession {
    /// Clears the engine's baselines, then starts polling on `config.interval`.
    pub async fn start(
        engine: Arc<ProcessRateEngine>,
        config: ProcessSessionConfig,
        results_tx: mpsc::Sender<ProcessPoll>,
    ) -> Self {
        engine.reset().await;
        let span = tracing::debug_span!(
            "process_session",
            interval_ms = config.interval.as_millis() as u64,
            limit = config.limit
        );
        let handle = tokio::spawn(run_process_loop(engine, config, results_tx).instrument(span));
        Self { handle }
    }

    /// Cancel the timer. A poll already running completes but its rows are dropped,
    /// and the next session's reset keeps it from touching the baselines.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_process_loop(
    engine: Arc<ProcessRateEngine>,
    config: ProcessSessionConfig,
    results_tx: mpsc::Sender<ProcessPoll>,
) {
    let in_flight = Arc::new(AtomicBool::new(false));
    let (done_tx, mut done_rx) = mpsc::channel::<ProcessPoll>(1);
    let mut tick = ticker(config.interval, Instant::now());
    let mut skipped_ticks_total: u64 = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if in_flight.swap(true, Ordering::AcqRel) {
                    skipped_ticks_total += 1;
                    tracing::debug!(skipped_ticks_total, "process poll still running; tick dropped");
                    continue;
                }
                let engine = engine.clone();
                let in_flight = in_flight.clone();
                let done_tx = done_tx.clone();
                let limit = config.limit;
                tokio::spawn(async move {
                    let poll = engine.poll(limit).await;
                    in_flight.store(false, Ordering::Release);
                    // receiver is gone once the session stops
                    let _ = done_tx.send(poll).await;
                });
            }
            Some(poll) = done_rx.recv() => {
                match results_tx.try_send(poll) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::debug!("process consumer is behind; rows dropped");
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!("process consumer gone; session ending");
                        break;
                    }
                }
            }
        }
    }
}

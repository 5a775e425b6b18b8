// Interface rate engine: smoothed upload/download rates behind a reader/writer lock.

mod interval;
mod state;

pub use interval::{
    DEFAULT_FAST_INTERVAL, DEFAULT_FAST_THRESHOLD, DEFAULT_SLOW_INTERVAL, DEFAULT_SLOW_THRESHOLD,
    IntervalController, MIB,
};
pub use state::{
    HIGH_RATE_THRESHOLD, MonitorState, RateWindow, RefreshOutcome, WINDOW_CAPACITY, counter_delta,
};

use crate::counters::{CounterSource, RouteSource};
use crate::models::Scope;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::{instrument, warn};

pub struct RateMonitor {
    state: Arc<RwLock<MonitorState>>,
    counters: Arc<dyn CounterSource>,
    routes: Arc<dyn RouteSource>,
    fallback_prefixes: Arc<[String]>,
}

impl RateMonitor {
    pub fn new(
        counters: Arc<dyn CounterSource>,
        routes: Arc<dyn RouteSource>,
        scope: Scope,
        fallback_prefixes: Vec<String>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(MonitorState::new(scope))),
            counters,
            routes,
            fallback_prefixes: fallback_prefixes.into(),
        }
    }

    // A writer that panicked mid-refresh leaves plain numbers behind; keep serving them.
    fn read(&self) -> RwLockReadGuard<'_, MonitorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MonitorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_upload(&self) -> f64 {
        self.read().current_upload()
    }

    pub fn current_download(&self) -> f64 {
        self.read().current_download()
    }

    pub fn scope(&self) -> Scope {
        self.read().scope()
    }

    /// Takes effect on the next refresh.
    pub fn set_scope(&self, scope: Scope) {
        self.write().set_scope(scope);
    }

    /// Snapshot and fold new counters on a blocking worker. OS queries run before
    /// the write lock is taken, so readers only wait for the fold itself.
    #[instrument(skip(self), fields(engine = "rate", operation = "refresh"))]
    pub async fn refresh(&self) -> anyhow::Result<RefreshOutcome> {
        let state = self.state.clone();
        let counters = self.counters.clone();
        let routes = self.routes.clone();
        let prefixes = self.fallback_prefixes.clone();
        tokio::task::spawn_blocking(move || {
            refresh_shared(&state, counters.as_ref(), routes.as_ref(), &prefixes)
        })
        .await
        .map_err(|e| anyhow::anyhow!("rate refresh task join: {}", e))
    }

    /// Callback flavour of [`RateMonitor::refresh`]: `on_complete` runs once the new
    /// rates are visible to readers.
    pub fn refresh_with<F>(self: &Arc<Self>, on_complete: F) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(RefreshOutcome) + Send + 'static,
    {
        let monitor = self.clone();
        tokio::spawn(async move {
            match monitor.refresh().await {
                Ok(outcome) => on_complete(outcome),
                Err(e) => warn!(error = %e, operation = "refresh", "rate refresh failed"),
            }
        })
    }
}

/// Clock check under a read lock, then the counter and route queries with no lock
/// held, then the fold under the write lock.
fn refresh_shared(
    state: &RwLock<MonitorState>,
    counters: &dyn CounterSource,
    routes: &dyn RouteSource,
    fallback_prefixes: &[String],
) -> RefreshOutcome {
    let wants_primary = {
        let guard = state.read().unwrap_or_else(PoisonError::into_inner);
        if guard.clock_stalled(Instant::now()) {
            return RefreshOutcome::ClockAnomaly;
        }
        guard.wants_primary()
    };
    let primary = if wants_primary {
        routes.primary_interface()
    } else {
        None
    };
    let snapshot = counters.snapshot_or_empty();
    let now = Instant::now();
    state
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .apply(snapshot, primary.as_deref(), fallback_prefixes, now)
}

// Per-process traffic accounting via an external tool (nettop-style CSV report).

mod parse;

pub use parse::{parse_line, parse_report};

use crate::config::ProcessConfig;
use crate::error::SourceError;
use crate::models::ProcessRecord;
use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{Instrument, debug_span, warn};

/// One sampling instant of per-process cumulative counters.
pub trait AccountingSource: Send + Sync {
    fn snapshot(&self) -> BoxFuture<'_, Result<Vec<ProcessRecord>, SourceError>>;

    /// Fail-soft variant: a failed invocation logs and yields no records.
    fn snapshot_or_empty(&self) -> BoxFuture<'_, Vec<ProcessRecord>> {
        Box::pin(async move {
            match self.snapshot().await {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, operation = "accounting_snapshot", "process accounting failed");
                    Vec::new()
                }
            }
        })
    }
}

pub struct NettopSource {
    candidates: Vec<PathBuf>,
    args: Vec<String>,
    timeout: Duration,
}

impl NettopSource {
    pub fn new(candidates: Vec<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            candidates,
            args,
            timeout,
        }
    }

    pub fn from_config(config: &ProcessConfig) -> Self {
        Self::new(
            config.tool_candidates.iter().map(PathBuf::from).collect(),
            config.tool_args.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// First candidate that exists on disk.
    pub fn resolve_binary(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.is_file())
    }

    /// Run the tool once and return its stdout. The child is killed if it outlives
    /// the timeout.
    async fn run(&self) -> Result<String, SourceError> {
        let binary = self.resolve_binary().ok_or_else(|| {
            SourceError::unavailable(format!("no traffic tool among {:?}", self.candidates))
        })?;
        let child = Command::new(binary)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::unavailable(format!("spawn {}: {}", binary.display(), e)))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(SourceError::unavailable(format!(
                    "wait {}: {}",
                    binary.display(),
                    e
                )));
            }
            Err(_) => {
                return Err(SourceError::unavailable(format!(
                    "{} did not exit within {:?}",
                    binary.display(),
                    self.timeout
                )));
            }
        };

        if !output.status.success() && output.stdout.is_empty() {
            return Err(SourceError::unavailable(format!(
                "{} exited with {}",
                binary.display(),
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl AccountingSource for NettopSource {
    fn snapshot(&self) -> BoxFuture<'_, Result<Vec<ProcessRecord>, SourceError>> {
        let span = debug_span!("accounting_snapshot", source = "nettop");
        Box::pin(
            async move {
                let report = self.run().await?;
                Ok(parse_report(&report))
            }
            .instrument(span),
        )
    }
}

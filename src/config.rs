use crate::display::DisplayMode;
use crate::models::Scope;
use crate::rate::{DEFAULT_FAST_THRESHOLD, DEFAULT_SLOW_THRESHOLD};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub process: ProcessConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub scope: Scope,
    /// Name prefixes that count as primary when no default route resolves.
    pub fallback_prefixes: Vec<String>,
    pub slow_interval_ms: u64,
    pub fast_interval_ms: u64,
    /// Bytes/s at or above which sampling switches to the fast interval.
    pub fast_threshold: f64,
    /// Bytes/s at or below which sampling returns to the slow interval.
    pub slow_threshold: f64,
    /// How often to log monitor stats at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scope: Scope::Primary,
            fallback_prefixes: ["en", "eth", "wl", "pdp"].map(String::from).to_vec(),
            slow_interval_ms: 1000,
            fast_interval_ms: 500,
            fast_threshold: DEFAULT_FAST_THRESHOLD,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            stats_log_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Open a per-process session at startup.
    pub enabled: bool,
    pub interval_ms: u64,
    pub limit: usize,
    /// Tool locations tried in order; the first existing file wins.
    pub tool_candidates: Vec<String>,
    pub tool_args: Vec<String>,
    /// Bounded wait on the tool before it is killed.
    pub timeout_ms: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 2000,
            limit: 10,
            tool_candidates: ["/usr/bin/nettop", "/usr/sbin/nettop"]
                .map(String::from)
                .to_vec(),
            tool_args: ["-P", "-L", "1", "-x", "-J", "bytes_in,bytes_out"]
                .map(String::from)
                .to_vec(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub mode: DisplayMode,
    /// Prefix each rate with its arrow. Off unless enabled.
    pub show_icons: bool,
}

impl AppConfig {
    /// Read `CONFIG_FILE` (default `config.toml`). A missing default file means
    /// built-in defaults; a missing explicit file is an error.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_path(&path),
            Err(_) if !Path::new(DEFAULT_CONFIG_PATH).exists() => {
                tracing::info!(path = DEFAULT_CONFIG_PATH, "no config file; using defaults");
                Ok(Self::default())
            }
            Err(_) => Self::load_from_path(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let m = &self.monitor;
        anyhow::ensure!(
            m.slow_interval_ms > 0,
            "monitor.slow_interval_ms must be > 0, got {}",
            m.slow_interval_ms
        );
        anyhow::ensure!(
            m.fast_interval_ms > 0,
            "monitor.fast_interval_ms must be > 0, got {}",
            m.fast_interval_ms
        );
        anyhow::ensure!(
            m.fast_interval_ms < m.slow_interval_ms,
            "monitor.fast_interval_ms ({}) must be shorter than monitor.slow_interval_ms ({})",
            m.fast_interval_ms,
            m.slow_interval_ms
        );
        anyhow::ensure!(
            m.slow_threshold >= 0.0 && m.slow_threshold < m.fast_threshold,
            "monitor.slow_threshold ({}) must be >= 0 and below monitor.fast_threshold ({})",
            m.slow_threshold,
            m.fast_threshold
        );
        anyhow::ensure!(
            m.stats_log_interval_secs > 0,
            "monitor.stats_log_interval_secs must be > 0, got {}",
            m.stats_log_interval_secs
        );

        let p = &self.process;
        anyhow::ensure!(
            p.interval_ms > 0,
            "process.interval_ms must be > 0, got {}",
            p.interval_ms
        );
        anyhow::ensure!(p.limit > 0, "process.limit must be > 0, got {}", p.limit);
        anyhow::ensure!(
            p.timeout_ms > 0,
            "process.timeout_ms must be > 0, got {}",
            p.timeout_ms
        );
        anyhow::ensure!(
            !p.tool_candidates.is_empty(),
            "process.tool_candidates must be non-empty"
        );
        Ok(())
    }
}

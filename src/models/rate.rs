// Rate notification pushed to consumers after each refresh

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateUpdate {
    /// Smoothed upload rate in bytes per second.
    pub upload: f64,
    /// Smoothed download rate in bytes per second.
    pub download: f64,
    /// Sampling interval in effect after this refresh.
    pub interval_ms: u64,
}

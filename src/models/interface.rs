// Network interface counter models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cumulative byte counters of one interface, valid until the adapter resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceCounters {
    pub name: String,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
}

/// Counters of every live interface, captured at one instant.
pub type InterfaceSnapshotMap = HashMap<String, InterfaceCounters>;

/// Which interfaces feed the aggregate rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The default-route interface, or a name-prefix guess when none resolves.
    #[default]
    Primary,
    /// Every non-loopback interface.
    All,
}

impl Scope {
    pub fn includes(&self, name: &str, primary: Option<&str>, fallback_prefixes: &[String]) -> bool {
        if is_loopback(name) {
            return false;
        }
        match self {
            Scope::Primary => match primary {
                Some(p) => name == p,
                None => fallback_prefixes
                    .iter()
                    .any(|prefix| name.starts_with(prefix.as_str())),
            },
            Scope::All => true,
        }
    }
}

pub fn is_loopback(name: &str) -> bool {
    name == "lo" || name == "lo0"
}

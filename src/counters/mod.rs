// Interface byte counters via sysinfo, filtered by getifaddrs link flags

mod linux;
mod macos;

use crate::error::SourceError;
use crate::models::{InterfaceCounters, InterfaceSnapshotMap, is_loopback};
use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::Mutex;
use sysinfo::Networks;
use tracing::{instrument, warn};

pub use linux::{parse_ipv6_route, parse_proc_net_route};
pub use macos::parse_route_get;

/// Reads raw cumulative per-interface counters at one instant.
pub trait CounterSource: Send + Sync {
    /// Live, non-loopback interfaces only. `Err` means the OS query itself failed,
    /// which is distinct from an empty map (no interface up).
    fn snapshot(&self) -> Result<InterfaceSnapshotMap, SourceError>;

    /// Fail-soft variant: a failed query logs and yields no interfaces.
    fn snapshot_or_empty(&self) -> InterfaceSnapshotMap {
        match self.snapshot() {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, operation = "interface_snapshot", "interface snapshot failed");
                InterfaceSnapshotMap::new()
            }
        }
    }
}

/// Resolves the interface the OS currently routes outbound traffic through.
pub trait RouteSource: Send + Sync {
    fn primary_interface(&self) -> Option<String>;
}

pub struct SystemCounterSource {
    networks: Mutex<Networks>,
}

impl Default for SystemCounterSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCounterSource {
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }
}

impl CounterSource for SystemCounterSource {
    #[instrument(skip(self), fields(source = "sysinfo", operation = "interface_snapshot"))]
    fn snapshot(&self) -> Result<InterfaceSnapshotMap, SourceError> {
        let flags = link_flags()?;
        let mut networks = self
            .networks
            .lock()
            .map_err(|e| SourceError::unavailable(format!("sysinfo networks lock poisoned: {}", e)))?;
        networks.refresh(true);
        let counters = networks
            .list()
            .iter()
            .map(|(name, data)| (name.as_str(), data.total_transmitted(), data.total_received()));
        Ok(filter_live(counters, &flags))
    }
}

const LIVE_FLAGS: u32 = (libc::IFF_UP | libc::IFF_RUNNING) as u32;

/// Keeps interfaces that are up, running and not loopback. An interface with no
/// flag entry is treated as down.
pub fn filter_live<'a>(
    counters: impl IntoIterator<Item = (&'a str, u64, u64)>,
    flags: &HashMap<String, u32>,
) -> InterfaceSnapshotMap {
    counters
        .into_iter()
        .filter(|(name, _, _)| {
            let Some(&f) = flags.get(*name) else {
                return false;
            };
            !is_loopback(name) && (f & libc::IFF_LOOPBACK as u32) == 0 && (f & LIVE_FLAGS) == LIVE_FLAGS
        })
        .map(|(name, tx_bytes, rx_bytes)| {
            (
                name.to_string(),
                InterfaceCounters {
                    name: name.to_string(),
                    tx_bytes,
                    rx_bytes,
                },
            )
        })
        .collect()
}

/// Interface name -> OR of `ifa_flags` over all its address entries.
fn link_flags() -> Result<HashMap<String, u32>, SourceError> {
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: getifaddrs only writes the list head on success.
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(SourceError::unavailable(format!(
            "getifaddrs: {}",
            std::io::Error::last_os_error()
        )));
    }

    let mut flags = HashMap::new();
    let mut cursor = head;
    while !cursor.is_null() {
        // SAFETY: cursor walks the list returned by getifaddrs, freed below.
        let entry = unsafe { &*cursor };
        if !entry.ifa_name.is_null() {
            // SAFETY: ifa_name is a NUL-terminated string owned by the list.
            let name = unsafe { CStr::from_ptr(entry.ifa_name) }
                .to_string_lossy()
                .into_owned();
            *flags.entry(name).or_insert(0u32) |= entry.ifa_flags as u32;
        }
        cursor = entry.ifa_next;
    }
    // SAFETY: head came from a successful getifaddrs and is freed once.
    unsafe { libc::freeifaddrs(head) };
    Ok(flags)
}

/// Default-route lookup: /proc on Linux, `route -n get` on macOS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRouteSource;

impl RouteSource for SystemRouteSource {
    #[instrument(skip(self), fields(source = "route", operation = "primary_interface"))]
    fn primary_interface(&self) -> Option<String> {
        linux::default_route_interface()
            .or_else(linux::default_route6_interface)
            .or_else(macos::default_route_interface)
    }
}

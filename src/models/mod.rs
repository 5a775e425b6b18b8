// Domain models

mod interface;
mod process;
mod rate;

pub use interface::{InterfaceCounters, InterfaceSnapshotMap, Scope, is_loopback};
pub use process::{ProcessPoll, ProcessRecord, ProcessUsage};
pub use rate::RateUpdate;

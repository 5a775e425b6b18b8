// Library for tests and the terminal consumer to access modules

pub mod accounting;
pub mod config;
pub mod counters;
pub mod display;
pub mod error;
pub mod models;
pub mod process_rate;
pub mod rate;
pub mod version;
pub mod worker;

// Build-time identity from Cargo.toml

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");

/// "name version", logged once at startup.
pub fn banner() -> String {
    format!("{} {}", NAME, VERSION)
}

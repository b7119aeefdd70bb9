#![forbid(unsafe_code)]
#![warn(
    clippy::cargo,
    clippy::suspicious,
    // missing_docs,
    clippy::nursery,
    rust_2018_idioms
)]

pub mod catalog;
pub mod client;
pub mod metrics;
pub mod poll;
pub mod prometheus_api;
pub mod salt;
pub mod scenario;
pub mod settings;
pub mod suite;
pub mod telemetry;

pub type Result<T> = anyhow::Result<T>;

/// The portion of a fully qualified minion id before the first `.`.
pub fn short_hostname(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, Opts};

mod context;
mod error;
mod model;

pub use context::{SaltContext, SaltCredentials};
pub use error::SaltError;
pub use model::{Selector, CMD_RUN, PILLAR_GET, TEST_PING};

/// Topology queries and remote execution against the managed fleet.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FleetControl: fmt::Debug + Send + Sync {
    /// Fully qualified ids of the responsive minions matching `selector`, sorted.
    async fn select(&self, selector: &Selector) -> Result<Vec<String>, SaltError>;

    /// Pillar value at the colon-delimited `key_path` for each minion matching `host`, in
    /// minion id order. salt answers an unset key with an empty string.
    async fn config_value(&self, host: &str, key_path: &str) -> Result<Vec<serde_json::Value>, SaltError>;

    /// Runs a shell command on `host` and returns its stdout.
    async fn run_remote(&self, host: &str, command: &str) -> Result<String, SaltError>;
}

pub static SALT_CALL_TIME: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("salt_call_time", "Time spent calling salt-api in seconds")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["fun"],
    )
    .expect("failed creating salt_call_time metric")
});

#[inline]
fn start_salt_call_timer(fun: &str) -> HistogramTimer {
    SALT_CALL_TIME.with_label_values(&[fun]).start_timer()
}

pub static SALT_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("salt_errors", "Number of errors calling salt-api"),
        &["fun", "error_type"],
    )
    .expect("failed creating salt_errors metric")
});

#[inline]
fn track_salt_errors(fun: &str, error: &SaltError) {
    SALT_ERRORS.with_label_values(&[fun, error.label()]).inc()
}

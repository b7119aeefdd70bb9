use std::collections::BTreeSet;

use thiserror::Error;

use crate::poll::PollTimeout;
use crate::prometheus_api::PrometheusError;
use crate::salt::SaltError;

/// Why a scenario failed.
///
/// `Prometheus` and `Salt` errors end a convergence wait immediately; only unconverged checks are
/// retried until [`CheckError::Timeout`].
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Timeout(#[from] PollTimeout),

    #[error("{subject} hosts differ from expected - missing: {missing:?}, unexpected: {unexpected:?}")]
    HostMismatch {
        subject: String,
        missing: BTreeSet<String>,
        unexpected: BTreeSet<String>,
    },

    #[error("no data returned for query `{query}`")]
    NoData { query: String },

    #[error("{} expected series not found on {host}: {missing:?}", .missing.len())]
    MissingSeries { host: String, missing: Vec<String> },

    #[error("no pillar value for {key} on {host}")]
    MissingConfig { host: String, key: String },

    #[error(transparent)]
    Prometheus(#[from] PrometheusError),

    #[error(transparent)]
    Salt(#[from] SaltError),
}

impl CheckError {
    /// Error type label used in the scenario outcome counter.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "check::timeout",
            Self::HostMismatch { .. } => "check::host_mismatch",
            Self::NoData { .. } => "check::no_data",
            Self::MissingSeries { .. } => "check::missing_series",
            Self::MissingConfig { .. } => "check::missing_config",
            Self::Prometheus(err) => err.label(),
            Self::Salt(err) => err.label(),
        }
    }
}

//! Verification scenarios run against a deployed monitoring stack.
//!
//! Each scenario derives the expected state from the fleet topology (salt), derives the observed
//! state from the metrics backend (prometheus) or the hosts themselves, and compares the two.

use std::fmt;

use crate::prometheus_api::MetricsQuery;
use crate::salt::FleetControl;
use crate::settings::{ExcludedHosts, PollSettings};

mod checks;
mod error;
mod mysql;
mod stack;
mod system;

pub use checks::{expect_same_hosts, expect_series, MetricNamesPresent};
pub use error::CheckError;

pub const ETCD_SERVICE_GRAIN: &str = "services:etcd";
pub const KUBERNETES_SERVICE_GRAIN: &str = "services:kubernetes";
pub const GALERA_SERVICE_GRAIN: &str = "services:galera";

/// Result of a scenario that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// A precondition for the scenario does not hold in this deployment.
    Skipped { reason: String },
}

impl Outcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped { reason: reason.into() }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Everything the scenarios need to reach the stack under test.
#[derive(Debug)]
pub struct ScenarioContext<M, F> {
    metrics: M,
    fleet: F,
    skip: ExcludedHosts,
    poll: PollSettings,
}

impl<M, F> ScenarioContext<M, F>
where
    M: MetricsQuery,
    F: FleetControl,
{
    pub fn new(metrics: M, fleet: F, skip: ExcludedHosts, poll: PollSettings) -> Self {
        Self { metrics, fleet, skip, poll }
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    pub fn fleet(&self) -> &F {
        &self.fleet
    }

    pub fn excluded_hosts(&self) -> &ExcludedHosts {
        &self.skip
    }

    pub fn poll_settings(&self) -> &PollSettings {
        &self.poll
    }
}

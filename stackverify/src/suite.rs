use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};
use strum::IntoEnumIterator;
use thiserror::Error;
use tokio::time::Instant;

use crate::catalog::SystemTarget;
use crate::prometheus_api::MetricsQuery;
use crate::salt::FleetControl;
use crate::scenario::{CheckError, Outcome, ScenarioContext};

const SYSTEM_METRICS: &str = "system_metrics";

/// A verification scenario the suite can run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Scenario {
    Etcd,
    Telegraf,
    Prometheus,
    System(SystemTarget),
    Kubernetes,
    Mysql,
}

impl Scenario {
    /// Every scenario in run order, with `system_metrics` expanded per target.
    pub fn all() -> Vec<Self> {
        let mut scenarios = vec![Self::Etcd, Self::Telegraf, Self::Prometheus];
        scenarios.extend(SystemTarget::iter().map(Self::System));
        scenarios.extend([Self::Kubernetes, Self::Mysql]);
        scenarios
    }

    pub fn id(&self) -> String {
        match self {
            Self::Etcd => "etcd_metrics".to_string(),
            Self::Telegraf => "telegraf_metrics".to_string(),
            Self::Prometheus => "prometheus_metrics".to_string(),
            Self::System(target) => format!("{SYSTEM_METRICS}[{target}]"),
            Self::Kubernetes => "k8s_metrics".to_string(),
            Self::Mysql => "mysql_metrics".to_string(),
        }
    }

    /// Resolves requested scenario ids into run order. No ids selects every scenario; the bare
    /// `system_metrics` id selects every system target.
    pub fn select<S: AsRef<str>>(ids: &[S]) -> Result<Vec<Self>, SuiteError> {
        if ids.is_empty() {
            return Ok(Self::all());
        }

        let mut requested = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref().trim();
            if id == SYSTEM_METRICS {
                requested.extend(SystemTarget::iter().map(Self::System));
            } else {
                requested.push(Self::from_str(id)?);
            }
        }

        Ok(Self::all().into_iter().filter(|s| requested.contains(s)).collect())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Scenario {
    type Err = SuiteError;

    fn from_str(rep: &str) -> Result<Self, Self::Err> {
        let unknown = || SuiteError::UnknownScenario(rep.to_string());

        match rep {
            "etcd_metrics" => Ok(Self::Etcd),
            "telegraf_metrics" => Ok(Self::Telegraf),
            "prometheus_metrics" => Ok(Self::Prometheus),
            "k8s_metrics" => Ok(Self::Kubernetes),
            "mysql_metrics" => Ok(Self::Mysql),
            system => {
                let target = system
                    .strip_prefix(SYSTEM_METRICS)
                    .and_then(|rest| rest.strip_prefix('['))
                    .and_then(|rest| rest.strip_suffix(']'))
                    .ok_or_else(unknown)?;
                SystemTarget::from_str(target).map(Self::System).map_err(|_| unknown())
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
}

/// What happened when a scenario ran.
#[derive(Debug)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub result: Result<Outcome, CheckError>,
    pub elapsed: Duration,
}

impl ScenarioReport {
    pub const fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(outcome) => write!(f, "{}: {outcome} ({:?})", self.scenario, self.elapsed),
            Err(error) => write!(f, "{}: FAILED: {error} ({:?})", self.scenario, self.elapsed),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SuiteSummary {
    pub passed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SuiteSummary {
    pub fn from_reports(reports: &[ScenarioReport]) -> Self {
        reports.iter().fold(Self::default(), |mut acc, report| {
            match report.result {
                Ok(Outcome::Passed) => acc.passed += 1,
                Ok(Outcome::Skipped { .. }) => acc.skipped += 1,
                Err(_) => acc.failed += 1,
            }
            acc
        })
    }

    pub const fn total(&self) -> usize {
        self.passed + self.skipped + self.failed
    }

    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status for the run.
    pub const fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scenarios: {} passed, {} skipped, {} failed",
            self.total(),
            self.passed,
            self.skipped,
            self.failed
        )
    }
}

/// Runs scenarios one after another against a single stack.
#[derive(Debug)]
pub struct Suite<M, F> {
    context: ScenarioContext<M, F>,
}

impl<M, F> Suite<M, F>
where
    M: MetricsQuery,
    F: FleetControl,
{
    pub fn new(context: ScenarioContext<M, F>) -> Self {
        Self { context }
    }

    #[tracing::instrument(level = "info", skip(self, selection), fields(nr_scenarios=%selection.len()))]
    pub async fn run(&self, selection: &[Scenario]) -> Vec<ScenarioReport> {
        let mut reports = Vec::with_capacity(selection.len());
        for scenario in selection {
            reports.push(self.run_scenario(*scenario).await);
        }
        reports
    }

    #[tracing::instrument(level = "info", skip(self), fields(scenario=%scenario))]
    pub async fn run_scenario(&self, scenario: Scenario) -> ScenarioReport {
        let id = scenario.id();
        let _timer = SCENARIO_TIME.with_label_values(&[id.as_str()]).start_timer();
        let start = Instant::now();

        let result = match scenario {
            Scenario::Etcd => self.context.etcd_metrics().await,
            Scenario::Telegraf => self.context.telegraf_metrics().await,
            Scenario::Prometheus => self.context.prometheus_metrics().await,
            Scenario::System(target) => self.context.system_metrics(target).await,
            Scenario::Kubernetes => self.context.k8s_metrics().await,
            Scenario::Mysql => self.context.mysql_metrics().await,
        };

        let report = ScenarioReport { scenario, result, elapsed: start.elapsed() };
        track_scenario_outcome(&report);
        match &report.result {
            Ok(Outcome::Passed) => tracing::info!(elapsed=?report.elapsed, "scenario passed"),
            Ok(Outcome::Skipped { reason }) => tracing::warn!(%reason, "scenario skipped"),
            Err(error) => tracing::error!(?error, elapsed=?report.elapsed, "scenario failed: {error}"),
        }
        report
    }
}

pub static SCENARIO_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scenario_outcomes", "Number of scenario runs by outcome"),
        &["scenario", "outcome"],
    )
    .expect("failed creating scenario_outcomes metric")
});

pub static SCENARIO_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scenario_errors", "Number of failed scenario runs by error type"),
        &["scenario", "error_type"],
    )
    .expect("failed creating scenario_errors metric")
});

pub static SCENARIO_TIME: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("scenario_time", "Time spent running a scenario in seconds")
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["scenario"],
    )
    .expect("failed creating scenario_time metric")
});

fn track_scenario_outcome(report: &ScenarioReport) {
    let id = report.scenario.id();
    match &report.result {
        Ok(outcome) => SCENARIO_OUTCOMES.with_label_values(&[id.as_str(), outcome.label()]).inc(),
        Err(error) => {
            SCENARIO_OUTCOMES.with_label_values(&[id.as_str(), "failed"]).inc();
            SCENARIO_ERRORS.with_label_values(&[id.as_str(), error.label()]).inc();
        },
    }
}

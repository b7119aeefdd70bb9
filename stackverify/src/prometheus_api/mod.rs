use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, Opts};

mod context;
mod error;
mod model;

pub use context::PrometheusContext;
pub use error::PrometheusError;
pub use model::{MetricSample, SampleValue, HOST_LABEL, INSTANCE_LABEL, METRIC_NAME_LABEL};

/// Executes instant queries against a metrics backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MetricsQuery: fmt::Debug + Send + Sync {
    /// Returns the series currently matching `expr`, in no particular order.
    async fn query(&self, expr: &str) -> Result<Vec<MetricSample>, PrometheusError>;
}

pub static PROMETHEUS_QUERY_TIME: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "prometheus_query_time",
            "Time spent querying the prometheus HTTP API in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["action"],
    )
    .expect("failed creating prometheus_query_time metric")
});

#[inline]
fn start_prometheus_query_timer() -> HistogramTimer {
    PROMETHEUS_QUERY_TIME.with_label_values(&["query"]).start_timer()
}

pub static PROMETHEUS_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("prometheus_errors", "Number of errors calling the prometheus API"),
        &["action", "error_type"],
    )
    .expect("failed creating prometheus_errors metric")
});

#[inline]
fn track_prometheus_errors(error: &PrometheusError) {
    PROMETHEUS_ERRORS.with_label_values(&["query", error.label()]).inc()
}

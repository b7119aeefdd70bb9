use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;

use super::CheckError;
use crate::poll::ConvergenceCheck;
use crate::prometheus_api::{MetricSample, MetricsQuery};

/// Requires the hosts observed in the metrics backend to be exactly the hosts expected from the
/// fleet topology.
pub fn expect_same_hosts<E, O>(subject: &str, expected: E, observed: O) -> Result<(), CheckError>
where
    E: IntoIterator<Item = String>,
    O: IntoIterator<Item = String>,
{
    let expected: BTreeSet<String> = expected.into_iter().collect();
    let observed: BTreeSet<String> = observed.into_iter().collect();

    if expected == observed {
        tracing::info!(hosts=?expected, %subject, "observed hosts match expected");
        return Ok(());
    }

    Err(CheckError::HostMismatch {
        subject: subject.to_string(),
        missing: expected.difference(&observed).cloned().collect(),
        unexpected: observed.difference(&expected).cloned().collect(),
    })
}

/// Requires `query` to have returned at least one series.
pub fn expect_series(query: &str, samples: &[MetricSample]) -> Result<(), CheckError> {
    if samples.is_empty() {
        Err(CheckError::NoData { query: query.to_string() })
    } else {
        Ok(())
    }
}

/// Converges once every expected metric name appears among the series `query` returns. Names
/// beyond the expected set are ignored.
#[derive(Debug)]
pub struct MetricNamesPresent<'a, M: ?Sized> {
    metrics: &'a M,
    query: String,
    expected: &'a [&'static str],
}

impl<'a, M: MetricsQuery + ?Sized> MetricNamesPresent<'a, M> {
    pub fn new(metrics: &'a M, query: impl Into<String>, expected: &'a [&'static str]) -> Self {
        Self { metrics, query: query.into(), expected }
    }

    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    /// Expected names absent from `samples`, in catalog order.
    pub fn missing_from(&self, samples: &[MetricSample]) -> Vec<&'static str> {
        let observed: HashSet<&str> = samples.iter().filter_map(MetricSample::name).collect();
        self.expected.iter().copied().filter(|name| !observed.contains(name)).collect()
    }
}

#[async_trait]
impl<'a, M: MetricsQuery + ?Sized> ConvergenceCheck for MetricNamesPresent<'a, M> {
    type Error = CheckError;

    async fn is_converged(&self) -> Result<bool, Self::Error> {
        let samples = self.metrics.query(self.query.as_str()).await?;
        let missing = self.missing_from(&samples);
        if missing.is_empty() {
            return Ok(true);
        }

        tracing::info!(
            ?missing, nr_observed=%samples.len(), query=%self.query,
            "{} metric(s) not found", missing.len()
        );
        Ok(false)
    }
}

use std::collections::BTreeSet;

use super::{expect_same_hosts, expect_series, CheckError, Outcome, ScenarioContext};
use super::{ETCD_SERVICE_GRAIN, KUBERNETES_SERVICE_GRAIN};
use crate::catalog::{
    self, ETCD_BIND_HOST_PILLAR, ETCD_HAS_LEADER, KUBERNETES_METRICS, PROMETHEUS_BUILD_INFO, SYSTEM_UPTIME,
};
use crate::prometheus_api::MetricsQuery;
use crate::salt::{FleetControl, Selector};

impl<M, F> ScenarioContext<M, F>
where
    M: MetricsQuery,
    F: FleetControl,
{
    /// Every etcd member reports leadership status, labeled with the address it binds to.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn etcd_metrics(&self) -> Result<Outcome, CheckError> {
        let nodes = self.fleet.select(&Selector::grain(ETCD_SERVICE_GRAIN)).await?;

        let mut expected = BTreeSet::new();
        for node in nodes {
            let bind_host = self
                .fleet
                .config_value(node.as_str(), ETCD_BIND_HOST_PILLAR)
                .await?
                .into_iter()
                .next()
                .and_then(pillar_text)
                .ok_or_else(|| CheckError::MissingConfig {
                    host: node.clone(),
                    key: ETCD_BIND_HOST_PILLAR.to_string(),
                })?;
            expected.insert(bind_host);
        }

        let samples = self.metrics.query(ETCD_HAS_LEADER).await?;
        let observed = samples.iter().filter_map(|s| s.instance_host()).map(str::to_string);
        expect_same_hosts("etcd", expected, observed)?;
        Ok(Outcome::Passed)
    }

    /// Every host in the fleet reports uptime through telegraf.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn telegraf_metrics(&self) -> Result<Outcome, CheckError> {
        let nodes = self.fleet.select(&Selector::All).await?;
        let expected = nodes.iter().map(|n| crate::short_hostname(n).to_string());

        let samples = self.metrics.query(SYSTEM_UPTIME).await?;
        let observed = samples.iter().filter_map(|s| s.host()).map(str::to_string);
        expect_same_hosts("telegraf", expected, observed)?;
        Ok(Outcome::Passed)
    }

    /// The prometheus server reports its own build info.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn prometheus_metrics(&self) -> Result<Outcome, CheckError> {
        let samples = self.metrics.query(PROMETHEUS_BUILD_INFO).await?;
        expect_series(PROMETHEUS_BUILD_INFO, &samples)?;
        Ok(Outcome::Passed)
    }

    /// Container metrics are present once kubernetes is deployed.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn k8s_metrics(&self) -> Result<Outcome, CheckError> {
        let nodes = self.fleet.select(&Selector::grain(KUBERNETES_SERVICE_GRAIN)).await?;
        if nodes.is_empty() {
            return Ok(Outcome::skipped("There are no kubernetes nodes in the cluster"));
        }

        for metric in KUBERNETES_METRICS {
            let query = catalog::kubernetes_query(metric);
            tracing::info!(%metric, "checking kubernetes metric");
            let samples = self.metrics.query(query.as_str()).await?;
            expect_series(query.as_str(), &samples)?;
        }

        Ok(Outcome::Passed)
    }
}

/// A scalar pillar value as text; an empty string is how salt reports an unset key.
fn pillar_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.is_empty() => Some(text),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

use std::collections::HashSet;

use super::{CheckError, Outcome, ScenarioContext, GALERA_SERVICE_GRAIN};
use crate::catalog::{self, MYSQL_EXPORTER_COMMAND};
use crate::prometheus_api::MetricsQuery;
use crate::salt::{FleetControl, Selector};

impl<M, F> ScenarioContext<M, F>
where
    M: MetricsQuery,
    F: FleetControl,
{
    /// Every galera node's local exporter serves the full mysql catalog for its server socket.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn mysql_metrics(&self) -> Result<Outcome, CheckError> {
        let mysql_hosts = self.fleet.select(&Selector::grain(GALERA_SERVICE_GRAIN)).await?;
        if mysql_hosts.is_empty() {
            return Ok(Outcome::skipped("There are no galera nodes in the cluster"));
        }

        let expected = catalog::mysql_expected_metrics();
        for host in mysql_hosts.iter() {
            let output = self.fleet.run_remote(host.as_str(), MYSQL_EXPORTER_COMMAND).await?;
            let exported: HashSet<&str> = output.lines().map(str::trim).collect();

            let hostname = crate::short_hostname(host);
            let missing: Vec<String> = expected
                .iter()
                .map(|metric| catalog::mysql_series(metric, hostname))
                .filter(|series| !exported.contains(series.as_str()))
                .collect();

            if !missing.is_empty() {
                return Err(CheckError::MissingSeries { host: hostname.to_string(), missing });
            }

            tracing::info!(host=%hostname, nr_series=%expected.len(), "mysql metrics present");
        }

        Ok(Outcome::Passed)
    }
}

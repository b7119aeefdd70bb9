use super::{CheckError, MetricNamesPresent, Outcome, ScenarioContext};
use crate::catalog::SystemTarget;
use crate::poll;
use crate::prometheus_api::MetricsQuery;
use crate::salt::{FleetControl, Selector};

impl<M, F> ScenarioContext<M, F>
where
    M: MetricsQuery,
    F: FleetControl,
{
    /// Waits until every non-excluded host reports the full telegraf catalog for `target`.
    #[tracing::instrument(level = "info", skip(self), fields(target=%target))]
    pub async fn system_metrics(&self, target: SystemTarget) -> Result<Outcome, CheckError> {
        let nodes = self.fleet.select(&Selector::All).await?;

        for node in nodes.iter().map(|n| crate::short_hostname(n)) {
            if self.skip.contains(node) {
                tracing::info!(host=%node, "Skip {node}");
                continue;
            }

            let check = MetricNamesPresent::new(&self.metrics, target.host_query(node), target.expected_metrics());
            tracing::info!(host=%node, query=%check.query(), "Waiting to get all metrics");
            poll::wait_for(&self.poll, &check).await?;
        }

        Ok(Outcome::Passed)
    }
}

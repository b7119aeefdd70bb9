use prometheus::{Encoder, Registry, TextEncoder};

use crate::Result;
use crate::{poll, prometheus_api, salt, suite};

#[tracing::instrument(level = "trace")]
pub fn register_metrics(registry: &Registry) -> Result<()> {
    registry.register(Box::new(prometheus_api::PROMETHEUS_QUERY_TIME.clone()))?;
    registry.register(Box::new(prometheus_api::PROMETHEUS_ERRORS.clone()))?;

    registry.register(Box::new(salt::SALT_CALL_TIME.clone()))?;
    registry.register(Box::new(salt::SALT_ERRORS.clone()))?;

    registry.register(Box::new(poll::POLL_ATTEMPTS.clone()))?;
    registry.register(Box::new(poll::POLL_TIMEOUTS.clone()))?;

    registry.register(Box::new(suite::SCENARIO_OUTCOMES.clone()))?;
    registry.register(Box::new(suite::SCENARIO_ERRORS.clone()))?;
    registry.register(Box::new(suite::SCENARIO_TIME.clone()))?;

    Ok(())
}

/// Renders the registry in the prometheus text exposition format.
pub fn render_text(registry: &Registry) -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

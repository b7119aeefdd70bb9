use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;

use crate::settings::{HttpClientSettings, SettingsError};

#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Builds a pooled client whose transient transport failures are retried with exponential
/// backoff, up to `settings.max_retries` times.
pub fn make_http_client(settings: &HttpClientSettings) -> Result<ClientWithMiddleware, HttpClientError> {
    let headers = settings.header_map()?;

    let mut client_builder = reqwest::Client::builder()
        .pool_idle_timeout(settings.pool_idle_timeout)
        .default_headers(headers);

    if let Some(pool_max_idle_per_host) = settings.pool_max_idle_per_host {
        client_builder = client_builder.pool_max_idle_per_host(pool_max_idle_per_host);
    }

    if let Some(request_timeout) = settings.request_timeout {
        client_builder = client_builder.timeout(request_timeout);
    }

    let client = client_builder.build()?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

#[allow(clippy::cognitive_complexity)]
pub(crate) fn log_response(endpoint: &str, label: &str, response: &reqwest::Response) {
    let status = response.status();
    if status.is_success() || status.is_informational() {
        tracing::debug!(?response, "{endpoint} response received: {label}");
    } else {
        tracing::warn!(?response, "{endpoint} response received: {label}");
    }
}

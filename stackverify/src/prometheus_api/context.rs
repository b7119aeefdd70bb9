use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryFutureExt;
use http::Method;
use reqwest_middleware::ClientWithMiddleware;
use tracing::Instrument;
use url::Url;

use super::model::{QueryData, QueryResponse, ResponseStatus};
use super::{MetricSample, MetricsQuery, PrometheusError};
use crate::client;
use crate::settings::PrometheusSettings;

const QUERY_PATH: [&str; 3] = ["api", "v1", "query"];

/// Instant-query client for the Prometheus HTTP API.
#[derive(Debug, Clone)]
pub struct PrometheusContext {
    inner: Arc<PrometheusContextRef>,
}

impl PrometheusContext {
    pub fn new(client: ClientWithMiddleware, base_url: Url) -> Result<Self, PrometheusError> {
        let mut query_endpoint = base_url.clone();
        query_endpoint
            .path_segments_mut()
            .map_err(|_| PrometheusError::NotABaseUrl(base_url.clone()))?
            .pop_if_empty()
            .extend(QUERY_PATH);

        Ok(Self {
            inner: Arc::new(PrometheusContextRef { client, base_url, query_endpoint }),
        })
    }

    pub fn from_settings(settings: &PrometheusSettings) -> Result<Self, PrometheusError> {
        let client = client::make_http_client(&settings.client)?;
        let base_url = settings.base_url()?;
        Self::new(client, base_url)
    }

    pub fn base_url(&self) -> Url {
        self.inner.base_url.clone()
    }

    pub fn query_endpoint(&self) -> Url {
        self.inner.query_endpoint.clone()
    }
}

#[async_trait]
impl MetricsQuery for PrometheusContext {
    #[tracing::instrument(level = "info", skip(self))]
    async fn query(&self, expr: &str) -> Result<Vec<MetricSample>, PrometheusError> {
        let _timer = super::start_prometheus_query_timer();
        let result = self.inner.query(expr).await;
        if let Err(ref error) = result {
            tracing::error!(?error, %expr, "failed to query prometheus");
            super::track_prometheus_errors(error);
        }
        result
    }
}

struct PrometheusContextRef {
    client: ClientWithMiddleware,
    base_url: Url,
    query_endpoint: Url,
}

impl fmt::Debug for PrometheusContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrometheusContextRef")
            .field("base_url", &self.base_url)
            .field("query_endpoint", &self.query_endpoint)
            .finish()
    }
}

impl PrometheusContextRef {
    async fn query(&self, expr: &str) -> Result<Vec<MetricSample>, PrometheusError> {
        let span = tracing::info_span!("query prometheus", %expr);

        let (status, body) = self
            .client
            .request(Method::GET, self.query_endpoint.clone())
            .query(&[("query", expr)])
            .send()
            .map_err(PrometheusError::from)
            .and_then(|response| async move {
                client::log_response("prometheus", "query", &response);
                let status = response.status();
                let body = response.text().await?;
                Ok::<_, PrometheusError>((status, body))
            })
            .instrument(span)
            .await?;

        let response: QueryResponse = match serde_json::from_str(body.as_str()) {
            Ok(response) => response,
            Err(_) if !status.is_success() => return Err(PrometheusError::HttpStatus { status, body }),
            Err(err) => return Err(err.into()),
        };

        if !response.warnings.is_empty() {
            tracing::warn!(warnings=?response.warnings, %expr, "prometheus query returned warnings");
        }

        let samples: Result<Vec<MetricSample>, PrometheusError> = match (response.status, response.data) {
            (ResponseStatus::Error, _) => Err(PrometheusError::Api {
                query: expr.to_string(),
                error_type: response.error_type.unwrap_or_default(),
                error: response.error.unwrap_or_default(),
            }),
            (ResponseStatus::Success, None) => Ok(Vec::default()),
            (ResponseStatus::Success, Some(QueryData::Vector(series))) => {
                Ok(series.into_iter().map(MetricSample::from).collect())
            },
            (ResponseStatus::Success, Some(QueryData::Matrix(series))) => {
                Ok(series.into_iter().map(MetricSample::from).collect())
            },
            (ResponseStatus::Success, Some(data)) => Err(PrometheusError::UnexpectedResultType {
                query: expr.to_string(),
                result_type: data.result_type().to_string(),
            }),
        };

        if let Ok(ref samples) = samples {
            tracing::debug!(nr_samples=%samples.len(), %expr, "prometheus query response");
        }
        samples
    }
}

use thiserror::Error;

use crate::client::HttpClientError;
use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum PrometheusError {
    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    HttpClient(#[from] HttpClientError),

    #[error("supplied prometheus url cannot be a base to query: {0}")]
    NotABaseUrl(url::Url),

    #[error("Prometheus API call failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("error occurred in HTTP middleware calling prometheus: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    #[error("prometheus responded with HTTP {status}: {body}")]
    HttpStatus { status: http::StatusCode, body: String },

    #[error("failed processing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prometheus rejected query `{query}` [{error_type}]: {error}")]
    Api { query: String, error_type: String, error: String },

    #[error("prometheus query `{query}` returned {result_type} result where series were expected")]
    UnexpectedResultType { query: String, result_type: String },
}

impl PrometheusError {
    /// Error type label used in the query error counter.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Settings(_) => "prometheus::settings",
            Self::HttpClient(_) => "prometheus::http::client",
            Self::NotABaseUrl(_) => "prometheus::http::url::NotABaseUrl",
            Self::HttpRequest(_) => "prometheus::http::request",
            Self::HttpMiddleware(_) => "prometheus::http::middleware",
            Self::HttpStatus { .. } => "prometheus::http::status",
            Self::Json(_) => "prometheus::http::json",
            Self::Api { .. } => "prometheus::api",
            Self::UnexpectedResultType { .. } => "prometheus::api::result_type",
        }
    }
}

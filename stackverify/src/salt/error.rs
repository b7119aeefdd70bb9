use thiserror::Error;

use crate::client::HttpClientError;
use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum SaltError {
    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    HttpClient(#[from] HttpClientError),

    #[error("supplied salt-api url cannot be a base to query: {0}")]
    NotABaseUrl(url::Url),

    #[error("salt-api call failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("error occurred in HTTP middleware calling salt-api: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    #[error("salt-api responded with HTTP {status}: {body}")]
    HttpStatus { status: http::StatusCode, body: String },

    #[error("failed processing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("salt-api authentication failed for user {user}: {reason}")]
    Authentication { user: String, reason: String },

    #[error("salt-api returned no result for {fun}")]
    EmptyReturn { fun: String },

    #[error("minion {host} did not respond to {fun}")]
    NoResponse { host: String, fun: String },

    #[error("unexpected salt-api response to {fun}: {detail}")]
    UnexpectedResponse { fun: String, detail: String },
}

impl SaltError {
    /// Error type label used in the salt call error counter.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Settings(_) => "salt::settings",
            Self::HttpClient(_) => "salt::http::client",
            Self::NotABaseUrl(_) => "salt::http::url::NotABaseUrl",
            Self::HttpRequest(_) => "salt::http::request",
            Self::HttpMiddleware(_) => "salt::http::middleware",
            Self::HttpStatus { .. } => "salt::http::status",
            Self::Json(_) => "salt::http::json",
            Self::Authentication { .. } => "salt::auth",
            Self::EmptyReturn { .. } => "salt::api::empty",
            Self::NoResponse { .. } => "salt::minion::no_response",
            Self::UnexpectedResponse { .. } => "salt::api::unexpected",
        }
    }
}

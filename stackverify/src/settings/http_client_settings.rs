use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};

use super::SettingsError;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct HttpClientSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,

    /// Number of times a transient transport failure (connection errors, 5xx, 429) is retried
    /// with exponential backoff before the call fails.
    #[serde(default = "HttpClientSettings::default_max_retries")]
    pub max_retries: u32,

    #[serde(default, rename = "request_timeout_secs", skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DurationSeconds>")]
    pub request_timeout: Option<Duration>,

    #[serde(default, rename = "pool_idle_timeout_secs", skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DurationSeconds>")]
    pub pool_idle_timeout: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_max_idle_per_host: Option<usize>,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            headers: Vec::default(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            request_timeout: None,
            pool_idle_timeout: None,
            pool_max_idle_per_host: None,
        }
    }
}

impl HttpClientSettings {
    const DEFAULT_MAX_RETRIES: u32 = 3;

    pub const fn default_max_retries() -> u32 {
        Self::DEFAULT_MAX_RETRIES
    }

    pub fn header_map(&self) -> Result<HeaderMap, SettingsError> {
        let mut result = HeaderMap::with_capacity(self.headers.len());

        for (k, v) in self.headers.iter() {
            let name = HeaderName::from_str(k.as_str())?;
            let value = HeaderValue::from_str(v.as_str())?;
            result.insert(name, value);
        }

        Ok(result)
    }
}

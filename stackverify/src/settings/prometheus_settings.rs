use serde::{Deserialize, Serialize};
use url::Url;

use super::{HttpClientSettings, SettingsError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct PrometheusSettings {
    #[serde(default = "PrometheusSettings::default_scheme")]
    pub scheme: String,

    #[serde(default = "PrometheusSettings::default_host")]
    pub host: String,

    #[serde(default = "PrometheusSettings::default_port")]
    pub port: u16,

    #[serde(default)]
    pub client: HttpClientSettings,
}

impl Default for PrometheusSettings {
    fn default() -> Self {
        Self {
            scheme: Self::DEFAULT_SCHEME.to_string(),
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            client: HttpClientSettings::default(),
        }
    }
}

impl PrometheusSettings {
    const DEFAULT_HOST: &'static str = "localhost";
    const DEFAULT_PORT: u16 = 9090;
    const DEFAULT_SCHEME: &'static str = "http";

    pub fn default_scheme() -> String {
        Self::DEFAULT_SCHEME.to_string()
    }

    pub fn default_host() -> String {
        Self::DEFAULT_HOST.to_string()
    }

    pub const fn default_port() -> u16 {
        Self::DEFAULT_PORT
    }

    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let url = Url::parse(format!("{}://{}:{}/", self.scheme, self.host, self.port).as_str())?;

        if url.cannot_be_a_base() {
            return Err(SettingsError::UrlCannotBeBase(url));
        }

        Ok(url)
    }
}

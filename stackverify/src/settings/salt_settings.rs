use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use super::{HttpClientSettings, SettingsError};

/// Connection to the salt-api (rest_cherrypy) endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SaltSettings {
    #[serde(default = "SaltSettings::default_scheme")]
    pub scheme: String,

    #[serde(default = "SaltSettings::default_host")]
    pub host: String,

    #[serde(default = "SaltSettings::default_port")]
    pub port: u16,

    #[serde(default = "SaltSettings::default_username")]
    pub username: String,

    #[serde(default = "SaltSettings::default_password")]
    pub password: SecretString,

    /// External authentication system salt-api validates the credentials against.
    #[serde(default = "SaltSettings::default_eauth")]
    pub eauth: String,

    #[serde(default)]
    pub client: HttpClientSettings,
}

#[cfg(test)]
impl PartialEq for SaltSettings {
    fn eq(&self, other: &Self) -> bool {
        use secrecy::ExposeSecret;

        self.scheme == other.scheme
            && self.host == other.host
            && self.port == other.port
            && self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
            && self.eauth == other.eauth
            && self.client == other.client
    }
}

impl Default for SaltSettings {
    fn default() -> Self {
        Self {
            scheme: Self::default_scheme(),
            host: Self::default_host(),
            port: Self::DEFAULT_PORT,
            username: Self::default_username(),
            password: Self::default_password(),
            eauth: Self::default_eauth(),
            client: HttpClientSettings::default(),
        }
    }
}

impl SaltSettings {
    const DEFAULT_EAUTH: &'static str = "pam";
    const DEFAULT_HOST: &'static str = "localhost";
    const DEFAULT_PORT: u16 = 6969;
    const DEFAULT_SCHEME: &'static str = "http";
    const DEFAULT_USERNAME: &'static str = "salt";

    pub fn default_scheme() -> String {
        Self::DEFAULT_SCHEME.to_string()
    }

    pub fn default_host() -> String {
        Self::DEFAULT_HOST.to_string()
    }

    pub const fn default_port() -> u16 {
        Self::DEFAULT_PORT
    }

    pub fn default_username() -> String {
        Self::DEFAULT_USERNAME.to_string()
    }

    pub fn default_password() -> SecretString {
        SecretString::new(String::new())
    }

    pub fn default_eauth() -> String {
        Self::DEFAULT_EAUTH.to_string()
    }

    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let url = Url::parse(format!("{}://{}:{}/", self.scheme, self.host, self.port).as_str())?;

        if url.cannot_be_a_base() {
            return Err(SettingsError::UrlCannotBeBase(url));
        }

        Ok(url)
    }
}

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::Instrument;
use url::Url;

use super::model::{LoginRequest, LoginReturn, LowState, MinionReturns, SaltReturn};
use super::{FleetControl, SaltError, Selector, CMD_RUN, PILLAR_GET, TEST_PING};
use crate::client;
use crate::settings::SaltSettings;

const LOGIN_PATH: &str = "login";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const APPLICATION_JSON: &str = "application/json";

/// Credentials exchanged for a salt-api session token.
#[derive(Debug, Clone)]
pub struct SaltCredentials {
    pub username: String,
    pub password: SecretString,
    pub eauth: String,
}

impl From<&SaltSettings> for SaltCredentials {
    fn from(settings: &SaltSettings) -> Self {
        Self {
            username: settings.username.clone(),
            password: settings.password.clone(),
            eauth: settings.eauth.clone(),
        }
    }
}

/// salt-api (rest_cherrypy) client. Logs in lazily on first call and reuses the session token
/// until salt-api rejects it.
#[derive(Debug, Clone)]
pub struct SaltContext {
    inner: Arc<SaltContextRef>,
}

impl SaltContext {
    pub fn new(
        client: ClientWithMiddleware, base_url: Url, credentials: SaltCredentials,
    ) -> Result<Self, SaltError> {
        if base_url.cannot_be_a_base() {
            return Err(SaltError::NotABaseUrl(base_url));
        }

        let login_endpoint = base_url.join(LOGIN_PATH).map_err(|_| SaltError::NotABaseUrl(base_url.clone()))?;

        Ok(Self {
            inner: Arc::new(SaltContextRef {
                client,
                base_url,
                login_endpoint,
                credentials,
                token: Mutex::new(None),
            }),
        })
    }

    pub fn from_settings(settings: &SaltSettings) -> Result<Self, SaltError> {
        let client = client::make_http_client(&settings.client)?;
        let base_url = settings.base_url()?;
        Self::new(client, base_url, SaltCredentials::from(settings))
    }

    pub fn base_url(&self) -> Url {
        self.inner.base_url.clone()
    }

    async fn call_tracked(&self, lowstate: LowState) -> Result<MinionReturns, SaltError> {
        let fun = lowstate.fun;
        let _timer = super::start_salt_call_timer(fun);
        let result = self.inner.call(lowstate).await;
        if let Err(ref error) = result {
            tracing::error!(?error, %fun, "failed calling salt-api");
            super::track_salt_errors(fun, error);
        }
        result
    }
}

#[async_trait]
impl FleetControl for SaltContext {
    #[tracing::instrument(level = "info", skip(self))]
    async fn select(&self, selector: &Selector) -> Result<Vec<String>, SaltError> {
        let returns = self.call_tracked(LowState::new(selector, TEST_PING, Vec::default())).await?;

        let hosts: Vec<String> = returns
            .into_iter()
            .filter_map(|(minion, reply)| match reply {
                serde_json::Value::Bool(true) => Some(minion),
                reply => {
                    tracing::warn!(%minion, ?reply, "minion did not answer ping - leaving out");
                    None
                },
            })
            .collect();

        tracing::info!(?hosts, %selector, "selected hosts");
        Ok(hosts)
    }

    #[tracing::instrument(level = "info", skip(self))]
    async fn config_value(&self, host: &str, key_path: &str) -> Result<Vec<serde_json::Value>, SaltError> {
        let lowstate = LowState::new(&Selector::host(host), PILLAR_GET, vec![key_path.to_string()]);
        let returns = self.call_tracked(lowstate).await?;
        if returns.is_empty() {
            return Err(SaltError::NoResponse { host: host.to_string(), fun: PILLAR_GET.to_string() });
        }

        Ok(returns.into_values().collect())
    }

    #[tracing::instrument(level = "info", skip(self))]
    async fn run_remote(&self, host: &str, command: &str) -> Result<String, SaltError> {
        let lowstate = LowState::new(&Selector::host(host), CMD_RUN, vec![command.to_string()]);
        let mut returns = self.call_tracked(lowstate).await?;

        let output = returns.remove(host).ok_or_else(|| {
            tracing::warn!(%host, responders=?returns.keys().collect::<Vec<_>>(), "command output missing for host");
            SaltError::NoResponse { host: host.to_string(), fun: CMD_RUN.to_string() }
        })?;

        match output {
            serde_json::Value::String(stdout) => Ok(stdout),
            other => Err(SaltError::UnexpectedResponse {
                fun: CMD_RUN.to_string(),
                detail: format!("expected command output from {host} but got: {other}"),
            }),
        }
    }
}

struct SaltContextRef {
    client: ClientWithMiddleware,
    base_url: Url,
    login_endpoint: Url,
    credentials: SaltCredentials,
    token: Mutex<Option<SecretString>>,
}

impl fmt::Debug for SaltContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltContextRef")
            .field("base_url", &self.base_url)
            .field("login_endpoint", &self.login_endpoint)
            .field("username", &self.credentials.username)
            .field("eauth", &self.credentials.eauth)
            .finish()
    }
}

impl SaltContextRef {
    async fn call(&self, lowstate: LowState) -> Result<MinionReturns, SaltError> {
        let fun = lowstate.fun;
        let payload = serde_json::to_vec(&[&lowstate])?;

        let token = self.session_token().await?;
        let (mut status, mut body) = self.post_lowstate(&token, payload.clone()).await?;
        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(%fun, "salt-api session rejected - logging in again");
            self.invalidate_session().await;
            let token = self.session_token().await?;
            (status, body) = self.post_lowstate(&token, payload).await?;
        }

        if !status.is_success() {
            return Err(SaltError::HttpStatus { status, body });
        }

        let response: SaltReturn<MinionReturns> = serde_json::from_str(body.as_str())?;
        let returns = response
            .returns
            .into_iter()
            .next()
            .ok_or_else(|| SaltError::EmptyReturn { fun: fun.to_string() })?;

        tracing::debug!(%fun, tgt=%lowstate.tgt, nr_minions=%returns.len(), "salt-api call returned");
        Ok(returns)
    }

    async fn post_lowstate(&self, token: &str, payload: Vec<u8>) -> Result<(StatusCode, String), SaltError> {
        let span = tracing::debug_span!("post salt lowstate");
        async move {
            let response = self
                .client
                .request(Method::POST, self.base_url.clone())
                .header(ACCEPT, APPLICATION_JSON)
                .header(CONTENT_TYPE, APPLICATION_JSON)
                .header(AUTH_TOKEN_HEADER, token)
                .body(payload)
                .send()
                .await?;

            client::log_response("salt-api", "lowstate", &response);
            let status = response.status();
            let body = response.text().await?;
            Ok((status, body))
        }
        .instrument(span)
        .await
    }

    async fn session_token(&self) -> Result<String, SaltError> {
        let mut token = self.token.lock().await;
        if let Some(ref current) = *token {
            return Ok(current.expose_secret().clone());
        }

        let fresh = self.login().await?;
        let exposed = fresh.expose_secret().clone();
        *token = Some(fresh);
        Ok(exposed)
    }

    async fn invalidate_session(&self) {
        *self.token.lock().await = None;
    }

    #[tracing::instrument(level = "info", skip(self), fields(user = %self.credentials.username))]
    async fn login(&self) -> Result<SecretString, SaltError> {
        let request = LoginRequest {
            username: self.credentials.username.as_str(),
            password: self.credentials.password.expose_secret().as_str(),
            eauth: self.credentials.eauth.as_str(),
        };
        let payload = serde_json::to_vec(&request)?;

        let response = self
            .client
            .request(Method::POST, self.login_endpoint.clone())
            .header(ACCEPT, APPLICATION_JSON)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(payload)
            .send()
            .await?;

        client::log_response("salt-api", "login", &response);
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(SaltError::Authentication {
                user: self.credentials.username.clone(),
                reason: "credentials rejected".to_string(),
            });
        } else if !status.is_success() {
            return Err(SaltError::HttpStatus { status, body });
        }

        let login: SaltReturn<LoginReturn> = serde_json::from_str(body.as_str())?;
        let session = login
            .returns
            .into_iter()
            .next()
            .filter(|session| !session.token.is_empty())
            .ok_or_else(|| SaltError::Authentication {
                user: self.credentials.username.clone(),
                reason: "no session token in login response".to_string(),
            })?;

        tracing::info!(expire=?session.expire, "salt-api session established");
        Ok(SecretString::new(session.token))
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use claims::*;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use secrecy::SecretString;
use serde_json::{json, Value};
use stackverify::prometheus_api::PrometheusContext;
use stackverify::salt::{SaltContext, SaltCredentials};
use stackverify::settings::PollSettings;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "6d1b722e8e0d2c0c";

pub fn fast_client() -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(1), Duration::from_millis(10))
        .build_with_max_retries(2);
    ClientBuilder::new(reqwest::Client::new())
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}

pub fn base_url(server: &MockServer) -> Url {
    assert_ok!(Url::parse(format!("{}/", server.uri()).as_str()))
}

pub fn prometheus_context(server: &MockServer) -> PrometheusContext {
    assert_ok!(PrometheusContext::new(fast_client(), base_url(server)))
}

pub fn salt_context(server: &MockServer) -> SaltContext {
    let credentials = SaltCredentials {
        username: "salt".to_string(),
        password: SecretString::new("hovno12345!".to_string()),
        eauth: "pam".to_string(),
    };
    assert_ok!(SaltContext::new(fast_client(), base_url(server), credentials))
}

pub fn quick_poll() -> PollSettings {
    PollSettings {
        timeout: Duration::from_secs(2),
        interval: Duration::from_millis(100),
        timeout_message: "Timed out waiting to get all metrics".to_string(),
    }
}

/// A minion known to the fake salt master.
#[derive(Debug, Clone)]
pub struct Minion {
    pub id: String,
    pub services: Vec<String>,
    pub responsive: bool,
    pub pillar: HashMap<String, Value>,
    pub commands: HashMap<String, String>,
}

impl Minion {
    pub fn new(id: &str, services: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            services: services.iter().map(|s| (*s).to_string()).collect(),
            responsive: true,
            pillar: HashMap::new(),
            commands: HashMap::new(),
        }
    }

    pub fn unresponsive(mut self) -> Self {
        self.responsive = false;
        self
    }

    pub fn with_pillar(mut self, key: &str, value: Value) -> Self {
        self.pillar.insert(key.to_string(), value);
        self
    }

    pub fn with_command(mut self, command: &str, stdout: String) -> Self {
        self.commands.insert(command.to_string(), stdout);
        self
    }

    fn matches(&self, tgt: &str, tgt_type: &str) -> bool {
        match tgt_type {
            "glob" => tgt == "*" || tgt == self.id,
            "grain" => match tgt.split_once(':') {
                Some(("services", service)) => self.services.iter().any(|s| s == service),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Answers salt-api lowstate calls from a fixed fleet description.
#[derive(Debug, Clone)]
pub struct FakeSaltMaster {
    minions: Vec<Minion>,
}

impl FakeSaltMaster {
    pub fn new(minions: Vec<Minion>) -> Self {
        Self { minions }
    }

    pub async fn mount(self, server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "return": [{ "token": TOKEN, "expire": 1_363_849_143.776_224, "user": "salt", "eauth": "pam" }]
            })))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("X-Auth-Token", TOKEN))
            .respond_with(self)
            .mount(server)
            .await;
    }
}

impl Respond for FakeSaltMaster {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let chunks: Vec<Value> = match serde_json::from_slice(&request.body) {
            Ok(chunks) => chunks,
            Err(_) => return ResponseTemplate::new(400),
        };
        let chunk = &chunks[0];
        let tgt = chunk["tgt"].as_str().unwrap_or_default();
        let tgt_type = chunk["tgt_type"].as_str().unwrap_or_default();
        let arg = chunk["arg"][0].as_str().unwrap_or_default();

        let mut returns = serde_json::Map::new();
        for minion in self.minions.iter().filter(|m| m.matches(tgt, tgt_type)) {
            let reply = match chunk["fun"].as_str() {
                Some("test.ping") => json!(minion.responsive),
                Some("pillar.get") => minion.pillar.get(arg).cloned().unwrap_or_else(|| json!("")),
                Some("cmd.run") => json!(minion.commands.get(arg).cloned().unwrap_or_default()),
                _ => return ResponseTemplate::new(400),
            };
            returns.insert(minion.id.clone(), reply);
        }

        ResponseTemplate::new(200).set_body_json(json!({ "return": [returns] }))
    }
}

pub fn vector_response(samples: &[Value]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "success",
        "data": { "resultType": "vector", "result": samples }
    }))
}

pub fn series(labels: Value) -> Value {
    json!({ "metric": labels, "value": [1_527_000_000.123, "1"] })
}

pub async fn mount_query(server: &MockServer, query: &str, samples: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", query))
        .respond_with(vector_response(&samples))
        .mount(server)
        .await;
}

/// Serves a partial response until `partial_attempts` queries have been made, then the complete one.
pub struct EventuallyComplete {
    attempts: Arc<AtomicU32>,
    partial_attempts: u32,
    partial: Vec<Value>,
    complete: Vec<Value>,
}

impl EventuallyComplete {
    pub fn new(partial_attempts: u32, partial: Vec<Value>, complete: Vec<Value>) -> Self {
        Self { attempts: Arc::new(AtomicU32::new(0)), partial_attempts, partial, complete }
    }
}

impl Respond for EventuallyComplete {
    #[tracing::instrument(level = "info", skip(self, _request))]
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let attempts = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.partial_attempts < attempts {
            tracing::info!(%attempts, "enough attempts returning complete response");
            vector_response(&self.complete)
        } else {
            tracing::info!(%attempts, "returning partial response");
            vector_response(&self.partial)
        }
    }
}

/// Fails with `fail_status_code` for the first `failures` requests, then answers with `success`.
pub struct RetryResponder(Arc<AtomicU32>, u32, ResponseTemplate, u16);

impl RetryResponder {
    pub fn new(failures: u32, fail_status_code: u16, success: ResponseTemplate) -> Self {
        Self(Arc::new(AtomicU32::new(0)), failures, success, fail_status_code)
    }
}

impl Respond for RetryResponder {
    #[tracing::instrument(level = "info", skip(self, _request))]
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let attempts = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        if self.1 < attempts {
            tracing::info!(%attempts, failures=%(self.1), "enough attempts returning response");
            self.2.clone()
        } else {
            tracing::info!(%attempts, failures=%(self.1), "not enough attempts");
            ResponseTemplate::new(self.3)
        }
    }
}

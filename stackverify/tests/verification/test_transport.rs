use claims::*;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use stackverify::prometheus_api::{MetricsQuery, PrometheusContext, PrometheusError};
use stackverify::salt::{FleetControl, SaltContext, Selector};
use stackverify::settings::{HttpClientSettings, PrometheusSettings, SaltSettings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

use super::fixtures::*;

fn prometheus_settings(server: &MockServer) -> PrometheusSettings {
    PrometheusSettings {
        host: server.address().ip().to_string(),
        port: server.address().port(),
        client: HttpClientSettings {
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            max_retries: 1,
            ..HttpClientSettings::default()
        },
        ..PrometheusSettings::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transient_prometheus_failure_is_retried() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let main_span = tracing::info_span!("test_transient_prometheus_failure_is_retried");
    let _ = main_span.enter();

    let prometheus = MockServer::start().await;
    let success = vector_response(&[series(json!({ "__name__": "prometheus_build_info", "version": "2.2.1" }))]);
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(RetryResponder::new(2, 503, success))
        .expect(3)
        .mount(&prometheus)
        .await;

    let context = prometheus_context(&prometheus);
    let actual = assert_ok!(context.query("prometheus_build_info").await);
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].label("version"), Some("2.2.1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_prometheus_context_from_settings() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let main_span = tracing::info_span!("test_prometheus_context_from_settings");
    let _ = main_span.enter();

    let prometheus = MockServer::start().await;
    mount_query(
        &prometheus,
        "system_uptime",
        vec![series(json!({ "__name__": "system_uptime", "host": "ctl01" }))],
    )
    .await;

    let context = assert_ok!(PrometheusContext::from_settings(&prometheus_settings(&prometheus)));
    assert_eq!(
        context.query_endpoint().as_str(),
        format!("{}/api/v1/query", prometheus.uri())
    );
    let actual = assert_ok!(context.query("system_uptime").await);
    assert_eq!(actual[0].host(), Some("ctl01"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unmatched_query_is_http_status_error() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let prometheus = MockServer::start().await;

    let context = prometheus_context(&prometheus);
    match assert_err!(context.query("up").await) {
        PrometheusError::HttpStatus { status, .. } => assert_eq!(status, http::StatusCode::NOT_FOUND),
        err => panic!("expected http status error but got: {err:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_salt_context_from_settings() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let main_span = tracing::info_span!("test_salt_context_from_settings");
    let _ = main_span.enter();

    let salt = MockServer::start().await;
    FakeSaltMaster::new(vec![
        Minion::new("ctl01.mcp.local", &["etcd"]),
        Minion::new("cmp001.mcp.local", &["kubernetes"]),
    ])
    .mount(&salt)
    .await;

    let settings = SaltSettings {
        host: salt.address().ip().to_string(),
        port: salt.address().port(),
        password: SecretString::new("hovno12345!".to_string()),
        ..SaltSettings::default()
    };
    let context = assert_ok!(SaltContext::from_settings(&settings));

    assert_eq!(
        assert_ok!(context.select(&Selector::All).await),
        vec!["cmp001.mcp.local".to_string(), "ctl01.mcp.local".to_string()]
    );
    assert_eq!(
        assert_ok!(context.select(&Selector::grain("services:kubernetes")).await),
        vec!["cmp001.mcp.local".to_string()]
    );
    assert!(assert_ok!(context.select(&Selector::grain("services:galera")).await).is_empty());
}

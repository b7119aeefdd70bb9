use claims::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use stackverify::catalog::{self, SystemTarget};
use stackverify::scenario::{CheckError, Outcome, ScenarioContext};
use stackverify::settings::ExcludedHosts;
use stackverify::suite::{Scenario, Suite, SuiteSummary};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer};

use super::fixtures::*;

fn mysql_exporter_output(host: &str) -> String {
    catalog::mysql_expected_metrics()
        .iter()
        .map(|metric| catalog::mysql_series(metric, host))
        .collect::<Vec<_>>()
        .join("\n")
}

fn system_series(target: SystemTarget, host: &str) -> Vec<serde_json::Value> {
    target
        .expected_metrics()
        .iter()
        .map(|name| series(json!({ "__name__": name, "host": host })))
        .collect()
}

fn fleet() -> Vec<Minion> {
    vec![
        Minion::new("ctl01.mcp.local", &["etcd"])
            .with_pillar("etcd:server:bind:host", json!("10.167.4.11")),
        Minion::new("ctl02.mcp.local", &["etcd"])
            .with_pillar("etcd:server:bind:host", json!("10.167.4.12")),
        Minion::new("dbs01.mcp.local", &["galera"])
            .with_command(catalog::MYSQL_EXPORTER_COMMAND, mysql_exporter_output("dbs01")),
        Minion::new("mon01.mcp.local", &["prometheus"]),
    ]
}

async fn mount_healthy_stack(prometheus: &MockServer) {
    mount_query(
        prometheus,
        catalog::ETCD_HAS_LEADER,
        vec![
            series(json!({ "__name__": "etcd_server_has_leader", "instance": "10.167.4.11:4001" })),
            series(json!({ "__name__": "etcd_server_has_leader", "instance": "10.167.4.12:4001" })),
        ],
    )
    .await;

    let uptime = ["ctl01", "ctl02", "dbs01", "mon01"]
        .iter()
        .map(|host| series(json!({ "__name__": "system_uptime", "host": host })))
        .collect();
    mount_query(prometheus, catalog::SYSTEM_UPTIME, uptime).await;

    mount_query(
        prometheus,
        catalog::PROMETHEUS_BUILD_INFO,
        vec![series(json!({ "__name__": "prometheus_build_info", "version": "2.2.1" }))],
    )
    .await;

    for host in ["ctl01", "ctl02", "dbs01", "mon01"] {
        let query = SystemTarget::Mem.host_query(host);
        mount_query(prometheus, query.as_str(), system_series(SystemTarget::Mem, host)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_healthy_stack_passes() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let main_span = tracing::info_span!("test_healthy_stack_passes");
    let _ = main_span.enter();

    let prometheus = MockServer::start().await;
    let salt = MockServer::start().await;
    FakeSaltMaster::new(fleet()).mount(&salt).await;
    mount_healthy_stack(&prometheus).await;

    let context = ScenarioContext::new(
        prometheus_context(&prometheus),
        salt_context(&salt),
        ExcludedHosts::default(),
        quick_poll(),
    );
    let selection = assert_ok!(Scenario::select(&[
        "etcd_metrics",
        "telegraf_metrics",
        "prometheus_metrics",
        "system_metrics[mem]",
        "k8s_metrics",
        "mysql_metrics",
    ]));

    let reports = Suite::new(context).run(&selection).await;
    for report in reports.iter() {
        tracing::info!(%report, "scenario report");
    }

    let summary = SuiteSummary::from_reports(&reports);
    assert_eq!(summary, SuiteSummary { passed: 5, skipped: 1, failed: 0 });
    assert_eq!(summary.exit_code(), 0);

    let k8s = assert_some!(reports.iter().find(|r| r.scenario == Scenario::Kubernetes));
    assert_eq!(
        assert_ok!(k8s.result.as_ref()),
        &Outcome::skipped("There are no kubernetes nodes in the cluster")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_host_without_telegraf_fails_and_unresponsive_minion_is_ignored() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let main_span = tracing::info_span!("test_host_without_telegraf_fails_and_unresponsive_minion_is_ignored");
    let _ = main_span.enter();

    let prometheus = MockServer::start().await;
    let salt = MockServer::start().await;
    FakeSaltMaster::new(vec![
        Minion::new("cmp001.mcp.local", &[]),
        Minion::new("cmp002.mcp.local", &[]),
        Minion::new("cmp003.mcp.local", &[]).unresponsive(),
    ])
    .mount(&salt)
    .await;

    mount_query(
        &prometheus,
        catalog::SYSTEM_UPTIME,
        vec![series(json!({ "__name__": "system_uptime", "host": "cmp001" }))],
    )
    .await;

    let context = ScenarioContext::new(
        prometheus_context(&prometheus),
        salt_context(&salt),
        ExcludedHosts::default(),
        quick_poll(),
    );

    match assert_err!(context.telegraf_metrics().await) {
        CheckError::HostMismatch { missing, unexpected, .. } => {
            assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["cmp002".to_string()]);
            assert!(unexpected.is_empty());
        },
        err => panic!("expected host mismatch but got: {err:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_system_metrics_wait_for_late_series_and_skip_excluded_hosts() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let main_span = tracing::info_span!("test_system_metrics_wait_for_late_series_and_skip_excluded_hosts");
    let _ = main_span.enter();

    let prometheus = MockServer::start().await;
    let salt = MockServer::start().await;
    FakeSaltMaster::new(vec![
        Minion::new("cmp001.mcp.local", &[]),
        Minion::new("cmp0010.mcp.local", &[]),
    ])
    .mount(&salt)
    .await;

    let complete = system_series(SystemTarget::Swap, "cmp001");
    let partial: Vec<_> = complete.iter().take(3).cloned().collect();
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", SystemTarget::Swap.host_query("cmp001").as_str()))
        .respond_with(EventuallyComplete::new(2, partial, complete))
        .expect(3)
        .mount(&prometheus)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", SystemTarget::Swap.host_query("cmp0010").as_str()))
        .respond_with(vector_response(&[]))
        .expect(0)
        .mount(&prometheus)
        .await;

    let context = ScenarioContext::new(
        prometheus_context(&prometheus),
        salt_context(&salt),
        ExcludedHosts::parse("cmp0010"),
        quick_poll(),
    );

    assert_eq!(assert_ok!(context.system_metrics(SystemTarget::Swap).await), Outcome::Passed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_system_metrics_time_out() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let main_span = tracing::info_span!("test_system_metrics_time_out");
    let _ = main_span.enter();

    let prometheus = MockServer::start().await;
    let salt = MockServer::start().await;
    FakeSaltMaster::new(vec![Minion::new("cmp001.mcp.local", &[])]).mount(&salt).await;

    let partial: Vec<_> = system_series(SystemTarget::Cpu, "cmp001").into_iter().skip(1).collect();
    mount_query(&prometheus, SystemTarget::Cpu.host_query("cmp001").as_str(), partial).await;

    let context = ScenarioContext::new(
        prometheus_context(&prometheus),
        salt_context(&salt),
        ExcludedHosts::default(),
        quick_poll(),
    );

    let report = Suite::new(context).run_scenario(Scenario::System(SystemTarget::Cpu)).await;
    assert!(report.is_failure());
    match assert_err!(report.result) {
        CheckError::Timeout(timeout) => {
            assert_eq!(timeout.message, "Timed out waiting to get all metrics");
            assert!(quick_poll().timeout <= timeout.elapsed);
            assert!(1 < timeout.attempts);
        },
        err => panic!("expected timeout but got: {err:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mysql_missing_series_fail() {
    once_cell::sync::Lazy::force(&stackverify::telemetry::TEST_TRACING);
    let main_span = tracing::info_span!("test_mysql_missing_series_fail");
    let _ = main_span.enter();

    let prometheus = MockServer::start().await;
    let salt = MockServer::start().await;
    let output = mysql_exporter_output("dbs01")
        .lines()
        .filter(|line| !line.starts_with("mysql_wsrep_ready{"))
        .collect::<Vec<_>>()
        .join("\n");
    FakeSaltMaster::new(vec![
        Minion::new("dbs01.mcp.local", &["galera"]).with_command(catalog::MYSQL_EXPORTER_COMMAND, output)
    ])
    .mount(&salt)
    .await;

    let context = ScenarioContext::new(
        prometheus_context(&prometheus),
        salt_context(&salt),
        ExcludedHosts::default(),
        quick_poll(),
    );

    match assert_err!(context.mysql_metrics().await) {
        CheckError::MissingSeries { host, missing } => {
            assert_eq!(host, "dbs01");
            assert_eq!(
                missing,
                vec![r#"mysql_wsrep_ready{host="dbs01",server="/var/run/mysqld/mysqld.sock"}"#.to_string()]
            );
        },
        err => panic!("expected missing series but got: {err:?}"),
    }
}

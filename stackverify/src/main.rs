use std::future::Future;

use clap::Parser;
use once_cell::sync::Lazy;
use prometheus::Registry;
use stackverify::prometheus_api::PrometheusContext;
use stackverify::salt::SaltContext;
use stackverify::scenario::ScenarioContext;
use stackverify::settings::{CliOptions, Settings};
use stackverify::suite::{Scenario, Suite, SuiteSummary};
use stackverify::{metrics, telemetry, Result};

static METRICS_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    Registry::new_custom(Some("stackverify".to_string()), None).expect("failed to create prometheus registry")
});

fn main() -> Result<()> {
    let subscriber = telemetry::get_subscriber("stackverify", "info", std::io::stdout);
    telemetry::init_subscriber(subscriber);

    let main_span = tracing::trace_span!("main");
    let _main_span_guard = main_span.enter();

    let options = CliOptions::parse();
    let settings = Settings::load(&options)?;
    let selection = Scenario::select(options.scenarios.as_slice())?;
    metrics::register_metrics(&METRICS_REGISTRY)?;

    let summary = start_suite(async move {
        let prometheus = PrometheusContext::from_settings(&settings.prometheus)?;
        let salt = SaltContext::from_settings(&settings.salt)?;
        let context = ScenarioContext::new(prometheus, salt, settings.skip_nodes.clone(), settings.poll.clone());

        tracing::info!(
            scenarios=?selection.iter().map(Scenario::id).collect::<Vec<_>>(),
            excluded_hosts=%settings.skip_nodes,
            "starting stack verification..."
        );
        let reports = Suite::new(context).run(&selection).await;
        for report in reports.iter() {
            println!("{report}");
        }

        let summary = SuiteSummary::from_reports(&reports);
        tracing::info!(%summary, "stack verification finished.");
        println!("{summary}");
        Ok(summary)
    })?;

    if let Some(ref metrics_file) = options.metrics_file {
        let exposition = metrics::render_text(&METRICS_REGISTRY)?;
        std::fs::write(metrics_file, exposition)?;
        tracing::info!(?metrics_file, "wrote run metrics");
    }

    if !summary.is_success() {
        std::process::exit(summary.exit_code());
    }

    Ok(())
}

#[tracing::instrument(level="trace", skip(future), fields(worker_threads=num_cpus::get()))]
fn start_suite<F>(future: F) -> Result<SuiteSummary>
where
    F: Future<Output = Result<SuiteSummary>>,
{
    let worker_threads = num_cpus::get();
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?
        .block_on(future)
}

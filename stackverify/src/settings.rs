use std::path::{Path, PathBuf};

use clap::Parser;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod excluded_hosts;
mod http_client_settings;
mod poll_settings;
mod prometheus_settings;
mod salt_settings;

pub use excluded_hosts::ExcludedHosts;
pub use http_client_settings::HttpClientSettings;
pub use poll_settings::PollSettings;
pub use prometheus_settings::PrometheusSettings;
pub use salt_settings::SaltSettings;

pub const APP_ENVIRONMENT: &str = "APP_ENVIRONMENT";
pub const SKIP_NODES: &str = "SKIP_NODES";
const ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_RESOURCES_DIR: &str = "./resources";
const APPLICATION_CONFIG: &str = "application";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid http header name in settings: {0}")]
    HeaderName(#[from] reqwest::header::InvalidHeaderName),

    #[error("invalid http header value in settings: {0}")]
    HeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("invalid url in settings: {0}")]
    Url(#[from] url::ParseError),

    #[error("settings url cannot be a base to query: {0}")]
    UrlCannotBeBase(url::Url),

    #[error("invalid {setting} setting: {reason}")]
    Invalid { setting: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Settings {
    #[serde(default)]
    pub prometheus: PrometheusSettings,
    #[serde(default)]
    pub salt: SaltSettings,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub skip_nodes: ExcludedHosts,
}

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Parser, Clone, Debug, Default, PartialEq, Eq)]
#[clap(author, version, about)]
pub struct CliOptions {
    /// override environment-based configuration file to load.
    /// Default behavior is to load configuration based on `APP_ENVIRONMENT` envvar.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// specify path to secrets configuration file
    #[clap(short, long)]
    pub secrets: Option<PathBuf>,

    #[clap(short, long, value_enum)]
    pub environment: Option<Environment>,

    /// Override default location from which to load configuration files. Default directory is
    /// ./resources.
    #[clap(short, long)]
    pub resources: Option<PathBuf>,

    /// Hosts to leave out of per-host metric checks, as a comma or whitespace delimited list of
    /// short hostnames. Takes precedence over the `SKIP_NODES` environment variable.
    #[clap(long)]
    pub skip_nodes: Option<String>,

    /// Run only the named scenario; may be repeated. All scenarios run by default.
    #[clap(long = "scenario")]
    pub scenarios: Vec<String>,

    /// Write the run's instrumentation in prometheus text format to this file.
    #[clap(long)]
    pub metrics_file: Option<PathBuf>,
}

impl CliOptions {
    fn resources_path(&self) -> PathBuf {
        self.resources.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCES_DIR))
    }

    fn environment(&self) -> Result<Option<Environment>, SettingsError> {
        if self.environment.is_some() {
            return Ok(self.environment);
        }

        match std::env::var(APP_ENVIRONMENT) {
            Ok(rep) => rep.parse().map(Some).map_err(|_| SettingsError::Invalid {
                setting: APP_ENVIRONMENT.to_string(),
                reason: format!("unrecognized environment: {rep}"),
            }),
            Err(_) => Ok(None),
        }
    }

    fn load_overrides(
        &self, config: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        let skip_nodes = self.skip_nodes.clone().or_else(|| std::env::var(SKIP_NODES).ok());
        let config = match skip_nodes {
            None => config,
            Some(skip_nodes) => config.set_override("skip_nodes", skip_nodes)?,
        };

        Ok(config)
    }
}

impl Settings {
    /// Layers configuration sources, later sources overriding earlier:
    /// `application.ron`, `<environment>.ron` from the resources directory, the explicit config
    /// file, the secrets file, `APP__`-prefixed environment variables, then command line overrides.
    #[tracing::instrument(level = "info")]
    pub fn load(options: &CliOptions) -> Result<Self, SettingsError> {
        let resources = options.resources_path();
        let mut builder = config::Config::builder()
            .add_source(Self::resource_file(&resources, APPLICATION_CONFIG).required(false));

        if let Some(environment) = options.environment()? {
            tracing::info!(%environment, "loading environment configuration");
            builder = builder.add_source(Self::resource_file(&resources, environment.to_string()).required(false));
        }

        if let Some(ref path) = options.config {
            tracing::info!(config_path=?path, "loading explicit configuration file");
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        if let Some(ref path) = options.secrets {
            tracing::info!(secrets_path=?path, "loading secrets");
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR),
        );
        builder = options.load_overrides(builder)?;

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.poll.validate()?;
        self.prometheus.base_url()?;
        self.salt.base_url()?;
        Ok(())
    }

    fn resource_file(
        resources: &Path, name: impl AsRef<str>,
    ) -> config::File<config::FileSourceFile, config::FileFormat> {
        let path = resources.join(format!("{}.ron", name.as_ref()));
        config::File::from(path)
    }
}

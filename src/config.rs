//! Application configuration loaded from environment variables.

use std::collections::{HashMap, HashSet};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Development default values - NEVER rely on these in production.
pub mod defaults {
    pub const DEV_HOST: &str = "0.0.0.0";
    pub const DEV_PORT: u16 = 9091;
    pub const METRICS_FILE: &str = "monitoring/metrics/test_metrics.txt";
    pub const SUMMARY_JSON: &str = "monitoring/metrics/test_metrics.json";
    pub const ROOT_PATH: &str = ".";
    pub const SERVICES: &[&str] = &[
        "user_service",
        "product_service",
        "drone_service",
        "order_service",
        "payment_service",
        "restaurant-service",
    ];
    pub const REPORT_GLOB: &str = "target/surefire-reports/TEST-*.xml";
    pub const METRIC_PREFIX: &str = "test_";
    pub const RUNNER_TIMEOUT_SECS: u64 = 600;

    pub const DEV_GRAFANA_URL: &str = "http://localhost:3000";
    pub const DEV_GRAFANA_USER: &str = "admin";
    pub const DEV_GRAFANA_PASSWORD: &str = "admin";
    pub const GRAFANA_DASHBOARD_FILE: &str = "monitoring/test-dashboard.json";
    pub const GRAFANA_READY_TIMEOUT_SECS: u64 = 60;
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// HTTP metrics server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Prometheus text artifact served on `/metrics`
    pub metrics_file: PathBuf,
}

impl ServerConfig {
    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Options for one report-to-metrics pipeline run.
///
/// Everything the pipeline touches is named here; there is no process-wide
/// state behind it.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory containing one sub-directory per service
    pub root_path: PathBuf,
    /// Ordered service identifiers; output follows this order
    pub services: Vec<String>,
    /// Glob relative to `<root>/<service>/` selecting report files
    pub report_glob: String,
    /// Prometheus text artifact destination
    pub output_path: PathBuf,
    /// Optional JSON run summary destination
    pub summary_json_path: Option<PathBuf>,
    /// Prefix for every emitted metric name
    pub metric_prefix: String,
    /// Append a single capture timestamp to every sample
    pub emit_timestamps: bool,
    /// Optional coverage summary path relative to `<root>/<service>/`
    pub coverage_file: Option<PathBuf>,
}

impl PipelineOptions {
    /// Options with the conventional Maven layout under `root_path`.
    pub fn new(root_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        PipelineOptions {
            root_path: root_path.into(),
            services: defaults::SERVICES.iter().map(|s| s.to_string()).collect(),
            report_glob: defaults::REPORT_GLOB.to_string(),
            output_path: output_path.into(),
            summary_json_path: None,
            metric_prefix: defaults::METRIC_PREFIX.to_string(),
            emit_timestamps: true,
            coverage_file: None,
        }
    }

    /// Replace the service list.
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = services.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the report glob.
    pub fn with_report_glob(mut self, glob: impl Into<String>) -> Self {
        self.report_glob = glob.into();
        self
    }

    /// Check the options before a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.services.is_empty() {
            return Err(ConfigError::InvalidValue(
                "at least one service must be configured",
            ));
        }
        if self.services.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue("service names must not be empty"));
        }
        let mut seen = HashSet::new();
        if !self.services.iter().all(|s| seen.insert(s.as_str())) {
            return Err(ConfigError::InvalidValue("service names must be unique"));
        }
        if !is_valid_metric_prefix(&self.metric_prefix) {
            return Err(ConfigError::InvalidValue(
                "TMS_METRIC_PREFIX must match [a-zA-Z_:][a-zA-Z0-9_:]*",
            ));
        }
        glob::Pattern::new(&self.report_glob)
            .map_err(|e| ConfigError::InvalidPattern(self.report_glob.clone(), e.to_string()))?;
        Ok(())
    }
}

/// The prefix must yield valid metric names, e.g. `<prefix>count_total`.
fn is_valid_metric_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prometheus::core::Desc::new(
            format!("{}count_total", prefix),
            "Total number of tests".to_string(),
            Vec::new(),
            HashMap::new(),
        )
        .is_ok()
}

/// Grafana API settings for the dashboard importer.
#[derive(Debug, Clone)]
pub struct GrafanaSettings {
    /// Base URL, e.g. `http://localhost:3000`
    pub url: String,
    /// Basic-auth user
    pub user: String,
    /// Basic-auth password
    pub password: SecretString,
    /// Dashboard definition JSON file
    pub dashboard_file: PathBuf,
    /// How long to wait for `/api/health` before giving up
    pub ready_timeout: Duration,
}

/// Test-execution runner settings.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Explicit test command; Maven is autodetected when unset
    pub command: Option<Vec<String>>,
    /// Per-service timeout
    pub timeout: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// HTTP metrics server
    pub server: ServerConfig,
    /// Report pipeline
    pub pipeline: PipelineOptions,
    /// Grafana dashboard importer
    pub grafana: GrafanaSettings,
    /// Test runner
    pub runner: RunnerSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: development/production (default: development)
    /// - `TMS_HOST`, `TMS_PORT`: metrics server bind address (default: 0.0.0.0:9091)
    /// - `TMS_METRICS_FILE`: Prometheus text artifact
    /// - `TMS_SUMMARY_JSON`: JSON run summary, `none` disables it
    /// - `TMS_ROOT_PATH`: directory holding the service directories
    /// - `TMS_SERVICES`: comma-separated ordered service list
    /// - `TMS_REPORT_GLOB`: report glob relative to each service directory
    /// - `TMS_METRIC_PREFIX`: metric name prefix (default: `test_`)
    /// - `TMS_EMIT_TIMESTAMPS`: append sample timestamps (default: true)
    /// - `TMS_COVERAGE_FILE`: coverage summary relative to each service directory
    /// - `TMS_RUNNER_COMMAND`: whitespace-separated test command
    /// - `TMS_RUNNER_TIMEOUT_SECS`: per-service test timeout (default: 600)
    /// - `GRAFANA_URL`, `GRAFANA_USER`, `GRAFANA_PASSWORD`
    /// - `GRAFANA_DASHBOARD_FILE`, `GRAFANA_READY_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match var("RUST_ENV") {
            Some(s) => Environment::parse(&s).ok_or(ConfigError::InvalidValue(
                "RUST_ENV must be 'development' or 'production'",
            ))?,
            None => Environment::Development,
        };

        let port = var("TMS_PORT")
            .unwrap_or_else(|| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("TMS_PORT must be a valid port number"))?;

        let metrics_file =
            PathBuf::from(var("TMS_METRICS_FILE").unwrap_or_else(|| defaults::METRICS_FILE.into()));

        let server = ServerConfig {
            host: var("TMS_HOST").unwrap_or_else(|| defaults::DEV_HOST.to_string()),
            port,
            metrics_file: metrics_file.clone(),
        };

        let services = match var("TMS_SERVICES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => defaults::SERVICES.iter().map(|s| s.to_string()).collect(),
        };

        let summary_json_path = match var("TMS_SUMMARY_JSON") {
            Some(v) if v.eq_ignore_ascii_case("none") => None,
            Some(v) => Some(PathBuf::from(v)),
            None => Some(PathBuf::from(defaults::SUMMARY_JSON)),
        };

        let emit_timestamps = match var("TMS_EMIT_TIMESTAMPS") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::InvalidValue(
                "TMS_EMIT_TIMESTAMPS must be true or false",
            ))?,
            None => true,
        };

        let pipeline = PipelineOptions {
            root_path: PathBuf::from(var("TMS_ROOT_PATH").unwrap_or_else(|| defaults::ROOT_PATH.into())),
            services,
            report_glob: var("TMS_REPORT_GLOB").unwrap_or_else(|| defaults::REPORT_GLOB.into()),
            output_path: metrics_file,
            summary_json_path,
            metric_prefix: var("TMS_METRIC_PREFIX")
                .unwrap_or_else(|| defaults::METRIC_PREFIX.into()),
            emit_timestamps,
            coverage_file: var("TMS_COVERAGE_FILE").map(PathBuf::from),
        };
        pipeline.validate()?;

        let ready_timeout_secs = var("GRAFANA_READY_TIMEOUT_SECS")
            .unwrap_or_else(|| defaults::GRAFANA_READY_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("GRAFANA_READY_TIMEOUT_SECS must be a valid number")
            })?;

        let grafana = GrafanaSettings {
            url: var("GRAFANA_URL")
                .unwrap_or_else(|| defaults::DEV_GRAFANA_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            user: var("GRAFANA_USER").unwrap_or_else(|| defaults::DEV_GRAFANA_USER.to_string()),
            password: SecretString::from(
                var("GRAFANA_PASSWORD").unwrap_or_else(|| defaults::DEV_GRAFANA_PASSWORD.into()),
            ),
            dashboard_file: PathBuf::from(
                var("GRAFANA_DASHBOARD_FILE")
                    .unwrap_or_else(|| defaults::GRAFANA_DASHBOARD_FILE.into()),
            ),
            ready_timeout: Duration::from_secs(ready_timeout_secs),
        };

        let runner_timeout_secs = var("TMS_RUNNER_TIMEOUT_SECS")
            .unwrap_or_else(|| defaults::RUNNER_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("TMS_RUNNER_TIMEOUT_SECS must be a valid number")
            })?;

        let runner = RunnerSettings {
            command: var("TMS_RUNNER_COMMAND")
                .map(|c| c.split_whitespace().map(String::from).collect()),
            timeout: Duration::from_secs(runner_timeout_secs),
        };

        let config = Config {
            environment,
            server,
            pipeline,
            grafana,
            runner,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.grafana.password.expose_secret() == defaults::DEV_GRAFANA_PASSWORD {
            errors.push(
                "GRAFANA_PASSWORD is using the development default. Set the real admin password."
                    .to_string(),
            );
        }

        if self.grafana.url == defaults::DEV_GRAFANA_URL {
            errors.push(format!(
                "GRAFANA_URL is using development default '{}'.",
                defaults::DEV_GRAFANA_URL
            ));
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid report glob '{0}': {1}")]
    InvalidPattern(String, String),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}

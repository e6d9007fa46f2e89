//! Import a dashboard definition into Grafana.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;
use tracing::{error, info};

use test_metrics_lib::config::Config;
use test_metrics_lib::services::dashboard::{GrafanaClient, READY_POLL_INTERVAL, load_dashboard};
use test_metrics_lib::telemetry;

#[derive(Debug, Parser)]
#[command(name = "import-dashboard", version, about = "Import a Grafana dashboard")]
struct Cli {
    /// Dashboard JSON file (GRAFANA_DASHBOARD_FILE)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Grafana base URL (GRAFANA_URL)
    #[arg(long)]
    url: Option<String>,

    /// Basic-auth user (GRAFANA_USER)
    #[arg(long)]
    user: Option<String>,

    /// Basic-auth password (GRAFANA_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// Seconds to wait for Grafana to become ready (GRAFANA_READY_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,

    /// Version message stored with the dashboard
    #[arg(long, default_value = "Imported test metrics dashboard")]
    message: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    if let Err(e) = telemetry::init_tracing() {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut grafana = config.grafana;
    if let Some(url) = cli.url {
        grafana.url = url.trim_end_matches('/').to_string();
    }
    if let Some(user) = cli.user {
        grafana.user = user;
    }
    if let Some(password) = cli.password {
        grafana.password = SecretString::from(password);
    }
    if let Some(file) = cli.file {
        grafana.dashboard_file = file;
    }
    if let Some(timeout) = cli.timeout {
        grafana.ready_timeout = Duration::from_secs(timeout);
    }

    let dashboard = match load_dashboard(&grafana.dashboard_file) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("Cannot load dashboard: {}", e);
            return ExitCode::from(1);
        }
    };

    let client = match GrafanaClient::new(&grafana) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };

    info!("Waiting for Grafana at {}", client.base_url());
    if let Err(e) = client
        .wait_until_ready(grafana.ready_timeout, READY_POLL_INTERVAL)
        .await
    {
        error!("Cannot proceed without Grafana: {}", e);
        return ExitCode::from(1);
    }

    match client.import_dashboard(dashboard, &cli.message).await {
        Ok(result) => {
            info!("Dashboard imported successfully");
            if let Some(link) = client.dashboard_link(&result) {
                info!("  Dashboard URL: {}", link);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to import dashboard: {}", e);
            ExitCode::from(1)
        }
    }
}

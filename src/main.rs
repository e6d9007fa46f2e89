//! Test Metrics Server - Main entry point.
//!
//! Serves the pipeline's Prometheus artifact on `/metrics` and a liveness
//! probe on `/health`.

use std::path::PathBuf;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use tracing::{error, info, warn};

use test_metrics_lib::api::{self, MetricsSource};
use test_metrics_lib::config::Config;
use test_metrics_lib::middleware::RequestLogger;
use test_metrics_lib::telemetry;

#[derive(Debug, Parser)]
#[command(name = "test-metrics-server", version, about = "Serve test metrics to Prometheus")]
struct Cli {
    /// Exit 0 when the configuration loads, 1 otherwise (Docker HEALTHCHECK)
    #[arg(long)]
    health_check: bool,

    /// Bind host, overrides TMS_HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides TMS_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Artifact to serve, overrides TMS_METRICS_FILE
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    if cli.health_check {
        std::process::exit(if Config::from_env().is_ok() { 0 } else { 1 });
    }

    if let Err(e) = telemetry::init_tracing() {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let mut config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be 'development' or 'production'");
            error!("  - TMS_PORT must be a valid port number");
            error!("  - In production, GRAFANA_URL and GRAFANA_PASSWORD must not use defaults");
            std::process::exit(1);
        }
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(metrics_file) = cli.metrics_file {
        config.server.metrics_file = metrics_file;
    }

    info!("========================================");
    info!("  Test Metrics Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let source = MetricsSource::new(config.server.metrics_file.clone());
    if !source.path.exists() {
        warn!(
            "Metrics file {} does not exist yet; serving placeholder until the exporter runs",
            source.path.display()
        );
    }
    info!("Serving {}", source.path.display());

    let bind_address = config.server.bind_address();
    let worker_count = if config.is_development() {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };
    info!("  Metrics: http://{}/metrics", bind_address);
    info!("  Health:  http://{}/health", bind_address);

    let source = web::Data::new(source);
    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(source.clone())
            .configure(api::configure_routes)
            .default_service(web::route().to(api::not_found))
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}

//! Run the report-to-metrics pipeline once.
//!
//! Exit codes: 0 all tests passed, 1 at least one test failed, 2 the run itself failed.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use test_metrics_lib::cli::PipelineArgs;
use test_metrics_lib::config::Config;
use test_metrics_lib::services::MetricsPipeline;
use test_metrics_lib::telemetry;

#[derive(Debug, Parser)]
#[command(
    name = "export-test-metrics",
    version,
    about = "Parse test reports and write Prometheus metrics"
)]
struct Cli {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Exit 0 even when tests failed
    #[arg(long)]
    allow_failures: bool,

    /// Print the JSON run report to stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    if let Err(e) = telemetry::init_tracing() {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let mut config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    cli.pipeline.apply(&mut config.pipeline);

    let report = match MetricsPipeline::new(config.pipeline).run() {
        Ok(report) => report,
        Err(e) => {
            error!("Metrics export failed: {}", e);
            return ExitCode::from(2);
        }
    };

    for diagnostic in &report.diagnostics {
        warn!(
            service = %diagnostic.service_id,
            kind = ?diagnostic.kind,
            "{}: {}",
            diagnostic.path.display(),
            diagnostic.message
        );
    }

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize run report: {}", e),
        }
    }

    if report.has_failures() && !cli.allow_failures {
        info!("{} test(s) failed", report.summary.failed_tests);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

//! One report-to-metrics run: locate, normalize, aggregate, emit, write.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineOptions;
use crate::error::{AppError, AppResult};
use crate::models::{CoverageSummary, Diagnostic, OverallSummary, ReportRecord, ServiceSummary};
use crate::services::aggregator::aggregate;
use crate::services::emitter::{build_document, write_atomically};
use crate::services::locator::locate_reports;
use crate::services::normalizer::{normalize_coverage, normalize_report};

/// Outcome of one pipeline run. Also the body of the JSON run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Capture instant shared by every emitted sample
    pub timestamp: DateTime<Utc>,
    pub services: Vec<ServiceSummary>,
    pub summary: OverallSummary,
    pub coverage: Vec<CoverageSummary>,
    pub diagnostics: Vec<Diagnostic>,
    pub metrics_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_file: Option<PathBuf>,
}

impl RunReport {
    /// True when at least one test failed or errored.
    pub fn has_failures(&self) -> bool {
        self.summary.failed_tests > 0
    }
}

/// The report-to-metrics pipeline bound to one set of options.
#[derive(Debug, Clone)]
pub struct MetricsPipeline {
    options: PipelineOptions,
}

impl MetricsPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the pipeline, stamping samples with the current time.
    pub fn run(&self) -> AppResult<RunReport> {
        self.run_at(Utc::now())
    }

    /// Run the pipeline with an explicit capture instant.
    ///
    /// Per-file and per-service problems end up in `RunReport::diagnostics`.
    /// Only a failed artifact write is returned as an error.
    pub fn run_at(&self, captured_at: DateTime<Utc>) -> AppResult<RunReport> {
        self.options.validate()?;
        let options = &self.options;

        let mut diagnostics = Vec::new();
        let mut records: HashMap<String, Vec<ReportRecord>> = HashMap::new();
        let mut coverage = Vec::new();

        for service in &options.services {
            let files = locate_reports(
                &options.root_path,
                service,
                &options.report_glob,
                &mut diagnostics,
            );
            if files.is_empty() {
                warn!(service = %service, "No test reports found");
            }

            let service_records = files
                .iter()
                .map(|path| normalize_report(service, path, &mut diagnostics))
                .collect();
            records.insert(service.clone(), service_records);

            if let Some(coverage_file) = &options.coverage_file {
                let path = options.root_path.join(service).join(coverage_file);
                if let Some(summary) = normalize_coverage(service, &path, &mut diagnostics) {
                    coverage.push(summary);
                }
            }
        }

        let aggregate = aggregate(&options.services, &records);

        for service in &aggregate.services {
            info!(
                service = %service.service_id,
                total = service.total_tests,
                passed = service.passed_tests,
                failed = service.failed_tests,
                status = %service.status,
                "Service summary"
            );
        }

        let timestamp_ms = options
            .emit_timestamps
            .then(|| captured_at.timestamp_millis());
        let document = build_document(
            &options.metric_prefix,
            &aggregate.overall,
            &aggregate.services,
            &coverage,
            timestamp_ms,
        );
        document
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        write_atomically(&options.output_path, document.render().as_bytes())?;

        let report = RunReport {
            timestamp: captured_at,
            services: aggregate.services,
            summary: aggregate.overall,
            coverage,
            diagnostics,
            metrics_file: options.output_path.clone(),
            summary_file: options.summary_json_path.clone(),
        };

        if let Some(summary_path) = &options.summary_json_path {
            let json = serde_json::to_vec_pretty(&report)?;
            write_atomically(summary_path, &json)?;
        }

        info!(
            total = report.summary.total_tests,
            passed = report.summary.passed_tests,
            failed = report.summary.failed_tests,
            pass_rate = report.summary.pass_rate_percent,
            status = %report.summary.status,
            diagnostics = report.diagnostics.len(),
            "Metrics exported to {}",
            report.metrics_file.display()
        );

        Ok(report)
    }
}

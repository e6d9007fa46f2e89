//! Prometheus text serialization and atomic artifact writes.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{
    CoverageSummary, MetricDocument, OverallSummary, SampleValue, ServiceSummary,
};

/// Build the metric document for one run.
///
/// Families are emitted in a fixed order: overall metrics, per-service
/// metrics (in service order), per-suite metrics, then coverage.
pub fn build_document(
    prefix: &str,
    overall: &OverallSummary,
    services: &[ServiceSummary],
    coverage: &[CoverageSummary],
    timestamp_ms: Option<i64>,
) -> MetricDocument {
    let mut doc = MetricDocument::new(timestamp_ms);
    let name = |suffix: &str| format!("{}{}", prefix, suffix);

    doc.push(
        &name("count_total"),
        "Total number of tests across all services",
        &[],
        SampleValue::Integer(overall.total_tests),
    )
    .push(
        &name("pass_count"),
        "Number of passed tests",
        &[],
        SampleValue::Integer(overall.passed_tests),
    )
    .push(
        &name("fail_count"),
        "Number of failed tests including errors",
        &[],
        SampleValue::Integer(overall.failed_tests),
    )
    .push(
        &name("error_count"),
        "Number of tests that ended in an error",
        &[],
        SampleValue::Integer(overall.error_tests),
    )
    .push(
        &name("skipped_count"),
        "Number of skipped tests",
        &[],
        SampleValue::Integer(overall.skipped_tests),
    )
    .push(
        &name("pass_rate_percent"),
        "Percentage of tests that passed",
        &[],
        SampleValue::Fixed(overall.pass_rate_percent),
    )
    .push(
        &name("execution_time_seconds"),
        "Total test execution time in seconds",
        &[],
        SampleValue::Fixed(overall.duration_seconds),
    )
    .push(
        &name("services_count"),
        "Number of services tested",
        &[],
        SampleValue::Integer(overall.services_count),
    )
    .push(
        &name("status"),
        "Overall test status",
        &[("status", overall.status.as_str())],
        SampleValue::Integer(1),
    );

    for service in services {
        let id = service.service_id.as_str();
        let labels = [("service", id)];

        doc.push(
            &name("count_by_service"),
            "Number of tests by service",
            &labels,
            SampleValue::Integer(service.total_tests),
        )
        .push(
            &name("pass_count_by_service"),
            "Number of passed tests by service",
            &labels,
            SampleValue::Integer(service.passed_tests),
        )
        .push(
            &name("fail_count_by_service"),
            "Number of failed tests by service",
            &labels,
            SampleValue::Integer(service.failed_tests),
        )
        .push(
            &name("pass_rate_by_service"),
            "Pass rate percentage by service",
            &labels,
            SampleValue::Fixed(service.pass_rate_percent),
        )
        .push(
            &name("execution_time_by_service"),
            "Test execution time in seconds by service",
            &labels,
            SampleValue::Fixed(service.duration_seconds),
        )
        .push(
            &name("report_files_by_service"),
            "Number of report files parsed by service",
            &labels,
            SampleValue::Integer(service.report_files),
        )
        .push(
            &name("status_by_service"),
            "Test status by service",
            &[("service", id), ("status", service.status.as_str())],
            SampleValue::Integer(1),
        );
    }

    for service in services {
        for suite in &service.suites {
            let labels = [
                ("service", service.service_id.as_str()),
                ("suite", suite.name.as_str()),
            ];
            doc.push(
                &name("pass_count_by_suite"),
                "Number of passed tests by service and suite",
                &labels,
                SampleValue::Integer(suite.passed_tests),
            )
            .push(
                &name("fail_count_by_suite"),
                "Number of failed tests by service and suite",
                &labels,
                SampleValue::Integer(suite.failed_tests),
            );
        }
    }

    for summary in coverage {
        for (kind, percent) in summary.kinds() {
            doc.push(
                &name("coverage_percent"),
                "Code coverage percentage by service and kind",
                &[("service", summary.service_id.as_str()), ("kind", kind)],
                SampleValue::Fixed(percent),
            );
        }
    }

    doc
}

/// Write `contents` to `path` through a temporary file in the same directory.
///
/// Readers see either the previous artifact or the new one, never a partial file.
pub fn write_atomically(path: &Path, contents: &[u8]) -> AppResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(parent).map_err(|e| AppError::write_failure(path, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| AppError::write_failure(path, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| AppError::write_failure(path, e))?;
    tmp.persist(path)
        .map_err(|e| AppError::write_failure(path, e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "Artifact written");
    Ok(())
}

//! Folds report records into per-service and overall summaries.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{
    OverallSummary, ReportRecord, ServiceSummary, SuiteSummary, SummaryStatus, pass_rate_percent,
};

/// Durations are accumulated in whole microseconds so that the fold is
/// exactly independent of record order. Counts saturate at `u64::MAX`.
const MICROS_PER_SECOND: f64 = 1_000_000.0;

fn to_micros(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * MICROS_PER_SECOND).round() as u64
    } else {
        0
    }
}

fn from_micros(micros: u64) -> f64 {
    micros as f64 / MICROS_PER_SECOND
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    /// One summary per configured service, in configuration order
    pub services: Vec<ServiceSummary>,
    pub overall: OverallSummary,
}

#[derive(Debug, Default)]
struct Totals {
    total: u64,
    passed: u64,
    failed: u64,
    errors: u64,
    skipped: u64,
    micros: u64,
}

impl Totals {
    fn add_record(&mut self, record: &ReportRecord) {
        self.add(
            record.total,
            record.passed,
            record.failed,
            record.errors,
            record.skipped,
            to_micros(record.duration_seconds),
        );
    }

    fn add_service(&mut self, service: &ServiceSummary) {
        self.add(
            service.total_tests,
            service.passed_tests,
            service.failed_tests,
            service.error_tests,
            service.skipped_tests,
            to_micros(service.duration_seconds),
        );
    }

    fn add(&mut self, total: u64, passed: u64, failed: u64, errors: u64, skipped: u64, micros: u64) {
        self.total = self.total.saturating_add(total);
        self.passed = self.passed.saturating_add(passed);
        self.failed = self.failed.saturating_add(failed);
        self.errors = self.errors.saturating_add(errors);
        self.skipped = self.skipped.saturating_add(skipped);
        self.micros = self.micros.saturating_add(micros);
    }
}

/// Sum suites sharing a name across records, sorted by name.
fn merge_suites<'a>(records: impl Iterator<Item = &'a ReportRecord>) -> Vec<SuiteSummary> {
    let mut suites: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

    for suite in records.flat_map(|r| r.suites.iter()) {
        let entry = suites.entry(suite.name.as_str()).or_default();
        entry.0 = entry.0.saturating_add(suite.passed);
        entry.1 = entry.1.saturating_add(suite.failed);
    }

    suites
        .into_iter()
        .map(|(name, (passed, failed))| SuiteSummary {
            name: name.to_string(),
            passed_tests: passed,
            failed_tests: failed,
        })
        .collect()
}

/// Fold the records of one service.
///
/// Malformed sentinel records contribute nothing and do not count as found.
pub fn summarize_service(service_id: &str, records: &[ReportRecord]) -> ServiceSummary {
    let mut totals = Totals::default();
    let mut report_files = 0u64;
    let mut suspect_files = 0u64;

    for record in records.iter().filter(|r| !r.is_malformed()) {
        totals.add_record(record);
        report_files += 1;
        if record.is_suspect() {
            suspect_files += 1;
        }
    }

    let failed_tests = totals.failed.saturating_add(totals.errors);

    ServiceSummary {
        service_id: service_id.to_string(),
        total_tests: totals.total,
        passed_tests: totals.passed,
        failed_tests,
        error_tests: totals.errors,
        skipped_tests: totals.skipped,
        duration_seconds: from_micros(totals.micros),
        report_files,
        suspect_files,
        pass_rate_percent: pass_rate_percent(totals.passed, totals.total),
        status: SummaryStatus::derive(report_files > 0, totals.total, failed_tests),
        suites: merge_suites(records.iter().filter(|r| !r.is_malformed())),
    }
}

/// Sum service summaries into the overall summary.
///
/// The overall status is derived from the summed counts, so a service that
/// is FAIL only because it ran zero tests does not make the run FAIL.
pub fn summarize_overall(services: &[ServiceSummary]) -> OverallSummary {
    let mut totals = Totals::default();
    let mut found = false;

    for service in services {
        totals.add_service(service);
        found |= service.status != SummaryStatus::Unknown;
    }

    OverallSummary {
        total_tests: totals.total,
        passed_tests: totals.passed,
        failed_tests: totals.failed,
        error_tests: totals.errors,
        skipped_tests: totals.skipped,
        duration_seconds: from_micros(totals.micros),
        services_count: services.len() as u64,
        pass_rate_percent: pass_rate_percent(totals.passed, totals.total),
        status: SummaryStatus::derive(found, totals.total, totals.failed),
    }
}

/// Aggregate records for every configured service, in list order.
///
/// Services absent from `records` still get a zero summary with status UNKNOWN.
pub fn aggregate(services: &[String], records: &HashMap<String, Vec<ReportRecord>>) -> Aggregate {
    let services: Vec<ServiceSummary> = services
        .iter()
        .map(|service| {
            let service_records = records.get(service).map(Vec::as_slice).unwrap_or_default();
            summarize_service(service, service_records)
        })
        .collect();

    let overall = summarize_overall(&services);
    Aggregate { services, overall }
}

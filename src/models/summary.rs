//! Per-service and overall test summaries.

use serde::Serialize;

/// Outcome of a service or of the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryStatus {
    Pass,
    Fail,
    /// No reports were found
    Unknown,
}

impl SummaryStatus {
    /// Derive the status from folded counts.
    pub fn derive(has_records: bool, total: u64, failed: u64) -> Self {
        if !has_records {
            SummaryStatus::Unknown
        } else if failed == 0 && total > 0 {
            SummaryStatus::Pass
        } else {
            SummaryStatus::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStatus::Pass => "PASS",
            SummaryStatus::Fail => "FAIL",
            SummaryStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `passed / total * 100` rounded to 2 decimals, `0` when there are no tests.
pub fn pass_rate_percent(passed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(passed as f64 / total as f64 * 100.0)
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregate over all report records of one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub service_id: String,
    pub total_tests: u64,
    pub passed_tests: u64,
    /// Failures plus errors
    pub failed_tests: u64,
    pub error_tests: u64,
    pub skipped_tests: u64,
    pub duration_seconds: f64,
    /// Number of report files folded in (malformed files excluded)
    pub report_files: u64,
    /// Records whose counts had to be clamped
    pub suspect_files: u64,
    pub pass_rate_percent: f64,
    pub status: SummaryStatus,
    /// Per-suite breakdown, sorted by suite name
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suites: Vec<SuiteSummary>,
}

/// Counts of one suite name summed over a service's reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    pub name: String,
    pub passed_tests: u64,
    pub failed_tests: u64,
}

/// Sum of all service summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallSummary {
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    pub error_tests: u64,
    pub skipped_tests: u64,
    pub duration_seconds: f64,
    pub services_count: u64,
    pub pass_rate_percent: f64,
    pub status: SummaryStatus,
}

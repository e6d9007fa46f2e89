//! Report normalization: one file in, one `ReportRecord` out.
//!
//! Parse failures never reach the caller. A file that cannot be read or parsed
//! becomes a malformed zero record plus a diagnostic, so one corrupt report
//! never blocks metric export for the rest of the batch.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::coverage::CoverageDocument;
use crate::models::{
    CoverageSummary, Diagnostic, DiagnosticKind, RawCounts, ReportFormat, ReportRecord,
    SuiteCounts, SuspectReason,
};

/// Per-file parse errors. Converted into diagnostics, never returned by [`normalize_report`].
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no <testsuite> or <testsuites> root element")]
    MissingRoot,

    #[error("unexpected root element <{0}>")]
    UnexpectedRoot(String),

    #[error("attribute {attribute}=\"{value}\" is not a valid number")]
    InvalidNumber { attribute: String, value: String },

    #[error("sum of {0} attributes overflows")]
    CountOverflow(&'static str),

    #[error("unsupported report extension")]
    UnsupportedFormat,
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse one report file. Always returns a record.
pub fn normalize_report(
    service_id: &str,
    path: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> ReportRecord {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ReportFormat::from_extension);

    let Some(format) = format else {
        warn!(service = %service_id, "Unsupported report file {}", path.display());
        diagnostics.push(Diagnostic::new(
            service_id,
            path,
            DiagnosticKind::Malformed,
            NormalizeError::UnsupportedFormat.to_string(),
        ));
        return ReportRecord::malformed(service_id, path, ReportFormat::JunitXml);
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(service = %service_id, "Error reading {}: {}", path.display(), e);
            diagnostics.push(Diagnostic::new(
                service_id,
                path,
                DiagnosticKind::Unreadable,
                e.to_string(),
            ));
            return ReportRecord::malformed(service_id, path, format);
        }
    };

    let parsed = match format {
        ReportFormat::JunitXml => parse_junit_xml(service_id, path, &content),
        ReportFormat::JestJson => parse_jest_json(service_id, path, &content),
    };

    match parsed {
        Ok(record) => {
            if record.is_suspect() {
                warn!(
                    service = %service_id,
                    total = record.total,
                    failed = record.failed,
                    errors = record.errors,
                    "Inconsistent counts in {}",
                    path.display()
                );
                diagnostics.push(Diagnostic::new(
                    service_id,
                    path,
                    DiagnosticKind::SuspectCounts,
                    suspect_message(&record),
                ));
            }
            debug!(
                service = %service_id,
                passed = record.passed,
                total = record.total,
                "Parsed {}",
                path.display()
            );
            record
        }
        Err(e) => {
            warn!(service = %service_id, "Error parsing {}: {}", path.display(), e);
            diagnostics.push(Diagnostic::new(
                service_id,
                path,
                DiagnosticKind::Malformed,
                e.to_string(),
            ));
            ReportRecord::malformed(service_id, path, format)
        }
    }
}

fn suspect_message(record: &ReportRecord) -> String {
    let counts = format!(
        "tests={} failures={} errors={} skipped={}",
        record.total, record.failed, record.errors, record.skipped
    );
    match record.suspect_reason {
        Some(SuspectReason::PassedClamped) => {
            format!("{}; passed clamped to {}", counts, record.passed)
        }
        Some(SuspectReason::InvalidDuration) => format!("{}; invalid duration set to 0", counts),
        Some(SuspectReason::CountMismatch) => {
            format!("{}; declared passed+failed+pending does not match total", counts)
        }
        None => counts,
    }
}

// ============================================================================
// JUnit / Surefire XML
// ============================================================================

/// Counts read from one `<testsuite>`/`<testsuites>` element.
#[derive(Debug, Default)]
struct SuiteAttributes {
    name: Option<String>,
    has_tests: bool,
    counts: RawCounts,
}

impl SuiteAttributes {
    fn suite(&self) -> Option<SuiteCounts> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| SuiteCounts::from_counts(name, &self.counts))
    }
}

/// Add one `<testsuite>` child to the running sum of a `<testsuites>` root.
fn add_child_counts(sum: &mut RawCounts, child: &RawCounts) -> Result<(), NormalizeError> {
    sum.total = sum
        .total
        .checked_add(child.total)
        .ok_or(NormalizeError::CountOverflow("tests"))?;
    sum.failed = sum
        .failed
        .checked_add(child.failed)
        .ok_or(NormalizeError::CountOverflow("failures"))?;
    sum.errors = sum
        .errors
        .checked_add(child.errors)
        .ok_or(NormalizeError::CountOverflow("errors"))?;
    sum.skipped = sum
        .skipped
        .checked_add(child.skipped)
        .ok_or(NormalizeError::CountOverflow("skipped"))?;
    sum.duration_seconds += child.duration_seconds;
    Ok(())
}

/// Parse a JUnit XML document.
///
/// A `<testsuites>` root uses its own attributes when it carries `tests`,
/// otherwise the sum of its direct `<testsuite>` children.
pub fn parse_junit_xml(
    service_id: &str,
    source: &Path,
    content: &str,
) -> Result<ReportRecord, NormalizeError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut root: Option<(bool, SuiteAttributes)> = None;
    let mut children: Result<RawCounts, NormalizeError> = Ok(RawCounts::default());
    let mut suites = Vec::new();

    loop {
        let (element, opens) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match depth {
            0 if root.is_none() => {
                let is_aggregate = match element.name().as_ref() {
                    b"testsuite" => false,
                    b"testsuites" => true,
                    other => {
                        return Err(NormalizeError::UnexpectedRoot(
                            String::from_utf8_lossy(other).to_string(),
                        ));
                    }
                };
                let attrs = read_suite_attributes(&element)?;
                if !is_aggregate {
                    suites.extend(attrs.suite());
                }
                root = Some((is_aggregate, attrs));
            }
            1 if matches!(root, Some((true, _))) && element.name().as_ref() == b"testsuite" => {
                let child = read_suite_attributes(&element)?;
                children = children
                    .and_then(|mut sum| add_child_counts(&mut sum, &child.counts).map(|()| sum));
                suites.extend(child.suite());
            }
            _ => {}
        }

        if opens {
            depth += 1;
        }
    }

    let counts = match root {
        None => return Err(NormalizeError::MissingRoot),
        Some((false, suite)) => suite.counts,
        Some((true, own)) if own.has_tests => own.counts,
        Some((true, _)) => children?,
    };

    Ok(
        ReportRecord::from_counts(service_id, source, ReportFormat::JunitXml, counts)
            .with_suites(suites),
    )
}

fn read_suite_attributes(element: &BytesStart<'_>) -> Result<SuiteAttributes, NormalizeError> {
    let mut attrs = SuiteAttributes::default();

    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key.as_ref();
        if !matches!(
            key,
            b"name" | b"tests" | b"failures" | b"errors" | b"skipped" | b"time"
        ) {
            continue;
        }
        let name = String::from_utf8_lossy(key).to_string();
        let value = attr.unescape_value()?;

        match key {
            b"name" => attrs.name = Some(value.to_string()),
            b"tests" => {
                attrs.has_tests = true;
                attrs.counts.total = parse_count(&name, &value)?;
            }
            b"failures" => attrs.counts.failed = parse_count(&name, &value)?,
            b"errors" => attrs.counts.errors = parse_count(&name, &value)?,
            b"skipped" => attrs.counts.skipped = parse_count(&name, &value)?,
            _ => attrs.counts.duration_seconds = parse_seconds(&name, &value)?,
        }
    }

    Ok(attrs)
}

fn parse_count(attribute: &str, value: &str) -> Result<u64, NormalizeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| NormalizeError::InvalidNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

/// Surefire writes large times with thousands separators, e.g. `1,234.567`.
fn parse_seconds(attribute: &str, value: &str) -> Result<f64, NormalizeError> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| NormalizeError::InvalidNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

// ============================================================================
// Jest JSON
// ============================================================================

/// Root of a Jest `--json` results document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JestResults {
    #[serde(default)]
    pub num_total_tests: u64,
    #[serde(default)]
    pub num_passed_tests: u64,
    #[serde(default)]
    pub num_failed_tests: u64,
    #[serde(default)]
    pub num_pending_tests: u64,
    #[serde(default)]
    pub test_results: Vec<JestFileResult>,
}

/// One test file inside a Jest results document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JestFileResult {
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub perf_stats: Option<JestPerfStats>,
}

/// Timing block some Jest reporters write instead of `startTime`/`endTime`.
#[derive(Debug, Deserialize)]
pub struct JestPerfStats {
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
}

impl JestFileResult {
    fn elapsed_ms(&self) -> i64 {
        let (start, end) = match (&self.perf_stats, self.start_time, self.end_time) {
            (Some(perf), _, _) => (perf.start, perf.end),
            (None, Some(start), Some(end)) => (start, end),
            _ => return 0,
        };
        end.checked_sub(start).unwrap_or(0).max(0)
    }
}

/// Parse a Jest results document. Jest has no error category.
pub fn parse_jest_json(
    service_id: &str,
    source: &Path,
    content: &str,
) -> Result<ReportRecord, NormalizeError> {
    let results: JestResults = serde_json::from_str(content)?;

    let elapsed_ms = results
        .test_results
        .iter()
        .fold(0i64, |sum, r| sum.saturating_add(r.elapsed_ms()));
    let counts = RawCounts {
        total: results.num_total_tests,
        failed: results.num_failed_tests,
        errors: 0,
        skipped: results.num_pending_tests,
        duration_seconds: elapsed_ms as f64 / 1000.0,
    };

    let record = ReportRecord::from_counts(service_id, source, ReportFormat::JestJson, counts);
    let declared = results
        .num_passed_tests
        .checked_add(results.num_failed_tests)
        .and_then(|sum| sum.checked_add(results.num_pending_tests));

    if declared != Some(results.num_total_tests) {
        Ok(record.into_suspect(SuspectReason::CountMismatch))
    } else {
        Ok(record)
    }
}

// ============================================================================
// Coverage summary
// ============================================================================

/// Parse an Istanbul `coverage-summary.json` document.
pub fn parse_coverage_json(
    service_id: &str,
    content: &str,
) -> Result<CoverageSummary, NormalizeError> {
    let document: CoverageDocument = serde_json::from_str(content)?;
    let total = document.total;

    Ok(CoverageSummary {
        service_id: service_id.to_string(),
        statements: total.statements.percent(),
        branches: total.branches.percent(),
        functions: total.functions.percent(),
        lines: total.lines.percent(),
    })
}

/// Read a coverage summary if the file exists. Problems become diagnostics.
pub fn normalize_coverage(
    service_id: &str,
    path: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<CoverageSummary> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(service = %service_id, "Error reading coverage {}: {}", path.display(), e);
            diagnostics.push(Diagnostic::new(
                service_id,
                path,
                DiagnosticKind::Unreadable,
                e.to_string(),
            ));
            return None;
        }
    };

    match parse_coverage_json(service_id, &content) {
        Ok(coverage) => Some(coverage),
        Err(e) => {
            warn!(service = %service_id, "Error parsing coverage {}: {}", path.display(), e);
            diagnostics.push(Diagnostic::new(
                service_id,
                path,
                DiagnosticKind::Malformed,
                e.to_string(),
            ));
            None
        }
    }
}

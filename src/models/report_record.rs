//! Normalized per-file report record.

use std::path::PathBuf;

use serde::Serialize;

/// Source format of a report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// JUnit/Surefire `<testsuite>` XML
    JunitXml,
    /// Jest `--json` results document
    JestJson,
}

impl ReportFormat {
    /// Detect the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xml" => Some(Self::JunitXml),
            "json" => Some(Self::JestJson),
            _ => None,
        }
    }
}

/// How far a record can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordQuality {
    /// Counts are consistent
    Valid,
    /// Counts were inconsistent and `passed` or the duration was clamped
    Suspect,
    /// Zero record standing in for a file that could not be read or parsed
    Malformed,
}

/// Why a record was marked suspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspectReason {
    /// `failures + errors` exceeded `tests`, so `passed` was clamped to 0
    PassedClamped,
    /// Duration was negative or not finite and was replaced with 0
    InvalidDuration,
    /// Declared passed + failed + pending does not add up to the total
    CountMismatch,
}

/// Counts of one named `<testsuite>` inside a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteCounts {
    pub name: String,
    pub passed: u64,
    /// Failures plus errors
    pub failed: u64,
}

impl SuiteCounts {
    pub fn from_counts(name: impl Into<String>, counts: &RawCounts) -> Self {
        SuiteCounts {
            name: name.into(),
            passed: derive_passed(counts.total, counts.failed, counts.errors).0,
            failed: counts.failed.saturating_add(counts.errors),
        }
    }
}

/// Raw counts as read from a report, before `passed` is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawCounts {
    pub total: u64,
    pub failed: u64,
    pub errors: u64,
    pub skipped: u64,
    pub duration_seconds: f64,
}

/// One parsed test-report file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    /// Owning service
    pub service_id: String,
    /// File the record was parsed from
    pub source: PathBuf,
    pub format: ReportFormat,
    pub total: u64,
    /// `total - failed - errors`, never negative
    pub passed: u64,
    pub failed: u64,
    pub errors: u64,
    pub skipped: u64,
    pub duration_seconds: f64,
    pub quality: RecordQuality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspect_reason: Option<SuspectReason>,
    /// Named suites found in the report, in document order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suites: Vec<SuiteCounts>,
}

/// Derive the passed count, clamping at zero.
///
/// Returns the count and whether clamping was needed.
pub fn derive_passed(total: u64, failed: u64, errors: u64) -> (u64, bool) {
    match total.checked_sub(failed).and_then(|rest| rest.checked_sub(errors)) {
        Some(passed) => (passed, false),
        None => (0, true),
    }
}

impl ReportRecord {
    /// Build a record from raw counts.
    pub fn from_counts(
        service_id: impl Into<String>,
        source: impl Into<PathBuf>,
        format: ReportFormat,
        counts: RawCounts,
    ) -> Self {
        let (passed, clamped) = derive_passed(counts.total, counts.failed, counts.errors);
        let duration_ok = counts.duration_seconds.is_finite() && counts.duration_seconds >= 0.0;

        ReportRecord {
            service_id: service_id.into(),
            source: source.into(),
            format,
            total: counts.total,
            passed,
            failed: counts.failed,
            errors: counts.errors,
            skipped: counts.skipped,
            duration_seconds: if duration_ok {
                counts.duration_seconds
            } else {
                0.0
            },
            quality: if clamped || !duration_ok {
                RecordQuality::Suspect
            } else {
                RecordQuality::Valid
            },
            suspect_reason: if clamped {
                Some(SuspectReason::PassedClamped)
            } else if !duration_ok {
                Some(SuspectReason::InvalidDuration)
            } else {
                None
            },
            suites: Vec::new(),
        }
    }

    /// Sentinel zero record for an unreadable or unparsable file.
    pub fn malformed(
        service_id: impl Into<String>,
        source: impl Into<PathBuf>,
        format: ReportFormat,
    ) -> Self {
        ReportRecord {
            service_id: service_id.into(),
            source: source.into(),
            format,
            total: 0,
            passed: 0,
            failed: 0,
            errors: 0,
            skipped: 0,
            duration_seconds: 0.0,
            quality: RecordQuality::Malformed,
            suspect_reason: None,
            suites: Vec::new(),
        }
    }

    /// Mark the record suspect. An earlier reason is kept.
    pub fn into_suspect(mut self, reason: SuspectReason) -> Self {
        if self.quality == RecordQuality::Valid {
            self.quality = RecordQuality::Suspect;
            self.suspect_reason = Some(reason);
        }
        self
    }

    /// Attach the named suites of the report.
    pub fn with_suites(mut self, suites: Vec<SuiteCounts>) -> Self {
        self.suites = suites;
        self
    }

    pub fn is_malformed(&self) -> bool {
        self.quality == RecordQuality::Malformed
    }

    pub fn is_suspect(&self) -> bool {
        self.quality == RecordQuality::Suspect
    }
}

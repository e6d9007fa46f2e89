//! Absorbed per-file problems.

use std::path::PathBuf;

use serde::Serialize;

/// Category of an absorbed problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// File exists but could not be read
    Unreadable,
    /// File could not be parsed
    Malformed,
    /// File parsed but its counts are inconsistent
    SuspectCounts,
    /// Directory entry could not be inspected during discovery
    InvalidPath,
}

/// One problem that was logged and absorbed instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub service_id: String,
    pub path: PathBuf,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        service_id: impl Into<String>,
        path: impl Into<PathBuf>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            service_id: service_id.into(),
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

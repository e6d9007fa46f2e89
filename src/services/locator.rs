//! Report discovery for one service.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::models::{Diagnostic, DiagnosticKind};

/// Find the report files of `service` under `<root>/<service>/<report_glob>`.
///
/// A missing directory yields an empty list. The result is sorted
/// lexicographically so downstream aggregation is reproducible.
pub fn locate_reports(
    root: &Path,
    service: &str,
    report_glob: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<PathBuf> {
    let service_dir = root.join(service);
    if !service_dir.is_dir() {
        debug!(service = %service, dir = %service_dir.display(), "Service directory absent");
        return Vec::new();
    }

    // Directory names are literal; only the configured glob carries wildcards
    let base = Pattern::escape(&service_dir.to_string_lossy());
    let pattern = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        report_glob.trim_start_matches('/')
    );

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let entries = match glob::glob_with(&pattern, options) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(service = %service, pattern = %pattern, "Invalid report pattern: {}", e);
            diagnostics.push(Diagnostic::new(
                service,
                &service_dir,
                DiagnosticKind::InvalidPath,
                format!("invalid report pattern '{}': {}", report_glob, e),
            ));
            return Vec::new();
        }
    };

    let mut reports = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => reports.push(path),
            Ok(_) => {}
            Err(e) => {
                warn!(service = %service, "Skipping unreadable path {}: {}", e.path().display(), e);
                diagnostics.push(Diagnostic::new(
                    service,
                    e.path(),
                    DiagnosticKind::InvalidPath,
                    e.error().to_string(),
                ));
            }
        }
    }

    reports.sort();
    debug!(service = %service, count = reports.len(), "Located report files");
    reports
}

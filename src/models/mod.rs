//! Domain models for the report-to-metrics pipeline.

pub mod coverage;
pub mod diagnostic;
pub mod metric_document;
pub mod report_record;
pub mod summary;

// Re-export commonly used types
pub use coverage::CoverageSummary;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use metric_document::{DocumentError, MetricDocument, MetricFamily, Sample, SampleValue};
pub use report_record::{
    RawCounts, RecordQuality, ReportFormat, ReportRecord, SuiteCounts, SuspectReason, derive_passed,
};
pub use summary::{OverallSummary, ServiceSummary, SuiteSummary, SummaryStatus, pass_rate_percent};

//! Report-to-metrics pipeline stages and external collaborators.

pub mod aggregator;
pub mod dashboard;
pub mod emitter;
pub mod locator;
pub mod normalizer;
pub mod pipeline;
pub mod test_runner;

pub use aggregator::{Aggregate, aggregate};
pub use dashboard::{DashboardImportResult, GrafanaClient};
pub use emitter::{build_document, write_atomically};
pub use locator::locate_reports;
pub use normalizer::{NormalizeError, normalize_coverage, normalize_report};
pub use pipeline::{MetricsPipeline, RunReport};
pub use test_runner::{RunOutcome, ServiceRun, run_all, run_service};

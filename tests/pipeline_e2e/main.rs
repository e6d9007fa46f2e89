//! Pipeline E2E test suite.
//!
//! Builds service trees in temporary directories, runs the full
//! report-to-metrics pipeline, serves the artifact through the HTTP routes
//! and imports a dashboard into a mock Grafana.
//!
//! Run with: cargo test --test pipeline_e2e

mod fixtures;
mod mock_grafana;

mod test_dashboard;
mod test_pipeline;
mod test_properties;

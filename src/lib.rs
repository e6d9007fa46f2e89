//! Test Metrics Server library.
//!
//! Turns test reports (JUnit XML, Jest JSON, coverage summaries) into a
//! Prometheus text artifact, serves it over HTTP and pushes dashboards to
//! Grafana.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod telemetry;

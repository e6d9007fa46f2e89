//! Prometheus scrape endpoint.

use std::path::PathBuf;

use actix_web::{HttpResponse, get, web};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Served when the pipeline has not written an artifact yet.
pub const NO_METRICS_PLACEHOLDER: &str = "# No metrics available yet\n";

/// Location of the artifact written by the pipeline.
#[derive(Debug, Clone)]
pub struct MetricsSource {
    pub path: PathBuf,
}

impl MetricsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Serve the metrics artifact verbatim.
///
/// GET /metrics
#[get("/metrics")]
pub async fn metrics(source: web::Data<MetricsSource>) -> AppResult<HttpResponse> {
    let body = match tokio::fs::read_to_string(&source.path).await {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %source.path.display(), "Metrics artifact not written yet");
            NO_METRICS_PLACEHOLDER.to_string()
        }
        Err(e) => {
            return Err(AppError::FileSystem(format!(
                "Failed to read {}: {}",
                source.path.display(),
                e
            )));
        }
    };

    Ok(HttpResponse::Ok()
        .content_type(PROMETHEUS_CONTENT_TYPE)
        .body(body))
}

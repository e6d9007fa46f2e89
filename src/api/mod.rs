//! HTTP endpoints of the metrics server.

pub mod health;
pub mod metrics;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::error::{AppError, AppResult};

pub use health::configure_health_routes;
pub use metrics::{MetricsSource, NO_METRICS_PLACEHOLDER, PROMETHEUS_CONTENT_TYPE};

/// Configure metrics routes.
pub fn configure_metrics_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(metrics::metrics);
}

/// Register every route. Pair with [`not_found`] as the app's default service.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_metrics_routes)
        .configure(configure_health_routes);
}

/// Fallback for unknown paths.
pub async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("Path {}", req.path())))
}

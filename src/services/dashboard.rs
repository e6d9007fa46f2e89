//! Grafana dashboard importer.
//!
//! Waits for `GET /api/health`, then posts a dashboard definition to
//! `POST /api/dashboards/db` with overwrite enabled.

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::GrafanaSettings;
use crate::error::{AppError, AppResult};

/// HTTP connect timeout for Grafana API calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// HTTP total timeout for Grafana API calls.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Interval between readiness probes.
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

const COLLABORATOR: &str = "Grafana";

/// Grafana's answer to a successful dashboard import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardImportResult {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<u64>,
}

/// Read a dashboard definition, unwrapping a `{"dashboard": {...}}` export wrapper.
pub fn load_dashboard(path: &Path) -> AppResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(format!("Dashboard file {}", path.display()))
        } else {
            AppError::FileSystem(format!("Failed to read {}: {}", path.display(), e))
        }
    })?;

    let value: Value = serde_json::from_str(&content)?;
    Ok(unwrap_dashboard(value))
}

fn unwrap_dashboard(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("dashboard").is_some_and(Value::is_object) => {
            map.remove("dashboard").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Body of `POST /api/dashboards/db`.
pub fn build_import_payload(dashboard: Value, message: &str) -> Value {
    json!({
        "dashboard": dashboard,
        "overwrite": true,
        "message": message,
    })
}

/// Minimal Grafana HTTP API client.
pub struct GrafanaClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    password: SecretString,
}

impl GrafanaClient {
    /// Build a client with connect and request timeouts.
    pub fn new(settings: &GrafanaSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::CollaboratorUnavailable {
                collaborator: COLLABORATOR,
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            user: settings.user.clone(),
            password: settings.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One readiness probe. Any transport error counts as not ready.
    pub async fn is_ready(&self) -> bool {
        match self
            .http
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Grafana health probe failed: {}", e);
                false
            }
        }
    }

    /// Poll `/api/health` every `poll_interval` until it answers 200 or `timeout` elapses.
    pub async fn wait_until_ready(&self, timeout: Duration, poll_interval: Duration) -> AppResult<()> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.is_ready().await {
                info!(url = %self.base_url, "Grafana is ready");
                return Ok(());
            }
            if Instant::now() + poll_interval > deadline {
                warn!(url = %self.base_url, "Grafana not ready after {:?}", timeout);
                return Err(AppError::CollaboratorUnavailable {
                    collaborator: COLLABORATOR,
                    message: format!("not ready after {} seconds", timeout.as_secs()),
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Import a dashboard with overwrite enabled.
    pub async fn import_dashboard(
        &self,
        dashboard: Value,
        message: &str,
    ) -> AppResult<DashboardImportResult> {
        let payload = build_import_payload(dashboard, message);

        let response = self
            .http
            .post(format!("{}/api/dashboards/db", self.base_url))
            .basic_auth(&self.user, Some(self.password.expose_secret()))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 200 || status.as_u16() == 201 {
            let result: DashboardImportResult = response.json().await?;
            info!(
                uid = result.uid.as_deref().unwrap_or("-"),
                version = result.version.unwrap_or_default(),
                "Dashboard imported"
            );
            return Ok(result);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "Dashboard import rejected: {}", body);
        Err(AppError::CollaboratorRejected {
            collaborator: COLLABORATOR,
            status: status.as_u16(),
            body,
        })
    }

    /// Link to an imported dashboard.
    pub fn dashboard_link(&self, result: &DashboardImportResult) -> Option<String> {
        match (&result.url, &result.uid) {
            (Some(url), _) if url.starts_with("http") => Some(url.clone()),
            (Some(url), _) => Some(format!("{}{}", self.base_url, url)),
            (None, Some(uid)) => Some(format!("{}/d/{}", self.base_url, uid)),
            (None, None) => None,
        }
    }
}

//! E2E tests: dashboard import against a mock Grafana.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use test_metrics_lib::config::GrafanaSettings;
use test_metrics_lib::error::AppError;
use test_metrics_lib::services::GrafanaClient;
use test_metrics_lib::services::dashboard::load_dashboard;

use super::mock_grafana::MockGrafana;

fn settings(url: &str) -> GrafanaSettings {
    GrafanaSettings {
        url: url.to_string(),
        user: "admin".to_string(),
        password: SecretString::from("s3cret"),
        dashboard_file: "unused.json".into(),
        ready_timeout: Duration::from_secs(5),
    }
}

/// (1) The import posts the dashboard with overwrite and basic auth.
#[actix_rt::test]
async fn test_import_posts_expected_payload() {
    let mock = MockGrafana::start(200, 0).await;
    let client = GrafanaClient::new(&settings(&mock.url)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("dashboard.json");
    std::fs::write(
        &file,
        r#"{"dashboard": {"uid": "test-metrics", "title": "Test Metrics", "panels": []}}"#,
    )
    .unwrap();
    let dashboard = load_dashboard(&file).unwrap();

    client
        .wait_until_ready(Duration::from_secs(5), Duration::from_millis(50))
        .await
        .unwrap();
    let result = client
        .import_dashboard(dashboard, "Imported test metrics dashboard")
        .await
        .unwrap();

    assert_eq!(result.uid.as_deref(), Some("test-metrics"));
    assert_eq!(result.version, Some(3));
    assert_eq!(
        client.dashboard_link(&result),
        Some(format!("{}/d/test-metrics/test-metrics", mock.url))
    );

    let imports = mock.imports();
    assert_eq!(imports.len(), 1);
    // base64("admin:s3cret")
    assert_eq!(
        imports[0].authorization.as_deref(),
        Some("Basic YWRtaW46czNjcmV0")
    );
    assert_eq!(
        imports[0].body,
        json!({
            "dashboard": {"uid": "test-metrics", "title": "Test Metrics", "panels": []},
            "overwrite": true,
            "message": "Imported test metrics dashboard"
        })
    );
}

/// (2) Readiness polling waits through unhealthy probes.
#[actix_rt::test]
async fn test_waits_until_healthy() {
    let mock = MockGrafana::start(200, 2).await;
    let client = GrafanaClient::new(&settings(&mock.url)).unwrap();

    assert!(!client.is_ready().await);
    client
        .wait_until_ready(Duration::from_secs(5), Duration::from_millis(50))
        .await
        .unwrap();
}

/// (3) A rejected import carries status and body.
#[actix_rt::test]
async fn test_rejected_import() {
    let mock = MockGrafana::start(412, 0).await;
    let client = GrafanaClient::new(&settings(&mock.url)).unwrap();

    let err = client
        .import_dashboard(json!({"title": "Broken"}), "msg")
        .await
        .unwrap_err();

    match err {
        AppError::CollaboratorRejected { status, body, .. } => {
            assert_eq!(status, 412);
            assert!(body.contains("Dashboard not valid"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// (4) An unreachable Grafana is reported as unavailable.
#[actix_rt::test]
async fn test_unreachable_grafana() {
    // Bind and drop to get a port nothing listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = GrafanaClient::new(&settings(&format!("http://127.0.0.1:{}", port))).unwrap();

    let err = client
        .import_dashboard(json!({}), "msg")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CollaboratorUnavailable { .. }));

    let err = client
        .wait_until_ready(Duration::from_millis(100), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CollaboratorUnavailable { .. }));
}

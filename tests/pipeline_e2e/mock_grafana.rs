//! Mock Grafana for E2E tests.
//!
//! Starts an in-process HTTP server with `/api/health` and
//! `/api/dashboards/db`, recording every import request it receives.

use actix_web::{App, HttpRequest, HttpResponse, get, post, web};
use actix_web::HttpServer;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

/// One recorded dashboard import.
#[derive(Debug, Clone)]
pub struct RecordedImport {
    pub authorization: Option<String>,
    pub body: Value,
}

/// Shared state for the mock Grafana.
#[derive(Default)]
pub struct MockGrafanaState {
    pub imports: Vec<RecordedImport>,
    /// Status returned by the import endpoint
    pub import_status: u16,
    /// Health probes answered with 503 before reporting ready
    pub unhealthy_probes: u32,
}

type SharedState = web::Data<Arc<Mutex<MockGrafanaState>>>;

#[get("/api/health")]
async fn health(state: SharedState) -> HttpResponse {
    let mut state = state.lock().unwrap();
    if state.unhealthy_probes > 0 {
        state.unhealthy_probes -= 1;
        return HttpResponse::ServiceUnavailable().finish();
    }
    HttpResponse::Ok().json(json!({"database": "ok", "version": "10.0.0"}))
}

#[post("/api/dashboards/db")]
async fn import(req: HttpRequest, body: web::Json<Value>, state: SharedState) -> HttpResponse {
    let mut state = state.lock().unwrap();
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state.imports.push(RecordedImport {
        authorization,
        body: body.into_inner(),
    });

    match state.import_status {
        200 => HttpResponse::Ok().json(json!({
            "id": 1,
            "uid": "test-metrics",
            "url": "/d/test-metrics/test-metrics",
            "status": "success",
            "version": 3,
            "slug": "test-metrics"
        })),
        status => HttpResponse::build(
            actix_web::http::StatusCode::from_u16(status).unwrap(),
        )
        .json(json!({"message": "Dashboard not valid", "status": "invalid"})),
    }
}

/// Mock Grafana serving health and import endpoints.
pub struct MockGrafana {
    pub url: String,
    pub state: Arc<Mutex<MockGrafanaState>>,
}

impl MockGrafana {
    /// Start the mock on an ephemeral port.
    pub async fn start(import_status: u16, unhealthy_probes: u32) -> Self {
        let state = Arc::new(Mutex::new(MockGrafanaState {
            imports: Vec::new(),
            import_status,
            unhealthy_probes,
        }));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{}", port);

        let state_data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state_data.clone()))
                .service(health)
                .service(import)
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Fire and forget: the server lives for the test runtime
        tokio::spawn(server);

        MockGrafana { url, state }
    }

    pub fn imports(&self) -> Vec<RecordedImport> {
        self.state.lock().unwrap().imports.clone()
    }
}

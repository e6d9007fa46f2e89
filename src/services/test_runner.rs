//! Runs each service's test command as a child process.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::RunnerSettings;
use crate::error::{AppError, AppResult};

const COLLABORATOR: &str = "Test runner";

/// Result of running one service's tests.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub service: String,
    pub command: Vec<String>,
    /// `None` when the process was killed or terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    pub duration: Duration,
    pub timed_out: bool,
}

/// Command for `service_dir`: the configured one, else the Maven wrapper when present, else `mvn`.
pub fn resolve_command(settings: &RunnerSettings, service_dir: &Path) -> Vec<String> {
    if let Some(command) = settings.command.as_ref().filter(|c| !c.is_empty()) {
        return command.clone();
    }

    let args = ["test", "-q"].map(String::from);
    if cfg!(windows) && service_dir.join("mvnw.cmd").is_file() {
        ["cmd", "/c", "mvnw.cmd"]
            .map(String::from)
            .into_iter()
            .chain(args)
            .collect()
    } else if service_dir.join("mvnw").is_file() {
        std::iter::once("./mvnw".to_string()).chain(args).collect()
    } else {
        std::iter::once("mvn".to_string()).chain(args).collect()
    }
}

/// Run the tests of one service inside its directory.
///
/// The child is killed when `settings.timeout` expires.
pub async fn run_service(
    service: &str,
    service_dir: &Path,
    settings: &RunnerSettings,
) -> AppResult<RunOutcome> {
    if !service_dir.is_dir() {
        return Err(AppError::NotFound(format!(
            "Service directory {}",
            service_dir.display()
        )));
    }

    let command = resolve_command(settings, service_dir);
    let (program, args) = command
        .split_first()
        .ok_or_else(|| AppError::InvalidInput("empty test command".to_string()))?;

    info!(service = %service, command = %command.join(" "), "Running tests");
    let started = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .current_dir(service_dir)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::CollaboratorUnavailable {
            collaborator: COLLABORATOR,
            message: format!("failed to start '{}': {}", program, e),
        })?;

    let waited = tokio::time::timeout(settings.timeout, child.wait()).await;
    let (exit_code, success, timed_out) = match waited {
        Ok(Ok(status)) => (status.code(), status.success(), false),
        Ok(Err(e)) => {
            return Err(AppError::CollaboratorUnavailable {
                collaborator: COLLABORATOR,
                message: format!("failed waiting for '{}': {}", program, e),
            });
        }
        Err(_) => {
            warn!(service = %service, "Tests timed out after {:?}, killing", settings.timeout);
            if let Err(e) = child.kill().await {
                error!(service = %service, "Failed to kill test process: {}", e);
            }
            (None, false, true)
        }
    };

    let outcome = RunOutcome {
        service: service.to_string(),
        command,
        exit_code,
        success,
        duration: started.elapsed(),
        timed_out,
    };

    if outcome.success {
        info!(service = %service, duration_ms = outcome.duration.as_millis() as u64, "Tests passed");
    } else {
        warn!(
            service = %service,
            exit_code = ?outcome.exit_code,
            timed_out = outcome.timed_out,
            "Tests failed"
        );
    }

    Ok(outcome)
}

/// One entry per configured service, in order.
#[derive(Debug)]
pub struct ServiceRun {
    pub service: String,
    pub result: AppResult<RunOutcome>,
}

impl ServiceRun {
    pub fn passed(&self) -> bool {
        matches!(&self.result, Ok(outcome) if outcome.success)
    }
}

/// Run every service sequentially. A failing service never stops the others.
pub async fn run_all(root: &Path, services: &[String], settings: &RunnerSettings) -> Vec<ServiceRun> {
    let mut runs = Vec::with_capacity(services.len());

    for (index, service) in services.iter().enumerate() {
        info!(service = %service, "Service {}/{}", index + 1, services.len());
        let result = run_service(service, &root.join(service), settings).await;
        if let Err(e) = &result {
            error!(service = %service, "Test run failed: {}", e);
        }
        runs.push(ServiceRun {
            service: service.clone(),
            result,
        });
    }

    runs
}

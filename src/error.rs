//! Domain error types for the test metrics server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use std::fmt;
use std::path::PathBuf;

use actix_web::{HttpResponse, ResponseError};

use crate::config::ConfigError;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local file system operation failed
    #[error("File system error: {0}")]
    FileSystem(String),

    /// The metrics artifact could not be written; the previous file is left in place
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external collaborator (Grafana, a test runner) could not be reached or started
    #[error("{collaborator} unavailable: {message}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        message: String,
    },

    /// A collaborator answered but rejected the request
    #[error("{collaborator} request failed with status {status}: {body}")]
    CollaboratorRejected {
        collaborator: &'static str,
        status: u16,
        body: String,
    },

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Build a write failure for `path`.
    pub fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::WriteFailure {
            path: path.into(),
            source,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::InvalidInput(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::FileSystem(err_str) => {
                tracing::error!("File system error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "FILE_SYSTEM_ERROR",
                    "Error reading metrics".to_string(),
                )
            }
            AppError::WriteFailure { .. } | AppError::Config(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                self.to_string(),
            ),
            AppError::CollaboratorUnavailable { .. } | AppError::CollaboratorRejected { .. } => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "COLLABORATOR_ERROR",
                self.to_string(),
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::CollaboratorUnavailable {
            collaborator: "Grafana",
            message: err.to_string(),
        }
    }
}

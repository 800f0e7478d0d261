//! API error type and kind → status mapping
//!
//! Status and message are chosen from [`ErrorKind`]; the underlying error
//! text goes to the log only, never to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use super::posts::escape_html;
use postnorm_common::ErrorKind;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Registry or normalizer failure
    #[error(transparent)]
    Core(#[from] postnorm_common::Error),

    /// Blocking task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Core(err) => err.kind(),
            ApiError::Worker(_) => ErrorKind::UnexpectedFailure,
        }
    }

    /// Whether the caller, not the deployment, is at fault
    pub fn is_client_error(&self) -> bool {
        match self {
            ApiError::Core(err) => err.is_client_error(),
            ApiError::Worker(_) => false,
        }
    }
}

/// HTTP status and client-facing message for an error kind
pub fn status_and_message(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::UnsupportedPlatform => (StatusCode::BAD_REQUEST, "Invalid platform name"),
        ErrorKind::PlatformConfigMissing => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Invalid platform configuration",
        ),
        ErrorKind::ConfigNotFound => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration file not found",
        ),
        ErrorKind::ConfigMalformed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Invalid JSON format in configuration file",
        ),
        ErrorKind::SourceNotFound => (StatusCode::INTERNAL_SERVER_ERROR, "Data source not found"),
        ErrorKind::SourceMalformed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Invalid JSON format in data source",
        ),
        ErrorKind::UnexpectedFailure => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred",
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = status_and_message(self.kind());

        if self.is_client_error() {
            // Carries the caller's platform name
            warn!(
                status = status.as_u16(),
                error = %escape_html(&self.to_string()),
                "Validation error: {}",
                message
            );
        } else {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

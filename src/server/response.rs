//! HTTP responses for the webhook endpoint

use crate::fetcher::{CloneError, WorkspaceError};
use crate::scanner::ScanResult;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const SUCCESS_MESSAGE: &str =
    "Repository processed successfully, all files match the allowed extensions.";
pub const VIOLATION_MESSAGE: &str =
    "Repository processed successfully, but some files don't match the allowed extensions.";

/// Ways a webhook request can end early
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("missing or wrong shared secret")]
    Unauthorized,

    #[error("request body is not a valid submission: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("submission has no repository URL")]
    MissingRepoUrl,

    #[error("could not prepare scratch workspace: {0}")]
    Workspace(#[source] WorkspaceError),

    #[error("could not clone repository: {0}")]
    Clone(#[source] CloneError),

    #[error("repository scan did not complete: {0}")]
    ScanAborted(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Unauthorized => StatusCode::UNAUTHORIZED,
            RequestError::InvalidJson(_) | RequestError::MissingRepoUrl => StatusCode::BAD_REQUEST,
            RequestError::Workspace(_) | RequestError::Clone(_) | RequestError::ScanAborted(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message returned to the caller; internal details stay in the logs
    pub fn public_message(&self) -> &'static str {
        match self {
            RequestError::Unauthorized => "Bad Request",
            RequestError::InvalidJson(_) => "Invalid JSON payload",
            RequestError::MissingRepoUrl => "Repository URL is required",
            RequestError::Workspace(_) => "Failed to prepare workspace",
            RequestError::Clone(_) => "Failed to clone repo",
            RequestError::ScanAborted(_) => "Failed to scan repo",
        }
    }
}

impl crate::core::error_handling::ContextualError for RequestError {
    fn is_user_actionable(&self) -> bool {
        match self {
            RequestError::Unauthorized | RequestError::InvalidJson(_) | RequestError::MissingRepoUrl => true,
            RequestError::Workspace(e) => e.is_user_actionable(),
            RequestError::Clone(e) => e.is_user_actionable(),
            RequestError::ScanAborted(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            RequestError::Unauthorized | RequestError::InvalidJson(_) | RequestError::MissingRepoUrl => {
                Some(self.public_message())
            }
            RequestError::Workspace(e) => e.user_message(),
            RequestError::Clone(e) => e.user_message(),
            RequestError::ScanAborted(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

/// Body of a 200 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_files: Option<Vec<String>>,
}

impl From<ScanResult> for ProcessedResponse {
    fn from(result: ScanResult) -> Self {
        if result.is_compliant() {
            Self {
                message: SUCCESS_MESSAGE,
                invalid_files: None,
            }
        } else {
            Self {
                message: VIOLATION_MESSAGE,
                invalid_files: Some(result.violating_paths),
            }
        }
    }
}

impl IntoResponse for ProcessedResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

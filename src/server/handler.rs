//! Webhook request pipeline
//!
//! authenticate -> parse -> acquire workspace -> clone -> scan -> release
//! -> notify -> respond. Each step either hands a value to the next or ends
//! the request with a [`RequestError`]. The workspace is released on every
//! path that acquired one.

use super::request_id::{RequestId, REQUEST_ID_HEADER};
use super::response::{ProcessedResponse, RequestError};
use super::state::AppState;
use crate::core::error_handling::ContextualError;
use crate::fetcher::{describe_remote, ScratchWorkspace};
use crate::notifications::NotifyError;
use crate::scanner::{scan, ScanResult};
use crate::submission::SubmissionRequest;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const SECRET_HEADER: &str = "x-secret";

/// `POST /webhook`
pub async fn handle_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request_id = RequestId::from_headers(&headers);

    let mut response = match process(&state, &request_id, &headers, &body).await {
        Ok(processed) => processed.into_response(),
        Err(err) => {
            match &err {
                RequestError::Unauthorized => log::warn!("[{}] Rejected: {}", request_id, err),
                RequestError::InvalidJson(_) | RequestError::MissingRepoUrl => {
                    log::info!("[{}] Rejected: {}", request_id, err)
                }
                _ => {
                    log::error!("[{}] {}", request_id, err);
                    if let Some(hint) = err.user_message().filter(|_| err.is_user_actionable()) {
                        log::info!("[{}] Hint: {}", request_id, hint);
                    }
                }
            }
            err.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process(
    state: &AppState,
    request_id: &RequestId,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ProcessedResponse, RequestError> {
    authenticate(headers, state.secret())?;

    let submission: SubmissionRequest = serde_json::from_slice(body).map_err(RequestError::InvalidJson)?;
    let repo_url = submission.repo_url().ok_or(RequestError::MissingRepoUrl)?;

    log::info!(
        "[{}] Submission from {} for {} ({})",
        request_id,
        submission.primary_login(),
        submission.project_slug(),
        describe_remote(repo_url)
    );

    // Redeliveries may repeat the caller's id, so the path never derives from it
    let workspace = state
        .scratch()
        .acquire_unique()
        .map_err(RequestError::Workspace)?;
    log::debug!("[{}] Workspace {}", request_id, workspace.path().display());

    let destination = workspace.repo_dir();
    if let Err(err) = state.fetcher().fetch(repo_url, &destination, state.key()).await {
        release_in_background(workspace, request_id).await;
        return Err(RequestError::Clone(err));
    }

    let result = scan_and_release(workspace, request_id).await?;
    log::info!(
        "[{}] Scanned {} entries, {} violation(s)",
        request_id,
        result.total(),
        result.violating_paths.len()
    );

    notify(state, request_id, &submission, &result).await;

    Ok(ProcessedResponse::from(result))
}

fn authenticate(headers: &HeaderMap, secret: &str) -> Result<(), RequestError> {
    let provided = headers
        .get(SECRET_HEADER)
        .map(|value| value.as_bytes())
        .ok_or(RequestError::Unauthorized)?;

    if constant_time_eq(provided, secret.as_bytes()) {
        Ok(())
    } else {
        Err(RequestError::Unauthorized)
    }
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Scanning and directory removal are blocking filesystem work
async fn scan_and_release(workspace: ScratchWorkspace, request_id: &RequestId) -> Result<ScanResult, RequestError> {
    let id = request_id.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let result = scan(&workspace.repo_dir());
        if let Err(e) = workspace.release() {
            log::warn!("[{}] Failed to remove workspace: {}", id, e);
        }
        result
    })
    .await;

    joined.map_err(|e| RequestError::ScanAborted(e.to_string()))
}

async fn release_in_background(workspace: ScratchWorkspace, request_id: &RequestId) {
    let id = request_id.clone();
    let joined = tokio::task::spawn_blocking(move || {
        if let Err(e) = workspace.release() {
            log::warn!("[{}] Failed to remove workspace: {}", id, e);
        }
    })
    .await;

    if let Err(e) = joined {
        log::warn!("[{}] Workspace release task failed: {}", request_id, e);
    }
}

async fn notify(state: &AppState, request_id: &RequestId, submission: &SubmissionRequest, result: &ScanResult) {
    let notifier = state.notifier();
    let submitters = submission.submitters();
    let project = submission.project.as_ref();

    let outcome = if result.is_compliant() {
        notifier.notify_success(submitters, project).await
    } else {
        notifier
            .notify_violations(&result.violating_paths, submitters, project)
            .await
    };

    match outcome {
        Ok(()) => log::info!("[{}] Notification sent", request_id),
        Err(NotifyError::NotConfigured) => {
            log::debug!("[{}] Notifications disabled; skipping", request_id)
        }
        Err(e) => log::error!("[{}] Notification failed: {}", request_id, e),
    }
}

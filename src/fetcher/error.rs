//! Fetcher error types

use std::path::PathBuf;
use std::time::Duration;

/// Errors from cloning a submitted repository
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to launch git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git clone failed (status: {status}){summary}")]
    Failed { status: String, summary: String },

    #[error("git clone timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to prepare clone destination {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, CloneError>;

impl crate::core::error_handling::ContextualError for CloneError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, CloneError::Io { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            CloneError::InvalidUrl { .. } => Some("Submit an ssh or https repository URL"),
            CloneError::Spawn(_) => Some("Install git and make sure it is on PATH"),
            CloneError::Failed { .. } => {
                Some("Check that the repository exists and the deploy key can read it")
            }
            CloneError::Timeout(_) => Some("The remote did not answer in time; raise CLONE_TIMEOUT_SECS if it is slow"),
            CloneError::Io { .. } => None,
        }
    }
}

/// Errors from scratch workspace management
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("invalid workspace name '{0}'")]
    InvalidName(String),

    #[error("workspace already in use: {}", .0.display())]
    InUse(PathBuf),

    #[error("refusing to manage {}: it has content not created by this service", .0.display())]
    ForeignRoot(PathBuf),

    #[error("workspace IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for workspace operations
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

impl crate::core::error_handling::ContextualError for WorkspaceError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, WorkspaceError::Io { .. } | WorkspaceError::ForeignRoot(_))
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            WorkspaceError::Io { .. } => Some("SCRATCH_DIR must be a writable directory"),
            WorkspaceError::ForeignRoot(_) => {
                Some("Point SCRATCH_DIR at a directory whose 'workspaces' child is empty or absent")
            }
            _ => None,
        }
    }
}

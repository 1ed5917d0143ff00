//! Error types for outcome notifications

use std::fmt;

const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug)]
pub enum NotifyError {
    /// No webhook URL configured; nothing was sent
    NotConfigured,
    /// The HTTP client could not be constructed
    Client(reqwest::Error),
    /// The request never produced a response
    Transport(reqwest::Error),
    /// The endpoint answered with something other than 204
    Rejected { status: u16, body: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::NotConfigured => write!(f, "notification webhook is not configured"),
            NotifyError::Client(e) => write!(f, "failed to build notification client: {e}"),
            NotifyError::Transport(e) => write!(f, "failed to reach notification webhook: {e}"),
            NotifyError::Rejected { status, body } => {
                if body.is_empty() {
                    write!(f, "notification webhook returned status {status}")
                } else {
                    write!(
                        f,
                        "notification webhook returned status {status}: {}",
                        preview(body)
                    )
                }
            }
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NotifyError::Client(e) | NotifyError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl crate::core::error_handling::ContextualError for NotifyError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, NotifyError::Client(_))
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            NotifyError::Client(_) => Some("Check the TLS setup and DISCORD_WEBHOOK_URL"),
            _ => None,
        }
    }
}

fn preview(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Result type for notification delivery
pub type NotifyResult<T> = Result<T, NotifyError>;

//! Discord webhook delivery

use super::error::{NotifyError, NotifyResult};
use super::message::{violation_description, Embed, EmbedPayload, MessageContext, SUCCESS_DESCRIPTION};
use crate::submission::{Project, Submitter};
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends submission outcomes to a chat webhook
///
/// Without a webhook URL the notifier is disabled and every call returns
/// [`NotifyError::NotConfigured`] without touching the network.
#[derive(Debug, Clone)]
pub struct OutcomeNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
    review_url_template: Option<String>,
}

impl OutcomeNotifier {
    pub fn new(
        webhook_url: Option<String>,
        review_url_template: Option<String>,
        timeout: Duration,
    ) -> NotifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(NotifyError::Client)?;

        Ok(Self {
            client,
            webhook_url: webhook_url.filter(|url| !url.is_empty()),
            review_url_template: review_url_template.filter(|t| !t.is_empty()),
        })
    }

    /// A notifier that never sends anything
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: None,
            review_url_template: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Report the files that failed classification
    pub async fn notify_violations(
        &self,
        paths: &[String],
        submitters: &[Submitter],
        project: Option<&Project>,
    ) -> NotifyResult<()> {
        let context = MessageContext::new(submitters, project);
        self.send(&context, violation_description(paths)).await
    }

    /// Report a fully compliant submission
    pub async fn notify_success(&self, submitters: &[Submitter], project: Option<&Project>) -> NotifyResult<()> {
        let context = MessageContext::new(submitters, project);
        self.send(&context, SUCCESS_DESCRIPTION.to_string()).await
    }

    async fn send(&self, context: &MessageContext, description: String) -> NotifyResult<()> {
        let Some(url) = self.webhook_url.as_deref() else {
            return Err(NotifyError::NotConfigured);
        };

        let payload = EmbedPayload::from(Embed::new(
            context,
            description,
            self.review_url_template.as_deref(),
        ));

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(NotifyError::Transport)?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            log::debug!("Notification delivered for {}", context.title());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

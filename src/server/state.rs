//! Shared state for request handlers

use crate::credentials::KeyHandle;
use crate::fetcher::{RepositoryFetcher, ScratchManager};
use crate::notifications::OutcomeNotifier;
use std::fmt;
use std::sync::Arc;

/// Everything a webhook request needs, shared read-only across requests
#[derive(Clone)]
pub struct AppState {
    secret: Arc<str>,
    key: Arc<KeyHandle>,
    fetcher: RepositoryFetcher,
    scratch: ScratchManager,
    notifier: OutcomeNotifier,
}

impl AppState {
    pub fn new(
        secret: impl Into<Arc<str>>,
        key: KeyHandle,
        fetcher: RepositoryFetcher,
        scratch: ScratchManager,
        notifier: OutcomeNotifier,
    ) -> Self {
        Self {
            secret: secret.into(),
            key: Arc::new(key),
            fetcher,
            scratch,
            notifier,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn key(&self) -> &KeyHandle {
        &self.key
    }

    pub fn fetcher(&self) -> &RepositoryFetcher {
        &self.fetcher
    }

    pub fn scratch(&self) -> &ScratchManager {
        &self.scratch
    }

    pub fn notifier(&self) -> &OutcomeNotifier {
        &self.notifier
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("secret", &"<redacted>")
            .field("key", &self.key.path())
            .field("fetcher", &self.fetcher)
            .field("scratch", &self.scratch.root())
            .field("notifier_enabled", &self.notifier.is_enabled())
            .finish()
    }
}

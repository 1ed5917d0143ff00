//! Common test utilities and helpers
//!
//! Local git repositories used as clone sources, the key fixtures and a
//! server bound to an ephemeral port.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use submission_check::core::shutdown::ShutdownCoordinator;
use submission_check::credentials::{load_key, KeyHandle};
use submission_check::fetcher::{RepositoryFetcher, ScratchManager, ROOT_MARKER};
use submission_check::notifications::OutcomeNotifier;
use submission_check::server::{self, AppState};
use tempfile::TempDir;

pub const TEST_SECRET: &str = "test-secret";

pub fn fixture_key_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("keys")
        .join(name)
}

pub fn test_key() -> KeyHandle {
    load_key(fixture_key_path("id_ed25519")).expect("fixture key loads")
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "init.defaultBranch=main", "-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("git is installed");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// A committed repository containing `files` (relative paths)
pub struct SourceRepo {
    dir: TempDir,
}

impl SourceRepo {
    pub fn with_files(files: &[&str]) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        git(dir.path(), &["init", "--quiet"]);
        for file in files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create parent dirs");
            }
            std::fs::write(&path, format!("// {}\n", file)).expect("write file");
        }
        git(dir.path(), &["add", "--all"]);
        git(dir.path(), &["commit", "--quiet", "--allow-empty", "-m", "submission"]);
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `file://` URL so shallow clone options apply
    pub fn url(&self) -> String {
        format!("file://{}", self.dir.path().display())
    }
}

/// A server on 127.0.0.1 with its own scratch root
pub struct TestServer {
    pub base_url: String,
    pub scratch_root: PathBuf,
    pub client: reqwest::Client,
    shutdown: ShutdownCoordinator,
    _work: TempDir,
}

impl TestServer {
    pub async fn start(webhook_url: Option<String>) -> Self {
        Self::start_with(webhook_url, Duration::from_secs(30)).await
    }

    pub async fn start_with(webhook_url: Option<String>, clone_timeout: Duration) -> Self {
        let fetcher = RepositoryFetcher::new(clone_timeout).with_insecure_transports(true);
        Self::start_with_fetcher(webhook_url, fetcher).await
    }

    pub async fn start_with_fetcher(webhook_url: Option<String>, fetcher: RepositoryFetcher) -> Self {
        let work = TempDir::new().expect("create temp dir");
        let scratch = ScratchManager::new(work.path().join("scratch"));
        scratch.prepare_root().expect("scratch root");
        let scratch_root = scratch.root().to_path_buf();

        let notifier =
            OutcomeNotifier::new(webhook_url, None, Duration::from_secs(5)).expect("notifier");
        let state = AppState::new(
            TEST_SECRET,
            test_key(),
            fetcher,
            scratch,
            notifier,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let shutdown = ShutdownCoordinator::new();
        tokio::spawn(server::serve(listener, state, shutdown.clone()));

        Self {
            base_url: format!("http://{}", addr),
            scratch_root,
            client: reqwest::Client::new(),
            shutdown,
            _work: work,
        }
    }

    pub async fn post_webhook(&self, secret: Option<&str>, body: &str) -> reqwest::Response {
        self.post_webhook_with_id(secret, body, None).await
    }

    pub async fn post_webhook_with_id(
        &self,
        secret: Option<&str>,
        body: &str,
        request_id: Option<&str>,
    ) -> reqwest::Response {
        let mut request = self
            .client
            .post(format!("{}/webhook", self.base_url))
            .header("Content-Type", "application/json")
            .body(body.to_string());
        if let Some(secret) = secret {
            request = request.header("X-Secret", secret);
        }
        if let Some(id) = request_id {
            request = request.header("X-Request-Id", id);
        }
        request.send().await.expect("request reaches server")
    }

    /// Workspace names left under the scratch root
    pub fn scratch_entries(&self) -> Vec<String> {
        std::fs::read_dir(&self.scratch_root)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .filter(|name| name != ROOT_MARKER)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger_shutdown();
    }
}

pub fn submission_body(repo_url: &str) -> String {
    serde_json::json!({
        "repo_url": repo_url,
        "users": [{ "login": "jdoe", "projects_user_id": 4242 }],
        "project": { "slug": "libft" }
    })
    .to_string()
}

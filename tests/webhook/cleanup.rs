//! Scratch workspaces never outlive their request

use crate::common::{submission_body, SourceRepo, TestServer, TEST_SECRET};
use std::time::Duration;
use submission_check::fetcher::RepositoryFetcher;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_workspace_removed_after_success() {
    let server = TestServer::start(None).await;
    let repo = SourceRepo::with_files(&["main.c", "notes.txt"]);

    let response = server
        .post_webhook_with_id(Some(TEST_SECRET), &submission_body(&repo.url()), Some("req-ok"))
        .await;

    assert_eq!(response.status(), 200);
    assert!(!server.scratch_root.join("req-ok").exists());
    assert!(server.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_failed_clone_cleans_up_and_skips_notification() {
    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&hook)
        .await;
    let server = TestServer::start(Some(hook.uri())).await;
    let missing = tempfile::TempDir::new().unwrap();
    let url = format!("file://{}/does-not-exist.git", missing.path().display());

    let response = server
        .post_webhook_with_id(Some(TEST_SECRET), &submission_body(&url), Some("req-fail"))
        .await;

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Failed to clone repo" }));
    assert!(!server.scratch_root.join("req-fail").exists());
    assert!(server.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_rejected_url_cleans_up() {
    let server = TestServer::start(None).await;

    let response = server
        .post_webhook(Some(TEST_SECRET), &submission_body("ext::sh -c touch% /tmp/pwned"))
        .await;

    assert_eq!(response.status(), 500);
    assert!(server.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_clone_timeout_cleans_up() {
    // Accepts connections but never speaks the git protocol
    let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = silent.local_addr().unwrap().port();
    let server = TestServer::start_with(None, Duration::from_secs(1)).await;

    let started = std::time::Instant::now();
    let response = server
        .post_webhook(
            Some(TEST_SECRET),
            &submission_body(&format!("git://127.0.0.1:{}/repo.git", port)),
        )
        .await;

    assert_eq!(response.status(), 500);
    assert!(started.elapsed() < Duration::from_secs(15));
    assert!(server.scratch_entries().is_empty());
    drop(silent);
}

#[tokio::test]
async fn test_local_repository_refused_without_opt_in() {
    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&hook)
        .await;
    let server = TestServer::start_with_fetcher(Some(hook.uri()), RepositoryFetcher::default()).await;
    let repo = SourceRepo::with_files(&["main.c"]);

    let response = server
        .post_webhook(Some(TEST_SECRET), &submission_body(&repo.url()))
        .await;

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Failed to clone repo" }));
    assert!(server.scratch_entries().is_empty());
}

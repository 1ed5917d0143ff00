//! Requests that must stop before any clone, scan or notification

use crate::common::{submission_body, SourceRepo, TestServer, TEST_SECRET};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn silent_webhook() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_missing_secret_is_unauthorized() {
    let hook = silent_webhook().await;
    let server = TestServer::start(Some(hook.uri())).await;
    let repo = SourceRepo::with_files(&["main.c"]);

    let response = server.post_webhook(None, &submission_body(&repo.url())).await;

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Bad Request" }));
    assert!(server.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    let hook = silent_webhook().await;
    let server = TestServer::start(Some(hook.uri())).await;
    let repo = SourceRepo::with_files(&["main.c"]);

    let response = server
        .post_webhook(Some("not-the-secret"), &submission_body(&repo.url()))
        .await;

    assert_eq!(response.status(), 401);
    assert!(server.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_secret_checked_before_payload() {
    let server = TestServer::start(None).await;

    let response = server.post_webhook(None, "{not json").await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let hook = silent_webhook().await;
    let server = TestServer::start(Some(hook.uri())).await;

    let response = server.post_webhook(Some(TEST_SECRET), "{not json").await;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Invalid JSON payload" }));
}

#[tokio::test]
async fn test_missing_repo_url_is_bad_request() {
    let hook = silent_webhook().await;
    let server = TestServer::start(Some(hook.uri())).await;

    for body in [
        r#"{"users": [{"login": "jdoe"}]}"#,
        r#"{"repo_url": ""}"#,
        r#"{"repo_url": null}"#,
    ] {
        let response = server.post_webhook(Some(TEST_SECRET), body).await;

        assert_eq!(response.status(), 400, "body: {}", body);
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Repository URL is required" }));
    }
    assert!(server.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_health_needs_no_secret() {
    let server = TestServer::start(None).await;

    let response = server
        .client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_get_webhook_not_allowed() {
    let server = TestServer::start(None).await;

    let response = server
        .client
        .get(format!("{}/webhook", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
}

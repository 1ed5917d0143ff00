//! Submissions that are cloned, scanned and reported

use crate::common::{submission_body, SourceRepo, TestServer, TEST_SECRET};
use submission_check::server::{SUCCESS_MESSAGE, VIOLATION_MESSAGE};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn recording_webhook(status: u16, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

async fn only_embed(hook: &MockServer) -> serde_json::Value {
    let requests = hook.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "exactly one notification");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    body["embeds"][0].clone()
}

#[tokio::test]
async fn test_compliant_submission() {
    let hook = recording_webhook(204, 1).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let repo = SourceRepo::with_files(&["main.c", "util.h", "Makefile"]);

    let response = server
        .post_webhook(Some(TEST_SECRET), &submission_body(&repo.url()))
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "message": SUCCESS_MESSAGE }));

    let embed = only_embed(&hook).await;
    assert_eq!(embed["title"], "jdoe - libft");
    assert_eq!(embed["description"], "All files match the allowed extensions.");
}

#[tokio::test]
async fn test_violating_submission() {
    let hook = recording_webhook(204, 1).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let repo = SourceRepo::with_files(&["main.c", "notes.txt"]);

    let response = server
        .post_webhook(Some(TEST_SECRET), &submission_body(&repo.url()))
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], VIOLATION_MESSAGE);
    assert_eq!(body["invalid_files"], serde_json::json!(["notes.txt"]));

    let embed = only_embed(&hook).await;
    let description = embed["description"].as_str().unwrap();
    assert!(description.starts_with("Invalid files detected:\n"));
    assert!(description.contains("notes.txt"));
}

#[tokio::test]
async fn test_git_metadata_never_reported() {
    let hook = recording_webhook(204, 1).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let repo = SourceRepo::with_files(&["src/main.c", "include/list.hpp"]);

    let response = server
        .post_webhook(Some(TEST_SECRET), &submission_body(&repo.url()))
        .await;

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], SUCCESS_MESSAGE);
    assert!(body.get("invalid_files").is_none());
}

#[tokio::test]
async fn test_nested_violations_are_relative() {
    let hook = recording_webhook(204, 1).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let repo = SourceRepo::with_files(&["src/main.c", "src/helper.py", "docs/README.md", "main.C"]);

    let response = server
        .post_webhook(Some(TEST_SECRET), &submission_body(&repo.url()))
        .await;

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["invalid_files"],
        serde_json::json!(["docs/README.md", "src/helper.py"])
    );
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_request() {
    let hook = recording_webhook(500, 1).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let repo = SourceRepo::with_files(&["main.c", "notes.txt"]);

    let response = server
        .post_webhook(Some(TEST_SECRET), &submission_body(&repo.url()))
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["invalid_files"], serde_json::json!(["notes.txt"]));
}

#[tokio::test]
async fn test_disabled_notifications() {
    let server = TestServer::start(None).await;
    let repo = SourceRepo::with_files(&["main.c"]);

    let response = server
        .post_webhook(Some(TEST_SECRET), &submission_body(&repo.url()))
        .await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_minimal_payload_uses_placeholders() {
    let hook = recording_webhook(204, 1).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let repo = SourceRepo::with_files(&["main.c"]);
    let body = serde_json::json!({ "repo_url": repo.url() }).to_string();

    let response = server.post_webhook(Some(TEST_SECRET), &body).await;

    assert_eq!(response.status(), 200);
    let embed = only_embed(&hook).await;
    assert_eq!(embed["title"], "unknown - unknown");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start(None).await;
    let repo = SourceRepo::with_files(&["main.c"]);

    let response = server
        .post_webhook_with_id(Some(TEST_SECRET), &submission_body(&repo.url()), Some("delivery-17"))
        .await;

    assert_eq!(
        response.headers().get("x-request-id").unwrap().to_str().unwrap(),
        "delivery-17"
    );
}

#[tokio::test]
async fn test_concurrent_submissions_are_isolated() {
    let hook = recording_webhook(204, 4).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let clean_a = SourceRepo::with_files(&["a.c"]);
    let clean_b = SourceRepo::with_files(&["b.cpp", "Makefile"]);
    let dirty_a = SourceRepo::with_files(&["x.c", "x.txt"]);
    let dirty_b = SourceRepo::with_files(&["y.rs"]);

    let body_a = submission_body(&clean_a.url());
    let body_b = submission_body(&clean_b.url());
    let body_c = submission_body(&dirty_a.url());
    let body_d = submission_body(&dirty_b.url());
    let (ra, rb, rc, rd) = tokio::join!(
        server.post_webhook(Some(TEST_SECRET), &body_a),
        server.post_webhook(Some(TEST_SECRET), &body_b),
        server.post_webhook(Some(TEST_SECRET), &body_c),
        server.post_webhook(Some(TEST_SECRET), &body_d),
    );

    let a: serde_json::Value = ra.json().await.unwrap();
    let b: serde_json::Value = rb.json().await.unwrap();
    let c: serde_json::Value = rc.json().await.unwrap();
    let d: serde_json::Value = rd.json().await.unwrap();

    assert_eq!(a["message"], SUCCESS_MESSAGE);
    assert_eq!(b["message"], SUCCESS_MESSAGE);
    assert_eq!(c["invalid_files"], serde_json::json!(["x.txt"]));
    assert_eq!(d["invalid_files"], serde_json::json!(["y.rs"]));
    assert!(server.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_redelivered_request_id_runs_both() {
    let hook = recording_webhook(204, 2).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let repo = SourceRepo::with_files(&["main.c", "Makefile"]);
    let body = submission_body(&repo.url());

    let (first, second) = tokio::join!(
        server.post_webhook_with_id(Some(TEST_SECRET), &body, Some("delivery-1")),
        server.post_webhook_with_id(Some(TEST_SECRET), &body, Some("delivery-1")),
    );

    for response in [first, second] {
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("x-request-id").unwrap().to_str().unwrap(),
            "delivery-1"
        );
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["message"], SUCCESS_MESSAGE);
    }
    assert!(server.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_unusual_metadata_shapes_are_processed() {
    let hook = recording_webhook(204, 3).await;
    let server = TestServer::start(Some(format!("{}/hook", hook.uri()))).await;
    let repo = SourceRepo::with_files(&["main.c"]);

    for users in [
        serde_json::json!([{ "login": 42 }]),
        serde_json::json!(["jdoe"]),
        serde_json::json!({ "login": "jdoe" }),
    ] {
        let body = serde_json::json!({ "repo_url": repo.url(), "users": users }).to_string();

        let response = server.post_webhook(Some(TEST_SECRET), &body).await;

        assert_eq!(response.status(), 200, "users: {}", users);
    }

    let titles: Vec<String> = hook
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["embeds"][0]["title"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(titles, vec!["42 - unknown", "jdoe - unknown", "jdoe - unknown"]);
}

#[tokio::test]
async fn test_non_string_repo_url_is_bad_request() {
    let server = TestServer::start(None).await;

    let response = server
        .post_webhook(Some(TEST_SECRET), r#"{"repo_url": 5, "users": ["jdoe"]}"#)
        .await;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Invalid JSON payload" }));
}

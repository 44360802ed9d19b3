// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end REST scenarios against the mock session.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use wamcp_core::SessionState;
use wamcp_core::session::ParticipantOutcome;
use wamcp_gateway::{ApiState, ServerConfig, router};
use wamcp_service::EmbeddedService;
use wamcp_test_utils::{MockSession, fixtures};

const KEY: &str = "test-key";

fn app_with(
    session: Arc<MockSession>,
    api_key: Option<&str>,
    media_dir: &std::path::Path,
) -> Router {
    let state = ApiState {
        service: Arc::new(EmbeddedService::new(session)),
        media_dir: media_dir.to_path_buf(),
        hide_error_details: false,
    };
    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        base_path: "/api".into(),
        api_key: api_key.map(str::to_string),
    };
    router(state, &config)
}

fn app(session: MockSession) -> Router {
    app_with(Arc::new(session), None, std::env::temp_dir().as_path())
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn contacts_are_exactly_the_individual_peers() {
    let (status, body) = call(app(fixtures::sample_session()), "GET", "/api/contacts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"name": "Alice", "number": "111"}, {"name": "Bob", "number": "222"}])
    );
}

#[tokio::test]
async fn sending_to_unregistered_number_is_404() {
    let (status, body) = call(
        app(fixtures::sample_session()),
        "POST",
        "/api/send",
        Some(json!({"number": "555", "message": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not registered"));
}

#[tokio::test]
async fn group_search_matches_name_and_description() {
    let (status, body) = call(
        app(fixtures::sample_session()),
        "GET",
        "/api/groups/search?query=proj",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Project X", "Lunch"]);
}

#[tokio::test]
async fn partial_participant_add_reports_failures() {
    let session = fixtures::sample_session().with_add_outcomes(vec![
        ParticipantOutcome {
            id: "111@c.us".into(),
            code: 200,
            message: None,
        },
        ParticipantOutcome {
            id: "222@c.us".into(),
            code: 408,
            message: None,
        },
    ]);
    let (status, body) = call(
        app(session),
        "POST",
        "/api/groups/120363@g.us/participants/add",
        Some(json!({"participants": ["111", "222"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": false,
            "added": ["111"],
            "failed": [{"number": "222", "reason": "Failed with code 408"}]
        })
    );
}

#[tokio::test]
async fn media_download_without_attachment_is_404() {
    let session = fixtures::sample_session().with_messages(
        "111@c.us",
        vec![fixtures::message("111@c.us", "T1", "plain text", 1)],
    );
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = call(
        app_with(Arc::new(session), None, dir.path()),
        "POST",
        "/api/messages/false_111@c.us_T1/media/download",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("does not contain media"));
}

#[tokio::test]
async fn media_download_writes_into_configured_dir() {
    let mut msg = fixtures::message("111@c.us", "M1", "", 1);
    msg.has_media = true;
    let session = fixtures::sample_session()
        .with_messages("111@c.us", vec![msg])
        .with_media("false_111@c.us_M1", fixtures::image_media(b"png"));
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = call(
        app_with(Arc::new(session), None, dir.path()),
        "POST",
        "/api/messages/false_111@c.us_M1/media/download",
        Some(json!({"downloadPath": "/somewhere/else"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let path = body["filePath"].as_str().unwrap();
    assert!(path.starts_with(dir.path().to_str().unwrap()));
    assert_eq!(body["mimeType"], "image/png");
}

#[tokio::test]
async fn not_ready_is_503() {
    let session = fixtures::sample_session();
    session.set_state(SessionState::Unauthenticated);
    let (status, body) = call(app(session), "GET", "/api/chats", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("not ready"));
}

#[tokio::test]
async fn status_is_available_while_pairing() {
    let session = fixtures::sample_session();
    session.set_state(SessionState::Pairing);
    let (status, body) = call(app(session), "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "disconnected"}));
}

#[tokio::test]
async fn missing_fields_are_400() {
    let cases = [
        ("GET", "/api/contacts/search", None, "Search query is required"),
        ("GET", "/api/groups/search?query=", None, "Search query is required"),
        (
            "POST",
            "/api/send",
            Some(json!({"number": "111"})),
            "Number and message are required",
        ),
        ("POST", "/api/groups/120363/send", Some(json!({})), "Message is required"),
        (
            "POST",
            "/api/groups/120363/participants/add",
            Some(json!({"participants": []})),
            "Participants are required",
        ),
    ];
    for (method, uri, body, expected) in cases {
        let (status, response) = call(app(fixtures::sample_session()), method, uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(response["error"], expected, "{uri}");
    }
}

#[tokio::test]
async fn malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/send")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(fixtures::sample_session()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unsupported_capability_is_501() {
    let (status, _) = call(
        app(fixtures::sample_session()),
        "POST",
        "/api/groups/120363/participants/add",
        Some(json!({"participants": ["111"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn internal_failures_carry_operation_and_details() {
    let session = fixtures::sample_session().with_failure("get_chats", "browser crashed");
    let (status, body) = call(app(session), "GET", "/api/chats", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch chats");
    assert_eq!(body["details"], "Failed to fetch chats: browser crashed");
}

#[tokio::test]
async fn bearer_key_guards_every_api_route() {
    let session = Arc::new(fixtures::sample_session());
    let dir = std::env::temp_dir();

    let guarded = app_with(session.clone(), Some(KEY), &dir);
    let (status, body) = call(guarded, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));

    let request = Request::builder()
        .uri("/api/contacts")
        .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
        .body(Body::empty())
        .unwrap();
    let response = app_with(session.clone(), Some(KEY), &dir)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/api/contacts")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = app_with(session.clone(), Some(KEY), &dir)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = call(app_with(session, Some(KEY), &dir), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote backend against a mock REST deployment.

use std::path::Path;

use serde_json::json;
use wamcp_core::{ErrorKind, WhatsAppService};
use wamcp_service::RemoteService;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn remote(server: &MockServer) -> RemoteService {
    RemoteService::new(&format!("{}/api", server.uri()), "test-key").unwrap()
}

#[tokio::test]
async fn forwards_bearer_key_and_decodes_contacts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Alice", "number": "111"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let contacts = remote(&server).await.get_contacts().await.unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].name, "Alice");
}

#[tokio::test]
async fn passes_limit_and_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages/111"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "false_111@c.us_A", "body": "hi", "fromMe": false,
             "timestamp": "2023-11-14T22:13:20.000Z", "contact": "Alice", "type": "chat"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/groups/search"))
        .and(query_param("query", "proj"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let svc = remote(&server).await;
    let messages = svc.get_messages("111", 5).await.unwrap();
    assert_eq!(messages[0].kind, "chat");
    assert!(svc.search_groups("proj").await.unwrap().is_empty());
}

#[tokio::test]
async fn posts_json_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send/media"))
        .and(body_json(json!({
            "number": "111", "source": "https://x/cat.png", "caption": "look"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messageId": "true_111@c.us_X",
            "mediaInfo": {"mimeType": "image/png", "filename": "cat.png", "size": 3}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/groups/120363@g.us/participants/add"))
        .and(body_json(json!({"participants": ["111", "222"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false, "added": ["111"],
            "failed": [{"number": "222", "reason": "Failed with code 403"}]
        })))
        .mount(&server)
        .await;

    let svc = remote(&server).await;
    let sent = svc
        .send_media_message("111", "https://x/cat.png", Some("look"))
        .await
        .unwrap();
    assert_eq!(sent.media_info.size, 3);

    let added = svc
        .add_participants_to_group("120363@g.us", &["111".to_string(), "222".to_string()])
        .await
        .unwrap();
    assert!(!added.success);
    assert_eq!(added.failed.unwrap()[0].number, "222");
}

#[tokio::test]
async fn error_status_maps_to_kind_without_double_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Failed to send message: Mobile number 555 is not registered on WhatsApp"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Failed to fetch chats: WhatsApp client not ready. Please try again later."
        })))
        .mount(&server)
        .await;

    let svc = remote(&server).await;
    let err = svc.send_message("555", "hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        "Failed to send message: Mobile number 555 is not registered on WhatsApp"
    );

    let err = svc.get_chats().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotReady);
}

#[tokio::test]
async fn media_download_ignores_local_storage_dir() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/messages/true_111@c.us_ABC/media/download"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Failed to download media: Message does not contain media"
        })))
        .mount(&server)
        .await;

    let err = remote(&server)
        .await
        .download_media_from_message("true_111@c.us_ABC", Path::new("/nonexistent"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("does not contain media"));
}

#[tokio::test]
async fn unreachable_server_is_internal_with_operation() {
    let server = MockServer::start().await;
    let uri = format!("{}/api", server.uri());
    drop(server);

    let svc = RemoteService::new(&uri, "k").unwrap();
    let err = svc.get_groups().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.operation(), Some("Failed to fetch groups"));
}

#[tokio::test]
async fn malformed_success_body_is_internal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = remote(&server).await.get_status().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.to_string().starts_with("Failed to get client status: "));
}

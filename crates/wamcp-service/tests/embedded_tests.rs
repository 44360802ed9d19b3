// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded backend behaviour against the mock session.

use std::sync::Arc;

use base64::Engine;
use wamcp_core::session::{OutgoingMessage, ParticipantOutcome, WaMessage};
use wamcp_core::{ErrorKind, SessionState, WhatsAppService};
use wamcp_service::EmbeddedService;
use wamcp_test_utils::{MockSession, fixtures};

fn service(session: MockSession) -> (Arc<MockSession>, EmbeddedService) {
    let session = Arc::new(session);
    let service = EmbeddedService::new(session.clone());
    (session, service)
}

#[tokio::test]
async fn contacts_exclude_self_and_groups() {
    let (_, svc) = service(fixtures::sample_session());
    let contacts = svc.get_contacts().await.unwrap();
    let pairs: Vec<_> = contacts
        .iter()
        .map(|c| (c.name.as_str(), c.number.as_str()))
        .collect();
    assert_eq!(pairs, vec![("Alice", "111"), ("Bob", "222")]);
}

#[tokio::test]
async fn search_contacts_is_a_subset_of_contacts() {
    let (_, svc) = service(fixtures::sample_session());
    let all = svc.get_contacts().await.unwrap();
    for query in ["", "a", "ALICE", "22", "999", "zzz"] {
        let found = svc.search_contacts(query).await.unwrap();
        assert!(found.iter().all(|c| all.contains(c)), "query {query}");
    }
    let bob = svc.search_contacts("bo").await.unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].number, "222");
}

#[tokio::test]
async fn not_ready_rejects_without_backend_calls() {
    let (session, svc) = service(fixtures::sample_session());
    session.set_state(SessionState::Pairing);
    let dir = tempfile::tempdir().unwrap();
    let participants = vec!["111".to_string()];

    let results = vec![
        svc.get_contacts().await.map(|_| ()),
        svc.search_contacts("a").await.map(|_| ()),
        svc.get_chats().await.map(|_| ()),
        svc.get_messages("111", 10).await.map(|_| ()),
        svc.send_message("111", "hi").await.map(|_| ()),
        svc.get_groups().await.map(|_| ()),
        svc.get_group_by_id("120363").await.map(|_| ()),
        svc.search_groups("p").await.map(|_| ()),
        svc.create_group("g", &participants).await.map(|_| ()),
        svc.add_participants_to_group("120363", &participants)
            .await
            .map(|_| ()),
        svc.get_group_messages("120363", 10).await.map(|_| ()),
        svc.send_group_message("120363", "hi").await.map(|_| ()),
        svc.download_media_from_message("id", dir.path())
            .await
            .map(|_| ()),
        svc.send_media_message("111", "file:///tmp/x.png", None)
            .await
            .map(|_| ()),
    ];
    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert!(err.to_string().contains("not ready"));
    }
    assert_eq!(session.backend_calls(), 0);

    let status = svc.get_status().await.unwrap();
    assert_eq!(status.status.to_string(), "disconnected");
    assert!(status.info.is_none());
}

#[tokio::test]
async fn status_reports_connected_with_info() {
    let (_, svc) = service(fixtures::sample_session());
    let status = svc.get_status().await.unwrap();
    assert_eq!(status.status.to_string(), "connected");
    assert_eq!(status.info.unwrap().wid, fixtures::SELF_ID);
}

#[tokio::test]
async fn chats_carry_last_message_and_iso_timestamp() {
    let mut chat = fixtures::direct_chat("111", "Alice");
    chat.unread_count = 2;
    chat.last_message = Some(fixtures::message("111@c.us", "A", "see you", 1_700_000_000));
    let (_, svc) = service(MockSession::ready().with_chat(chat));
    let chats = svc.get_chats().await.unwrap();
    assert_eq!(chats[0].last_message.as_deref(), Some("see you"));
    assert_eq!(chats[0].timestamp.as_deref(), Some("2023-11-14T22:13:20.000Z"));
    assert_eq!(chats[0].unread_count, 2);
}

#[tokio::test]
async fn messages_are_bounded_and_labelled() {
    let mut mine = fixtures::message("111@c.us", "C", "reply", 3);
    mine.from_me = true;
    let history: Vec<WaMessage> = vec![
        fixtures::message("111@c.us", "A", "one", 1),
        fixtures::message("111@c.us", "B", "two", 2),
        mine,
    ];
    let (_, svc) = service(fixtures::sample_session().with_messages("111@c.us", history));

    let page = svc.get_messages("(11)-1", 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].body, "two");
    assert_eq!(page[0].contact.as_deref(), Some("Alice"));
    assert_eq!(page[0].id, "false_111@c.us_B");
    assert!(page[1].from_me);
    assert!(page[1].contact.is_none());
}

#[tokio::test]
async fn unregistered_number_is_not_found() {
    let (session, svc) = service(fixtures::sample_session());
    let err = svc.send_message("555", "hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        "Failed to send message: Mobile number 555 is not registered on WhatsApp"
    );
    assert!(session.sent().is_empty());

    let err = svc.send_message("  ", "hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn send_message_resolves_number_and_returns_id() {
    let (session, svc) = service(fixtures::sample_session());
    let result = svc.send_message("111@c.us", "hello").await.unwrap();
    let sent = session.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, "111@c.us");
    assert_eq!(sent[0].message_id, result.message_id);
    assert_eq!(
        sent[0].message,
        OutgoingMessage::Text {
            body: "hello".into()
        }
    );
}

#[tokio::test]
async fn groups_resolve_participant_names() {
    let (_, svc) = service(fixtures::sample_session());
    let groups = svc.get_groups().await.unwrap();
    assert_eq!(groups.len(), 2);
    let project = &groups[0];
    assert_eq!(project.name, "Project X");
    assert_eq!(project.description, "planning");
    assert_eq!(project.created_at.as_deref(), Some("2023-11-14T22:13:20.000Z"));
    let names: Vec<_> = project.participants.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert!(project.participants[0].is_admin);
    assert!(!project.participants[1].is_admin);
}

#[tokio::test]
async fn unknown_participant_falls_back_to_number() {
    let chat = fixtures::group_chat("120365", "Strangers", "", &["777"]);
    let (_, svc) = service(MockSession::ready().with_chat(chat));
    let group = svc.get_group_by_id("120365").await.unwrap();
    assert_eq!(group.participants[0].name, "777");
    assert_eq!(group.participants[0].number, "777");
}

#[tokio::test]
async fn search_groups_matches_name_or_description() {
    let (_, svc) = service(fixtures::sample_session());
    let found = svc.search_groups("proj").await.unwrap();
    let names: Vec<_> = found.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Project X", "Lunch"]);
    assert!(svc.search_groups("plan").await.unwrap().len() == 1);
}

#[tokio::test]
async fn direct_chat_is_not_a_group() {
    let mut chat = fixtures::group_chat("333", "Carol", "", &[]);
    chat.is_group = false;
    let (_, svc) = service(fixtures::sample_session().with_chat(chat));
    let err = svc.get_group_by_id("333@g.us").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("not a group chat"));
}

#[tokio::test]
async fn contact_id_is_looked_up_as_a_group_id() {
    let (_, svc) = service(fixtures::sample_session());
    let err = svc.get_group_by_id("111@c.us").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("111@g.us"), "{err}");

    let group = svc.get_group_by_id("120363@c.us").await.unwrap();
    assert_eq!(group.name, "Project X");
}

#[tokio::test]
async fn create_group_normalizes_participants() {
    let (session, svc) = service(fixtures::sample_session());
    let participants = vec!["111".to_string(), "222@c.us".to_string()];
    let created = svc.create_group("Team", &participants).await.unwrap();
    assert_eq!(created.group_id, "120399@g.us");
    assert_eq!(created.invite_code.as_deref(), Some("MOCKINVITE"));
    assert_eq!(
        session.created_groups(),
        vec![(
            "Team".to_string(),
            vec!["111@c.us".to_string(), "222@c.us".to_string()]
        )]
    );

    let err = svc.create_group(" ", &participants).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn add_participants_partitions_outcomes() {
    let session = fixtures::sample_session().with_add_outcomes(vec![
        ParticipantOutcome {
            id: "111@c.us".into(),
            code: 200,
            message: None,
        },
        ParticipantOutcome {
            id: "222@c.us".into(),
            code: 403,
            message: Some("Privacy settings prevent adding".into()),
        },
    ]);
    let (_, svc) = service(session);
    let participants = vec!["111".to_string(), "222".to_string()];
    let result = svc
        .add_participants_to_group("120363@g.us", &participants)
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.added, vec!["111"]);
    let failed = result.failed.unwrap();
    assert_eq!(failed[0].number, "222");
    assert_eq!(failed[0].reason, "Privacy settings prevent adding");
}

#[tokio::test]
async fn add_participants_without_capability_is_not_supported() {
    let (_, svc) = service(fixtures::sample_session());
    let err = svc
        .add_participants_to_group("120363", &["111".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
    assert!(err
        .to_string()
        .starts_with("Failed to add participants to group: "));
}

#[tokio::test]
async fn group_messages_and_sends_target_the_group_chat() {
    let mut from_bob = fixtures::message("120363@g.us", "G1", "agenda?", 10);
    from_bob.author = Some("222@c.us".into());
    let (session, svc) = service(
        fixtures::sample_session().with_messages("120363@g.us", vec![from_bob]),
    );
    let messages = svc.get_group_messages("120363", 10).await.unwrap();
    assert_eq!(messages[0].contact.as_deref(), Some("222"));

    svc.send_group_message("120363", "at noon").await.unwrap();
    assert_eq!(session.sent()[0].chat_id, "120363@g.us");
}

#[tokio::test]
async fn backend_failures_keep_their_kind_under_the_prefix() {
    let (_, svc) = service(
        fixtures::sample_session().with_failure("get_chats", "session not ready: reconnecting"),
    );
    let err = svc.get_chats().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotReady);
    assert_eq!(
        err.to_string(),
        "Failed to fetch chats: session not ready: reconnecting"
    );
}

#[tokio::test]
async fn download_media_writes_file() {
    let mut with_media = fixtures::message("111@c.us", "M1", "", 5);
    with_media.has_media = true;
    let id = with_media.id.clone();
    let session = fixtures::sample_session()
        .with_messages("111@c.us", vec![with_media, fixtures::message("111@c.us", "M2", "txt", 6)])
        .with_media(&id, fixtures::image_media(b"img"));
    let (_, svc) = service(session);
    let dir = tempfile::tempdir().unwrap();

    let desc = svc.download_media_from_message(&id, dir.path()).await.unwrap();
    assert_eq!(desc.message_id, id);
    assert_eq!(desc.mime_type, "image/png");
    assert_eq!(std::fs::read(&desc.file_path).unwrap(), b"img");

    let err = svc
        .download_media_from_message("false_111@c.us_M2", dir.path())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("does not contain media"));

    let err = svc
        .download_media_from_message("nope", dir.path())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Message not found"));
}

#[tokio::test]
async fn send_media_accepts_local_images_only() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("cat.png");
    std::fs::write(&image, b"png-bytes").unwrap();
    let doc = dir.path().join("notes.pdf");
    std::fs::write(&doc, b"%PDF").unwrap();

    let (session, svc) = service(fixtures::sample_session());
    let source = format!("file://{}", image.display());
    let result = svc
        .send_media_message("111", &source, Some("look"))
        .await
        .unwrap();
    assert_eq!(result.media_info.mime_type, "image/png");
    assert_eq!(result.media_info.filename, "cat.png");
    assert_eq!(result.media_info.size, 9);
    match &session.sent()[0].message {
        OutgoingMessage::Media { data, caption, .. } => {
            assert_eq!(
                base64::engine::general_purpose::STANDARD.decode(data).unwrap(),
                b"png-bytes"
            );
            assert_eq!(caption.as_deref(), Some("look"));
        }
        other => panic!("unexpected {other:?}"),
    }

    let err = svc
        .send_media_message("111", &format!("file://{}", doc.display()), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("Only images are supported"));

    let err = svc
        .send_media_message("111", "ftp://example.com/cat.png", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(session.sent().len(), 1);
}

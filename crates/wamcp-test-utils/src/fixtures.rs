// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record builders for tests.

use base64::Engine;
use wamcp_core::session::{
    WaChat, WaContact, WaGroupMetadata, WaMedia, WaMessage, WaParticipant,
};

use crate::MockSession;

/// Serialized id of the account the mock is logged in as.
pub const SELF_ID: &str = "999@c.us";

/// An individual user contact.
pub fn contact(number: &str, pushname: &str) -> WaContact {
    WaContact {
        id: format!("{number}@c.us"),
        number: number.to_string(),
        pushname: Some(pushname.to_string()),
        name: None,
        is_user: true,
        is_me: false,
        is_group: false,
    }
}

/// The logged-in account as it appears in its own contact list.
pub fn self_contact() -> WaContact {
    WaContact {
        is_me: true,
        ..contact("999", "Me")
    }
}

/// The pseudo-contact a group chat shows up as.
pub fn group_contact(group_id: &str, name: &str) -> WaContact {
    WaContact {
        id: format!("{group_id}@g.us"),
        number: group_id.to_string(),
        pushname: None,
        name: Some(name.to_string()),
        is_user: false,
        is_me: false,
        is_group: true,
    }
}

/// A chat message at `timestamp` Unix seconds.
pub fn message(chat_id: &str, short_id: &str, body: &str, timestamp: i64) -> WaMessage {
    WaMessage {
        id: format!("false_{chat_id}_{short_id}"),
        body: body.to_string(),
        from_me: false,
        timestamp,
        author: None,
        kind: "chat".to_string(),
        has_media: false,
    }
}

/// A one-to-one chat.
pub fn direct_chat(number: &str, name: &str) -> WaChat {
    WaChat {
        id: format!("{number}@c.us"),
        name: name.to_string(),
        is_group: false,
        unread_count: 0,
        timestamp: None,
        last_message: None,
        group_metadata: None,
    }
}

/// A group chat whose participants are given as bare numbers, first one admin.
pub fn group_chat(group_id: &str, name: &str, description: &str, members: &[&str]) -> WaChat {
    let participants = members
        .iter()
        .enumerate()
        .map(|(i, number)| WaParticipant {
            id: format!("{number}@c.us"),
            is_admin: i == 0,
            is_super_admin: false,
        })
        .collect();
    WaChat {
        id: format!("{group_id}@g.us"),
        name: name.to_string(),
        is_group: true,
        unread_count: 0,
        timestamp: None,
        last_message: None,
        group_metadata: Some(WaGroupMetadata {
            description: Some(description.to_string()),
            participants,
            creation: Some(1_700_000_000),
        }),
    }
}

/// A small PNG-typed attachment.
pub fn image_media(bytes: &[u8]) -> WaMedia {
    WaMedia {
        mimetype: "image/png".to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
        filename: None,
    }
}

/// A ready session with Alice/111 and Bob/222, the account itself, one group
/// pseudo-contact, and two groups: "Project X" and "Lunch".
pub fn sample_session() -> MockSession {
    MockSession::ready()
        .with_contact(contact("111", "Alice"))
        .with_contact(contact("222", "Bob"))
        .with_contact(self_contact())
        .with_contact(group_contact("120363", "Project X"))
        .with_chat(direct_chat("111", "Alice"))
        .with_chat(group_chat("120363", "Project X", "planning", &["111", "222"]))
        .with_chat(group_chat("120364", "Lunch", "project lunch", &["222"]))
}

// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Session Handle abstraction over the external messaging backend.
//!
//! Records in this module are what the backend hands back, before the service
//! adapter reshapes them into the caller-facing DTOs in [`crate::types`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::WaError;
use crate::ids::CONTACT_SERVER;
use crate::types::ClientInfo;

/// Connection lifecycle of a session.
///
/// `Unauthenticated -> Pairing -> Ready -> Disconnected`. Authentication
/// failure returns to `Unauthenticated`; a later `ready` recovers from any
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Pairing,
    Ready,
    Disconnected,
}

/// Lifecycle signal emitted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    QrAvailable,
    Ready,
    Authenticated,
    AuthFailure,
    Disconnected,
}

impl SessionState {
    /// The state after `signal` arrives.
    pub fn on(self, signal: LifecycleSignal) -> SessionState {
        match signal {
            LifecycleSignal::QrAvailable => SessionState::Pairing,
            LifecycleSignal::Ready => SessionState::Ready,
            LifecycleSignal::Authenticated => self,
            LifecycleSignal::AuthFailure => SessionState::Unauthenticated,
            LifecycleSignal::Disconnected => SessionState::Disconnected,
        }
    }

    pub fn is_ready(self) -> bool {
        self == SessionState::Ready
    }
}

/// A contact as known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaContact {
    /// Serialized id, e.g. `111@c.us`.
    pub id: String,
    pub number: String,
    #[serde(default)]
    pub pushname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_user: bool,
    #[serde(default)]
    pub is_me: bool,
    #[serde(default)]
    pub is_group: bool,
}

impl WaContact {
    /// The server part of the id (`c.us`, `g.us`, `lid`, ...).
    pub fn server(&self) -> &str {
        self.id.split_once('@').map_or("", |(_, server)| server)
    }

    /// Whether this is a real individual user other than the logged-in account.
    pub fn is_individual_peer(&self) -> bool {
        self.is_user && !self.is_me && self.server() == CONTACT_SERVER
    }

    /// Best available display name.
    pub fn display_name(&self) -> &str {
        self.pushname
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaParticipant {
    pub id: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_super_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaGroupMetadata {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub participants: Vec<WaParticipant>,
    /// Unix seconds.
    #[serde(default)]
    pub creation: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaMessage {
    /// Fully-serialized id.
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from_me: bool,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "type", default = "default_message_type")]
    pub kind: String,
    #[serde(default)]
    pub has_media: bool,
}

fn default_message_type() -> String {
    "chat".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaChat {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub unread_count: u32,
    /// Unix seconds of the last activity.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub last_message: Option<WaMessage>,
    #[serde(default)]
    pub group_metadata: Option<WaGroupMetadata>,
}

/// Downloaded attachment bytes, base64-encoded as the backend delivers them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaMedia {
    pub mimetype: String,
    pub data: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Content of an outbound send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutgoingMessage {
    Text {
        body: String,
    },
    Media {
        mimetype: String,
        /// Base64 payload.
        data: String,
        filename: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreated {
    pub id: String,
    #[serde(default)]
    pub invite_code: Option<String>,
}

/// Per-participant result of an add request. Code 200 means added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantOutcome {
    pub id: String,
    pub code: u16,
    #[serde(default)]
    pub message: Option<String>,
}

impl ParticipantOutcome {
    pub fn is_added(&self) -> bool {
        self.code == 200
    }
}

/// A live link to the messaging backend.
///
/// Implementations pass calls straight through. Readiness checks, input
/// validation and reshaping belong to the service adapter.
#[async_trait]
pub trait WhatsAppSession: Send + Sync {
    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Identity of the logged-in account, once ready.
    fn info(&self) -> Option<ClientInfo>;

    async fn get_contacts(&self) -> Result<Vec<WaContact>, WaError>;

    async fn get_contact_by_id(&self, contact_id: &str) -> Result<WaContact, WaError>;

    async fn get_chats(&self) -> Result<Vec<WaChat>, WaError>;

    async fn get_chat_by_id(&self, chat_id: &str) -> Result<WaChat, WaError>;

    /// Up to `limit` most recent messages of a chat, oldest first.
    async fn fetch_messages(&self, chat_id: &str, limit: usize)
    -> Result<Vec<WaMessage>, WaError>;

    /// Resolve a number to its registered serialized id, or `None` when the
    /// number has no account.
    async fn get_number_id(&self, number: &str) -> Result<Option<String>, WaError>;

    /// Send to a chat and return the fully-serialized id of the new message.
    async fn send_message(
        &self,
        chat_id: &str,
        message: OutgoingMessage,
    ) -> Result<String, WaError>;

    async fn create_group(
        &self,
        name: &str,
        participant_ids: &[String],
    ) -> Result<GroupCreated, WaError>;

    /// Add participants to a group. Backends without this capability keep the
    /// default.
    async fn add_participants(
        &self,
        _group_id: &str,
        _participant_ids: &[String],
    ) -> Result<Vec<ParticipantOutcome>, WaError> {
        Err(WaError::NotSupported(
            "Adding participants is not supported by this backend".into(),
        ))
    }

    async fn get_message_by_id(&self, message_id: &str) -> Result<Option<WaMessage>, WaError>;

    /// Download the attachment of a message, `None` when it has no media.
    async fn download_media(&self, message_id: &str) -> Result<Option<WaMedia>, WaError>;

    /// Release the session. Called once during shutdown.
    async fn destroy(&self) -> Result<(), WaError>;
}

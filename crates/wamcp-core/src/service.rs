// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The uniform service surface implemented by the embedded and remote backends.

use std::path::Path;

use async_trait::async_trait;

use crate::error::WaError;
use crate::types::{
    AddParticipantsResult, Chat, Contact, CreateGroupResult, Group, MediaDescriptor, Message,
    SendMediaResult, SendMessageResult, StatusResponse,
};

/// Page size used when a caller does not give a message limit.
pub const DEFAULT_MESSAGE_LIMIT: usize = 10;

/// Domain operations exposed to the REST router and the MCP bindings.
///
/// The backend is chosen once at startup. Both implementations return the
/// same DTO shapes and wrap every failure with an operation prefix that
/// keeps the underlying message.
#[async_trait]
pub trait WhatsAppService: Send + Sync {
    /// Connection status. Never fails because the session is not ready.
    async fn get_status(&self) -> Result<StatusResponse, WaError>;

    /// Individual users known to the session, excluding the account itself.
    async fn get_contacts(&self) -> Result<Vec<Contact>, WaError>;

    /// Contacts whose name contains `query` (case-insensitive) or whose
    /// number contains it.
    async fn search_contacts(&self, query: &str) -> Result<Vec<Contact>, WaError>;

    async fn get_chats(&self) -> Result<Vec<Chat>, WaError>;

    async fn get_messages(&self, number: &str, limit: usize) -> Result<Vec<Message>, WaError>;

    async fn send_message(&self, number: &str, message: &str)
    -> Result<SendMessageResult, WaError>;

    async fn get_groups(&self) -> Result<Vec<Group>, WaError>;

    async fn get_group_by_id(&self, group_id: &str) -> Result<Group, WaError>;

    /// Groups whose name or description contains `query`, case-insensitive.
    async fn search_groups(&self, query: &str) -> Result<Vec<Group>, WaError>;

    async fn create_group(
        &self,
        name: &str,
        participants: &[String],
    ) -> Result<CreateGroupResult, WaError>;

    async fn add_participants_to_group(
        &self,
        group_id: &str,
        participants: &[String],
    ) -> Result<AddParticipantsResult, WaError>;

    async fn get_group_messages(
        &self,
        group_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, WaError>;

    async fn send_group_message(
        &self,
        group_id: &str,
        message: &str,
    ) -> Result<SendMessageResult, WaError>;

    /// Save the attachment of `message_id` under `storage_dir`.
    ///
    /// The remote backend ignores `storage_dir`; the remote server stores the
    /// file in its own media directory.
    async fn download_media_from_message(
        &self,
        message_id: &str,
        storage_dir: &Path,
    ) -> Result<MediaDescriptor, WaError>;

    /// Send an image fetched from an `http(s)://` or `file://` source.
    async fn send_media_message(
        &self,
        number: &str,
        source: &str,
        caption: Option<&str>,
    ) -> Result<SendMediaResult, WaError>;
}

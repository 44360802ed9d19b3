// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service backend that talks to a live session in this process.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use wamcp_core::error::ResultExt;
use wamcp_core::ids::{bare_number, normalize_contact_id, normalize_group_id, sanitize_number};
use wamcp_core::session::{OutgoingMessage, WaChat, WaMessage};
use wamcp_core::time::iso_from_unix;
use wamcp_core::types::{
    AddParticipantsResult, Chat, ConnectionStatus, Contact, CreateGroupResult, FailedParticipant,
    Group, GroupParticipant, MediaDescriptor, MediaInfo, Message, SendMediaResult,
    SendMessageResult, StatusResponse,
};
use wamcp_core::{WaError, WhatsAppService, WhatsAppSession};

use crate::media::{self, MediaSource};

/// Adapter over a [`WhatsAppSession`].
///
/// Every operation checks readiness before touching the session, and
/// rewraps failures as `"<operation>: <cause>"`.
pub struct EmbeddedService {
    session: Arc<dyn WhatsAppSession>,
    http: reqwest::Client,
}

impl EmbeddedService {
    pub fn new(session: Arc<dyn WhatsAppSession>) -> Self {
        Self {
            session,
            http: reqwest::Client::new(),
        }
    }

    fn ensure_ready(&self) -> Result<(), WaError> {
        if self.session.state().is_ready() {
            Ok(())
        } else {
            Err(WaError::not_ready())
        }
    }

    /// Resolve a caller-supplied number to its registered chat id.
    async fn resolve_number(&self, number: &str) -> Result<String, WaError> {
        if number.trim().is_empty() {
            return Err(WaError::InvalidInput("Invalid phone number".into()));
        }
        let digits = sanitize_number(bare_number(number.trim()));
        self.session
            .get_number_id(&digits)
            .await?
            .ok_or_else(|| {
                WaError::NotFound(format!("Mobile number {number} is not registered on WhatsApp"))
            })
    }

    /// Look up a chat and require it to be a group.
    async fn group_chat(&self, group_id: &str) -> Result<WaChat, WaError> {
        if group_id.trim().is_empty() {
            return Err(WaError::InvalidInput("Invalid group ID".into()));
        }
        let chat = self
            .session
            .get_chat_by_id(&normalize_group_id(group_id))
            .await?;
        if chat.is_group {
            Ok(chat)
        } else {
            Err(WaError::NotFound("Chat is not a group chat".into()))
        }
    }

    async fn to_group(&self, chat: WaChat) -> Group {
        let metadata = chat.group_metadata.unwrap_or_default();
        let participants = join_all(metadata.participants.into_iter().map(|p| async move {
            let number = bare_number(&p.id).to_string();
            let name = match self.session.get_contact_by_id(&p.id).await {
                Ok(contact) => contact.display_name().to_string(),
                Err(e) => {
                    debug!(participant = %p.id, error = %e, "participant lookup failed");
                    number.clone()
                }
            };
            GroupParticipant {
                id: p.id,
                number,
                is_admin: p.is_admin || p.is_super_admin,
                name,
            }
        }))
        .await;

        Group {
            id: chat.id,
            name: chat.name,
            description: metadata.description.unwrap_or_default(),
            participants,
            created_at: metadata.creation.map(iso_from_unix),
        }
    }

    async fn group_chats(&self) -> Result<Vec<WaChat>, WaError> {
        Ok(self
            .session
            .get_chats()
            .await?
            .into_iter()
            .filter(|c| c.is_group)
            .collect())
    }

    async fn send_text(&self, chat_id: &str, message: &str) -> Result<SendMessageResult, WaError> {
        let message_id = self
            .session
            .send_message(
                chat_id,
                OutgoingMessage::Text {
                    body: message.to_string(),
                },
            )
            .await?;
        Ok(SendMessageResult { message_id })
    }
}

fn to_message(message: WaMessage, chat_label: &str) -> Message {
    let contact = (!message.from_me).then(|| match &message.author {
        Some(author) => bare_number(author).to_string(),
        None => chat_label.to_string(),
    });
    Message {
        id: message.id,
        body: message.body,
        from_me: message.from_me,
        timestamp: iso_from_unix(message.timestamp),
        contact,
        kind: message.kind,
    }
}

fn matches_contact_query(pushname: Option<&str>, number: &str, query: &str) -> bool {
    pushname.is_some_and(|name| name.to_lowercase().contains(&query.to_lowercase()))
        || number.contains(query)
}

#[async_trait]
impl WhatsAppService for EmbeddedService {
    async fn get_status(&self) -> Result<StatusResponse, WaError> {
        let info = self.session.info();
        let status = if self.session.state().is_ready() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        Ok(StatusResponse { status, info })
    }

    async fn get_contacts(&self) -> Result<Vec<Contact>, WaError> {
        async {
            self.ensure_ready()?;
            let contacts = self.session.get_contacts().await?;
            Ok::<_, WaError>(contacts
                .into_iter()
                .filter(|c| c.is_individual_peer())
                .map(|c| Contact {
                    name: c.pushname.unwrap_or_else(|| "Unknown".to_string()),
                    number: c.number,
                })
                .collect())
        }
        .await
        .context("Failed to fetch contacts")
    }

    async fn search_contacts(&self, query: &str) -> Result<Vec<Contact>, WaError> {
        async {
            self.ensure_ready()?;
            let contacts = self.session.get_contacts().await?;
            Ok::<_, WaError>(contacts
                .into_iter()
                .filter(|c| c.is_individual_peer())
                .filter(|c| matches_contact_query(c.pushname.as_deref(), &c.number, query))
                .map(|c| Contact {
                    name: c.pushname.unwrap_or_else(|| "Unknown".to_string()),
                    number: c.number,
                })
                .collect())
        }
        .await
        .context("Failed to search contacts")
    }

    async fn get_chats(&self) -> Result<Vec<Chat>, WaError> {
        async {
            self.ensure_ready()?;
            let chats = self.session.get_chats().await?;
            Ok::<_, WaError>(chats
                .into_iter()
                .map(|chat| Chat {
                    id: chat.id,
                    name: chat.name,
                    unread_count: chat.unread_count,
                    timestamp: chat
                        .last_message
                        .as_ref()
                        .map(|m| iso_from_unix(m.timestamp)),
                    last_message: chat.last_message.map(|m| m.body),
                })
                .collect())
        }
        .await
        .context("Failed to fetch chats")
    }

    async fn get_messages(&self, number: &str, limit: usize) -> Result<Vec<Message>, WaError> {
        async {
            self.ensure_ready()?;
            let chat_id = self.resolve_number(number).await?;
            let chat = self.session.get_chat_by_id(&chat_id).await?;
            let messages = self.session.fetch_messages(&chat_id, limit).await?;
            Ok::<_, WaError>(messages
                .into_iter()
                .map(|m| to_message(m, &chat.name))
                .collect())
        }
        .await
        .context("Failed to fetch messages")
    }

    async fn send_message(
        &self,
        number: &str,
        message: &str,
    ) -> Result<SendMessageResult, WaError> {
        async {
            self.ensure_ready()?;
            let chat_id = self.resolve_number(number).await?;
            self.send_text(&chat_id, message).await
        }
        .await
        .context("Failed to send message")
    }

    async fn get_groups(&self) -> Result<Vec<Group>, WaError> {
        async {
            self.ensure_ready()?;
            let chats = self.group_chats().await?;
            Ok::<_, WaError>(join_all(chats.into_iter().map(|c| self.to_group(c))).await)
        }
        .await
        .context("Failed to fetch groups")
    }

    async fn get_group_by_id(&self, group_id: &str) -> Result<Group, WaError> {
        async {
            self.ensure_ready()?;
            let chat = self.group_chat(group_id).await?;
            Ok::<_, WaError>(self.to_group(chat).await)
        }
        .await
        .context("Failed to fetch group")
    }

    async fn search_groups(&self, query: &str) -> Result<Vec<Group>, WaError> {
        async {
            self.ensure_ready()?;
            let query = query.to_lowercase();
            let matching = self.group_chats().await?.into_iter().filter(|chat| {
                let description = chat
                    .group_metadata
                    .as_ref()
                    .and_then(|m| m.description.as_deref())
                    .unwrap_or_default();
                chat.name.to_lowercase().contains(&query)
                    || description.to_lowercase().contains(&query)
            });
            Ok::<_, WaError>(join_all(matching.map(|c| self.to_group(c))).await)
        }
        .await
        .context("Failed to search groups")
    }

    async fn create_group(
        &self,
        name: &str,
        participants: &[String],
    ) -> Result<CreateGroupResult, WaError> {
        async {
            self.ensure_ready()?;
            if name.trim().is_empty() {
                return Err(WaError::InvalidInput("Group name is required".into()));
            }
            let ids: Vec<String> = participants
                .iter()
                .map(|p| normalize_contact_id(p))
                .collect();
            let created = self.session.create_group(name.trim(), &ids).await?;
            Ok::<_, WaError>(CreateGroupResult {
                group_id: created.id,
                invite_code: created.invite_code,
            })
        }
        .await
        .context("Failed to create group")
    }

    async fn add_participants_to_group(
        &self,
        group_id: &str,
        participants: &[String],
    ) -> Result<AddParticipantsResult, WaError> {
        async {
            self.ensure_ready()?;
            if participants.is_empty() {
                return Err(WaError::InvalidInput(
                    "At least one participant is required".into(),
                ));
            }
            let chat = self.group_chat(group_id).await?;
            let ids: Vec<String> = participants
                .iter()
                .map(|p| normalize_contact_id(p))
                .collect();
            let outcomes = self.session.add_participants(&chat.id, &ids).await?;

            let (added, failed): (Vec<_>, Vec<_>) =
                outcomes.into_iter().partition(|o| o.is_added());
            let added = added
                .iter()
                .map(|o| bare_number(&o.id).to_string())
                .collect();
            let failed: Vec<FailedParticipant> = failed
                .into_iter()
                .map(|o| FailedParticipant {
                    number: bare_number(&o.id).to_string(),
                    reason: o
                        .message
                        .unwrap_or_else(|| format!("Failed with code {}", o.code)),
                })
                .collect();
            Ok::<_, WaError>(AddParticipantsResult {
                success: failed.is_empty(),
                added,
                failed: (!failed.is_empty()).then_some(failed),
            })
        }
        .await
        .context("Failed to add participants to group")
    }

    async fn get_group_messages(
        &self,
        group_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, WaError> {
        async {
            self.ensure_ready()?;
            let chat = self.group_chat(group_id).await?;
            let messages = self.session.fetch_messages(&chat.id, limit).await?;
            Ok::<_, WaError>(messages
                .into_iter()
                .map(|m| to_message(m, &chat.name))
                .collect())
        }
        .await
        .context("Failed to fetch group messages")
    }

    async fn send_group_message(
        &self,
        group_id: &str,
        message: &str,
    ) -> Result<SendMessageResult, WaError> {
        async {
            self.ensure_ready()?;
            let chat = self.group_chat(group_id).await?;
            self.send_text(&chat.id, message).await
        }
        .await
        .context("Failed to send group message")
    }

    async fn download_media_from_message(
        &self,
        message_id: &str,
        storage_dir: &Path,
    ) -> Result<MediaDescriptor, WaError> {
        async {
            self.ensure_ready()?;
            if message_id.trim().is_empty() {
                return Err(WaError::InvalidInput("Message ID is required".into()));
            }
            let message = self
                .session
                .get_message_by_id(message_id)
                .await?
                .ok_or_else(|| WaError::NotFound("Message not found".into()))?;
            let no_media = || WaError::NotFound("Message does not contain media".into());
            if !message.has_media {
                return Err(no_media());
            }
            let media = self
                .session
                .download_media(&message.id)
                .await?
                .ok_or_else(no_media)?;
            media::store(storage_dir, &message.id, &media).await
        }
        .await
        .context("Failed to download media")
    }

    async fn send_media_message(
        &self,
        number: &str,
        source: &str,
        caption: Option<&str>,
    ) -> Result<SendMediaResult, WaError> {
        async {
            self.ensure_ready()?;
            let source = MediaSource::parse(source)?;
            let chat_id = self.resolve_number(number).await?;
            let loaded = media::load(&source, &self.http).await?.ensure_image()?;
            let media_info = MediaInfo {
                mime_type: loaded.mime_type.clone(),
                filename: loaded.filename.clone(),
                size: loaded.bytes.len() as u64,
            };
            let message_id = self
                .session
                .send_message(
                    &chat_id,
                    OutgoingMessage::Media {
                        mimetype: loaded.mime_type.clone(),
                        data: loaded.base64(),
                        filename: loaded.filename,
                        caption: caption.map(str::to_string),
                    },
                )
                .await?;
            Ok::<_, WaError>(SendMediaResult {
                message_id,
                media_info,
            })
        }
        .await
        .context("Failed to send media message")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn empty_query_matches_everything(name in "[A-Za-z]{0,8}", number in "[0-9]{1,8}") {
            prop_assert!(matches_contact_query(Some(&name), &number, ""));
        }
    }

    #[test]
    fn name_match_is_case_insensitive_number_match_is_not_needed() {
        assert!(matches_contact_query(Some("Alice"), "111", "ALI"));
        assert!(matches_contact_query(None, "5511", "551"));
        assert!(!matches_contact_query(None, "5511", "ali"));
    }

    #[test]
    fn own_messages_have_no_contact_label() {
        let mut msg = wamcp_test_utils::fixtures::message("111@c.us", "A", "hi", 0);
        assert_eq!(to_message(msg.clone(), "Alice").contact.as_deref(), Some("Alice"));
        msg.from_me = true;
        assert!(to_message(msg, "Alice").contact.is_none());
    }
}

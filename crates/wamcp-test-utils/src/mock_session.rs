// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock session for deterministic testing.
//!
//! `MockSession` implements `WhatsAppSession` over fixture data. Every
//! backend method bumps a call counter so tests can assert that nothing
//! reached the backend, and outbound sends are captured for inspection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use wamcp_core::session::{
    GroupCreated, OutgoingMessage, ParticipantOutcome, WaChat, WaContact, WaMedia, WaMessage,
};
use wamcp_core::{ClientInfo, SessionState, WaError, WhatsAppSession};

use crate::fixtures::SELF_ID;

/// An outbound message captured by [`MockSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: String,
    pub message: OutgoingMessage,
    pub message_id: String,
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    contacts: Vec<WaContact>,
    chats: Vec<WaChat>,
    messages: HashMap<String, Vec<WaMessage>>,
    registered: HashSet<String>,
    media: HashMap<String, WaMedia>,
    add_outcomes: Option<Vec<ParticipantOutcome>>,
    failures: HashMap<&'static str, String>,
    sent: Vec<SentMessage>,
    created_groups: Vec<(String, Vec<String>)>,
    destroyed: bool,
}

/// A mock messaging session for testing.
pub struct MockSession {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

impl MockSession {
    /// A session in the given state with no data.
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                ..Inner::default()
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// A ready session with no data.
    pub fn ready() -> Self {
        Self::new(SessionState::Ready)
    }

    pub fn with_contact(self, contact: WaContact) -> Self {
        self.lock().contacts.push(contact);
        self
    }

    pub fn with_chat(self, chat: WaChat) -> Self {
        self.lock().chats.push(chat);
        self
    }

    /// Messages of `chat_id`, oldest first.
    pub fn with_messages(self, chat_id: &str, messages: Vec<WaMessage>) -> Self {
        self.lock()
            .messages
            .entry(chat_id.to_string())
            .or_default()
            .extend(messages);
        self
    }

    /// Mark a bare number as registered even without a contact entry.
    pub fn with_registered(self, number: &str) -> Self {
        self.lock().registered.insert(number.to_string());
        self
    }

    pub fn with_media(self, message_id: &str, media: WaMedia) -> Self {
        self.lock().media.insert(message_id.to_string(), media);
        self
    }

    /// Enable `add_participants` with fixed per-participant outcomes.
    pub fn with_add_outcomes(self, outcomes: Vec<ParticipantOutcome>) -> Self {
        self.lock().add_outcomes = Some(outcomes);
        self
    }

    /// Make `method` fail with an untyped backend message.
    pub fn with_failure(self, method: &'static str, message: &str) -> Self {
        self.lock().failures.insert(method, message.to_string());
        self
    }

    pub fn set_state(&self, state: SessionState) {
        self.lock().state = state;
    }

    /// Number of backend method invocations so far.
    pub fn backend_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    pub fn created_groups(&self) -> Vec<(String, Vec<String>)> {
        self.lock().created_groups.clone()
    }

    pub fn destroyed(&self) -> bool {
        self.lock().destroyed
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and return the configured failure, if any.
    fn enter(&self, method: &'static str) -> Result<MutexGuard<'_, Inner>, WaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.lock();
        match inner.failures.get(method) {
            Some(message) => Err(WaError::from_backend_message(message.clone())),
            None => Ok(inner),
        }
    }
}

#[async_trait]
impl WhatsAppSession for MockSession {
    fn state(&self) -> SessionState {
        self.lock().state
    }

    fn info(&self) -> Option<ClientInfo> {
        self.state().is_ready().then(|| ClientInfo {
            wid: SELF_ID.to_string(),
            pushname: Some("Me".to_string()),
            platform: Some("mock".to_string()),
        })
    }

    async fn get_contacts(&self) -> Result<Vec<WaContact>, WaError> {
        Ok(self.enter("get_contacts")?.contacts.clone())
    }

    async fn get_contact_by_id(&self, contact_id: &str) -> Result<WaContact, WaError> {
        self.enter("get_contact_by_id")?
            .contacts
            .iter()
            .find(|c| c.id == contact_id)
            .cloned()
            .ok_or_else(|| WaError::NotFound(format!("Contact {contact_id} not found")))
    }

    async fn get_chats(&self) -> Result<Vec<WaChat>, WaError> {
        Ok(self.enter("get_chats")?.chats.clone())
    }

    async fn get_chat_by_id(&self, chat_id: &str) -> Result<WaChat, WaError> {
        self.enter("get_chat_by_id")?
            .chats
            .iter()
            .find(|c| c.id == chat_id)
            .cloned()
            .ok_or_else(|| WaError::NotFound(format!("Chat {chat_id} not found")))
    }

    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<WaMessage>, WaError> {
        let inner = self.enter("fetch_messages")?;
        let all = inner.messages.get(chat_id).map(Vec::as_slice).unwrap_or(&[]);
        Ok(all[all.len().saturating_sub(limit)..].to_vec())
    }

    async fn get_number_id(&self, number: &str) -> Result<Option<String>, WaError> {
        let inner = self.enter("get_number_id")?;
        let known = inner.registered.contains(number)
            || inner.contacts.iter().any(|c| c.is_user && c.number == number);
        Ok(known.then(|| format!("{number}@c.us")))
    }

    async fn send_message(
        &self,
        chat_id: &str,
        message: OutgoingMessage,
    ) -> Result<String, WaError> {
        let mut inner = self.enter("send_message")?;
        let message_id = format!(
            "true_{chat_id}_{}",
            uuid::Uuid::new_v4().simple().to_string().to_uppercase()
        );
        inner.sent.push(SentMessage {
            chat_id: chat_id.to_string(),
            message,
            message_id: message_id.clone(),
        });
        Ok(message_id)
    }

    async fn create_group(
        &self,
        name: &str,
        participant_ids: &[String],
    ) -> Result<GroupCreated, WaError> {
        let mut inner = self.enter("create_group")?;
        inner
            .created_groups
            .push((name.to_string(), participant_ids.to_vec()));
        Ok(GroupCreated {
            id: "120399@g.us".to_string(),
            invite_code: Some("MOCKINVITE".to_string()),
        })
    }

    async fn add_participants(
        &self,
        _group_id: &str,
        _participant_ids: &[String],
    ) -> Result<Vec<ParticipantOutcome>, WaError> {
        self.enter("add_participants")?
            .add_outcomes
            .clone()
            .ok_or_else(|| WaError::NotSupported("addParticipants is not supported".into()))
    }

    async fn get_message_by_id(&self, message_id: &str) -> Result<Option<WaMessage>, WaError> {
        Ok(self
            .enter("get_message_by_id")?
            .messages
            .values()
            .flatten()
            .find(|m| m.id == message_id)
            .cloned())
    }

    async fn download_media(&self, message_id: &str) -> Result<Option<WaMedia>, WaError> {
        Ok(self.enter("download_media")?.media.get(message_id).cloned())
    }

    async fn destroy(&self) -> Result<(), WaError> {
        let mut inner = self.enter("destroy")?;
        inner.destroyed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn counts_every_backend_call() {
        let session = fixtures::sample_session();
        assert_eq!(session.backend_calls(), 0);
        session.get_contacts().await.unwrap();
        session.get_chats().await.unwrap();
        assert_eq!(session.backend_calls(), 2);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn unknown_numbers_are_unregistered() {
        let session = fixtures::sample_session().with_registered("333");
        assert_eq!(
            session.get_number_id("111").await.unwrap().as_deref(),
            Some("111@c.us")
        );
        assert!(session.get_number_id("333").await.unwrap().is_some());
        assert!(session.get_number_id("555").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_returns_most_recent_page() {
        let msgs = (0..5)
            .map(|i| fixtures::message("111@c.us", &format!("M{i}"), "x", 1_700_000_000 + i))
            .collect();
        let session = MockSession::ready().with_messages("111@c.us", msgs);
        let page = session.fetch_messages("111@c.us", 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[1].id.ends_with("M4"));
    }

    #[tokio::test]
    async fn configured_failure_is_classified() {
        let session = MockSession::ready().with_failure("get_chats", "session not ready");
        let err = session.get_chats().await.unwrap_err();
        assert_eq!(err.kind(), wamcp_core::ErrorKind::NotReady);
    }
}

// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service backend that forwards every call to another deployment's REST API.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use wamcp_core::error::{ErrorKind, ResultExt};
use wamcp_core::types::{
    AddParticipantsResult, Chat, Contact, CreateGroupResult, Group, MediaDescriptor, Message,
    SendMediaResult, SendMessageResult, StatusResponse,
};
use wamcp_core::{WaError, WhatsAppService};

/// Error body produced by the REST router.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// HTTP client for a remote REST deployment, authenticated with a bearer key.
///
/// The remote server does the validation; this side only re-hydrates its
/// responses and error bodies.
pub struct RemoteService {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RemoteService {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, WaError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| WaError::InvalidInput(format!("Invalid API base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(WaError::InvalidInput(format!(
                "Invalid API base URL {base_url}"
            )));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send one request. Transport and decode failures are wrapped with
    /// `operation`; error responses already carry the server's wording.
    async fn request<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T, WaError> {
        let url = self.url(segments);
        debug!(%method, %url, "remote request");
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .query(query);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WaError::internal_with(format!("Remote API unreachable: {e}"), e))
            .context(operation)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &text));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| WaError::internal_with(format!("Invalid response from remote API: {e}"), e))
            .context(operation)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, WaError> {
        self.request(operation, Method::GET, segments, query, None).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        segments: &[&str],
        body: Value,
    ) -> Result<T, WaError> {
        self.request(operation, Method::POST, segments, &[], Some(body)).await
    }
}

/// Rebuild a typed error from a non-2xx response.
///
/// The status code carries the kind. When `details` has the form
/// `"<error>: <cause>"` the operation wrapper is restored so the message
/// reads exactly as it did on the server.
fn error_from_response(status: StatusCode, body: &str) -> WaError {
    let kind = ErrorKind::from_status(status.as_u16());
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let fallback = || {
        if body.trim().is_empty() {
            format!("Remote API returned {status}")
        } else {
            body.trim().to_string()
        }
    };

    match (parsed.error, parsed.details) {
        (Some(error), Some(details)) => match details.strip_prefix(&format!("{error}: ")) {
            Some(cause) => WaError::from_kind(kind, cause).context(&error),
            None => WaError::from_kind(kind, details),
        },
        (Some(error), None) => WaError::from_kind(kind, error),
        (None, Some(details)) => WaError::from_kind(kind, details),
        (None, None) => WaError::from_kind(kind, fallback()),
    }
}

fn limit_query(limit: usize) -> [(&'static str, String); 1] {
    [("limit", limit.to_string())]
}

#[async_trait]
impl WhatsAppService for RemoteService {
    async fn get_status(&self) -> Result<StatusResponse, WaError> {
        self.get("Failed to get client status", &["status"], &[]).await
    }

    async fn get_contacts(&self) -> Result<Vec<Contact>, WaError> {
        self.get("Failed to fetch contacts", &["contacts"], &[]).await
    }

    async fn search_contacts(&self, query: &str) -> Result<Vec<Contact>, WaError> {
        self.get(
            "Failed to search contacts",
            &["contacts", "search"],
            &[("query", query.to_string())],
        )
        .await
    }

    async fn get_chats(&self) -> Result<Vec<Chat>, WaError> {
        self.get("Failed to fetch chats", &["chats"], &[]).await
    }

    async fn get_messages(&self, number: &str, limit: usize) -> Result<Vec<Message>, WaError> {
        self.get("Failed to fetch messages", &["messages", number], &limit_query(limit)).await
    }

    async fn send_message(
        &self,
        number: &str,
        message: &str,
    ) -> Result<SendMessageResult, WaError> {
        self.post(
            "Failed to send message",
            &["send"],
            json!({ "number": number, "message": message }),
        )
        .await
    }

    async fn get_groups(&self) -> Result<Vec<Group>, WaError> {
        self.get("Failed to fetch groups", &["groups"], &[]).await
    }

    async fn get_group_by_id(&self, group_id: &str) -> Result<Group, WaError> {
        self.get("Failed to fetch group", &["groups", group_id], &[]).await
    }

    async fn search_groups(&self, query: &str) -> Result<Vec<Group>, WaError> {
        self.get(
            "Failed to search groups",
            &["groups", "search"],
            &[("query", query.to_string())],
        )
        .await
    }

    async fn create_group(
        &self,
        name: &str,
        participants: &[String],
    ) -> Result<CreateGroupResult, WaError> {
        self.post(
            "Failed to create group",
            &["groups"],
            json!({ "name": name, "participants": participants }),
        )
        .await
    }

    async fn add_participants_to_group(
        &self,
        group_id: &str,
        participants: &[String],
    ) -> Result<AddParticipantsResult, WaError> {
        self.post(
            "Failed to add participants to group",
            &["groups", group_id, "participants", "add"],
            json!({ "participants": participants }),
        )
        .await
    }

    async fn get_group_messages(
        &self,
        group_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, WaError> {
        self.get(
            "Failed to fetch group messages",
            &["groups", group_id, "messages"],
            &limit_query(limit),
        )
        .await
    }

    async fn send_group_message(
        &self,
        group_id: &str,
        message: &str,
    ) -> Result<SendMessageResult, WaError> {
        self.post(
            "Failed to send group message",
            &["groups", group_id, "send"],
            json!({ "message": message }),
        )
        .await
    }

    /// The remote server stores the file in its own media directory, so
    /// `storage_dir` is not forwarded.
    async fn download_media_from_message(
        &self,
        message_id: &str,
        _storage_dir: &Path,
    ) -> Result<MediaDescriptor, WaError> {
        self.post(
            "Failed to download media",
            &["messages", message_id, "media", "download"],
            json!({}),
        )
        .await
    }

    async fn send_media_message(
        &self,
        number: &str,
        source: &str,
        caption: Option<&str>,
    ) -> Result<SendMediaResult, WaError> {
        let mut body = json!({ "number": number, "source": source });
        if let Some(caption) = caption {
            body["caption"] = json!(caption);
        }
        self.post("Failed to send media message", &["send", "media"], body).await
    }
}

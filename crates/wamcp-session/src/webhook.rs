// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort forwarding of inbound messages to an HTTP webhook.
//!
//! The descriptor lives at `<auth_data_path>/webhook.json` and is re-read
//! for every message. Deliveries run on spawned tasks bounded by a
//! semaphore; when all permits are taken the event is dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use wamcp_config::model::WebhookConfig;
use wamcp_core::ids::bare_number;
use wamcp_core::time::iso_from_unix;
use wamcp_core::WaError;

use crate::protocol::IncomingMessage;

/// File name of the descriptor inside the auth data directory.
pub const DESCRIPTOR_FILE: &str = "webhook.json";

/// Contents of `webhook.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDescriptor {
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub filters: WebhookFilters,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookFilters {
    /// When non-empty, only these sender numbers are forwarded.
    #[serde(default)]
    pub allowed_numbers: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_private: bool,
    #[serde(default = "default_true")]
    pub allow_groups: bool,
}

impl Default for WebhookFilters {
    fn default() -> Self {
        Self {
            allowed_numbers: Vec::new(),
            allow_private: true,
            allow_groups: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl WebhookFilters {
    pub fn accepts(&self, message: &IncomingMessage) -> bool {
        if message.is_group && !self.allow_groups {
            return false;
        }
        if !message.is_group && !self.allow_private {
            return false;
        }
        self.allowed_numbers.is_empty()
            || self
                .allowed_numbers
                .iter()
                .any(|n| n == bare_number(message.sender_id()))
    }
}

/// Body POSTed to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub from: String,
    pub name: String,
    pub message: String,
    pub is_group: bool,
    pub timestamp: String,
    pub message_id: String,
}

impl From<&IncomingMessage> for WebhookPayload {
    fn from(message: &IncomingMessage) -> Self {
        Self {
            from: bare_number(message.sender_id()).to_string(),
            name: message
                .notify_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            message: message.body.clone(),
            is_group: message.is_group,
            timestamp: iso_from_unix(message.timestamp),
            message_id: message.id.clone(),
        }
    }
}

/// Spawns bounded, fire-and-forget webhook deliveries.
pub struct WebhookDispatcher {
    descriptor_path: PathBuf,
    client: reqwest::Client,
    permits: Arc<Semaphore>,
}

impl WebhookDispatcher {
    pub fn new(auth_data_path: &Path, config: &WebhookConfig) -> Result<Self, WaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WaError::internal_with("failed to build webhook HTTP client", e))?;
        Ok(Self {
            descriptor_path: auth_data_path.join(DESCRIPTOR_FILE),
            client,
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
        })
    }

    /// Read the descriptor. `None` when absent or unreadable.
    pub async fn load_descriptor(path: &Path) -> Option<WebhookDescriptor> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read webhook descriptor");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid webhook descriptor");
                None
            }
        }
    }

    /// Forward `message` in the background. Returns `None` when the event
    /// was dropped because too many deliveries are outstanding.
    pub fn dispatch(&self, message: &IncomingMessage) -> Option<JoinHandle<()>> {
        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            warn!(message_id = %message.id, "webhook deliveries saturated, dropping event");
            return None;
        };
        let path = self.descriptor_path.clone();
        let client = self.client.clone();
        let message = message.clone();

        Some(tokio::spawn(async move {
            let _permit = permit;
            let Some(descriptor) = Self::load_descriptor(&path).await else {
                return;
            };
            if !descriptor.filters.accepts(&message) {
                debug!(message_id = %message.id, "webhook filters rejected message");
                return;
            }

            let mut request = client
                .post(&descriptor.url)
                .json(&WebhookPayload::from(&message));
            if let Some(token) = &descriptor.auth_token {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!(url = %descriptor.url, status = %resp.status(), "webhook delivered");
                }
                Ok(resp) => {
                    warn!(url = %descriptor.url, status = %resp.status(), "webhook rejected event");
                }
                Err(e) => warn!(url = %descriptor.url, error = %e, "webhook delivery failed"),
            }
        }))
    }
}

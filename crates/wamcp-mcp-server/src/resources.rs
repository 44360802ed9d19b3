// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `whatsapp://` resources.

use percent_encoding::percent_decode_str;
use rmcp::model::{AnnotateAble, RawResource, Resource, ResourceTemplate};
use serde::Serialize;
use serde_json::json;

use wamcp_core::{DEFAULT_MESSAGE_LIMIT, WaError, WhatsAppService};

pub const SCHEME: &str = "whatsapp://";

pub const CONTACTS_URI: &str = "whatsapp://contacts";
pub const CHATS_URI: &str = "whatsapp://chats";
pub const GROUPS_URI: &str = "whatsapp://groups";
pub const GROUP_SEARCH_URI: &str = "whatsapp://groups/search";
pub const MESSAGES_TEMPLATE: &str = "whatsapp://messages/{number}";
pub const GROUP_MESSAGES_TEMPLATE: &str = "whatsapp://groups/{groupId}/messages";

const JSON_MIME: &str = "application/json";

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRequest {
    Contacts,
    Chats,
    Groups,
    /// `whatsapp://groups/search?query=<text>`; no query lists every group.
    GroupSearch { query: String },
    Messages { number: String },
    GroupMessages { group_id: String },
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

impl ResourceRequest {
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(SCHEME)?;
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();

        match segments.as_slice() {
            ["contacts"] => Some(Self::Contacts),
            ["chats"] => Some(Self::Chats),
            ["groups"] => Some(Self::Groups),
            ["groups", "search"] => {
                let query = query
                    .split('&')
                    .filter_map(|pair| pair.split_once('='))
                    .find(|(k, _)| *k == "query")
                    .map(|(_, v)| decode(&v.replace('+', " ")))
                    .unwrap_or_default();
                Some(Self::GroupSearch { query })
            }
            ["messages", number] if !number.is_empty() => Some(Self::Messages {
                number: decode(number),
            }),
            ["groups", group_id, "messages"] if !group_id.is_empty() => Some(Self::GroupMessages {
                group_id: decode(group_id),
            }),
            _ => None,
        }
    }
}

fn pretty<T: Serialize>(value: &T) -> Result<String, WaError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| WaError::internal_with("Failed to encode resource", e))
}

/// Read a resource and render it as pretty JSON.
pub async fn read(service: &dyn WhatsAppService, request: &ResourceRequest) -> Result<String, WaError> {
    match request {
        ResourceRequest::Contacts => pretty(&service.get_contacts().await?),
        ResourceRequest::Chats => pretty(&service.get_chats().await?),
        ResourceRequest::Groups => pretty(&service.get_groups().await?),
        ResourceRequest::GroupSearch { query } => pretty(&service.search_groups(query).await?),
        ResourceRequest::Messages { number } => {
            pretty(&service.get_messages(number, DEFAULT_MESSAGE_LIMIT).await?)
        }
        ResourceRequest::GroupMessages { group_id } => pretty(
            &service
                .get_group_messages(group_id, DEFAULT_MESSAGE_LIMIT)
                .await?,
        ),
    }
}

fn resource(uri: &str, name: &str, description: &str) -> Resource {
    let mut raw = RawResource::new(uri, name);
    raw.description = Some(description.to_string());
    raw.mime_type = Some(JSON_MIME.to_string());
    raw.no_annotation()
}

/// Fixed-URI resources.
pub fn static_resources() -> Vec<Resource> {
    vec![
        resource(CONTACTS_URI, "contacts", "Individual WhatsApp contacts"),
        resource(CHATS_URI, "chats", "All chats with unread counts and last message"),
        resource(GROUPS_URI, "groups", "Group chats with participants"),
        resource(
            GROUP_SEARCH_URI,
            "group_search",
            "Groups whose name or description contains ?query=",
        ),
    ]
}

/// Parameterized resources.
pub fn templates() -> Result<Vec<ResourceTemplate>, serde_json::Error> {
    [
        (MESSAGES_TEMPLATE, "messages", "Latest messages with a phone number"),
        (
            GROUP_MESSAGES_TEMPLATE,
            "group_messages",
            "Latest messages in a group chat",
        ),
    ]
    .into_iter()
    .map(|(uri_template, name, description)| {
        serde_json::from_value(json!({
            "uriTemplate": uri_template,
            "name": name,
            "description": description,
            "mimeType": JSON_MIME,
        }))
    })
    .collect()
}

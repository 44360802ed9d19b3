// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool input schemas.

use schemars::JsonSchema;
use serde::Deserialize;

use wamcp_core::DEFAULT_MESSAGE_LIMIT;

fn default_limit() -> usize {
    DEFAULT_MESSAGE_LIMIT
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Case-insensitive text to look for
    pub query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MessagesParams {
    /// Phone number of the chat, with or without country formatting
    pub number: String,
    /// Maximum number of messages to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SendMessageParams {
    /// The phone number to send the message to
    pub number: String,
    /// The message content to send
    pub message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateGroupParams {
    /// Name of the new group
    pub name: String,
    /// Phone numbers of the initial participants
    pub participants: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantsParams {
    /// Group id, e.g. 120363012345678901@g.us
    pub group_id: String,
    /// Phone numbers to add
    pub participants: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessagesParams {
    /// Group id
    pub group_id: String,
    /// Maximum number of messages to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendGroupMessageParams {
    /// Group id
    pub group_id: String,
    /// The message content to send
    pub message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupIdParams {
    /// Group id
    pub group_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadMediaParams {
    /// Fully serialized message id
    pub message_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SendMediaParams {
    /// The phone number to send the media to
    pub number: String,
    /// http://, https:// or file:// URI of an image
    pub source: String,
    /// Optional caption shown under the image
    #[serde(default)]
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_when_omitted() {
        let p: MessagesParams = serde_json::from_str(r#"{"number":"111"}"#).unwrap();
        assert_eq!(p.limit, DEFAULT_MESSAGE_LIMIT);
    }

    #[test]
    fn group_params_use_camel_case() {
        let p: AddParticipantsParams =
            serde_json::from_str(r#"{"groupId":"1@g.us","participants":["111"]}"#).unwrap();
        assert_eq!(p.group_id, "1@g.us");
    }
}

// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the REST API.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use wamcp_core::DEFAULT_MESSAGE_LIMIT;
use wamcp_core::types::{
    AddParticipantsResult, Chat, Contact, CreateGroupResult, Group, MediaDescriptor, Message,
    SendMediaResult, SendMessageResult, StatusResponse,
};

use crate::error::ApiError;
use crate::server::ApiState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    /// Requested page size; unparseable values fall back to the default.
    fn value(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(DEFAULT_MESSAGE_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub number: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupMessageRequest {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantsRequest {
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SendMediaRequest {
    pub number: Option<String>,
    pub source: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(b)| b).map_err(|rejection| {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })
}

/// Non-empty value or `None`.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// GET /health (unauthenticated)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /status
pub async fn get_status(State(state): State<ApiState>) -> ApiResult<StatusResponse> {
    state.respond(state.service.get_status().await)
}

/// GET /contacts
pub async fn get_contacts(State(state): State<ApiState>) -> ApiResult<Vec<Contact>> {
    state.respond(state.service.get_contacts().await)
}

/// GET /contacts/search?query=
pub async fn search_contacts(
    State(state): State<ApiState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Vec<Contact>> {
    let query = present(params.query)
        .ok_or_else(|| ApiError::bad_request("Search query is required"))?;
    state.respond(state.service.search_contacts(&query).await)
}

/// GET /chats
pub async fn get_chats(State(state): State<ApiState>) -> ApiResult<Vec<Chat>> {
    state.respond(state.service.get_chats().await)
}

/// GET /messages/{number}?limit=
pub async fn get_messages(
    State(state): State<ApiState>,
    Path(number): Path<String>,
    Query(params): Query<LimitQuery>,
) -> ApiResult<Vec<Message>> {
    state.respond(state.service.get_messages(&number, params.value()).await)
}

/// POST /send
pub async fn send_message(
    State(state): State<ApiState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> ApiResult<SendMessageResult> {
    let req = body(payload)?;
    let (Some(number), Some(message)) = (present(req.number), present(req.message)) else {
        return Err(ApiError::bad_request("Number and message are required"));
    };
    state.respond(state.service.send_message(&number, &message).await)
}

/// GET /groups
pub async fn get_groups(State(state): State<ApiState>) -> ApiResult<Vec<Group>> {
    state.respond(state.service.get_groups().await)
}

/// GET /groups/search?query=
pub async fn search_groups(
    State(state): State<ApiState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Vec<Group>> {
    let query = present(params.query)
        .ok_or_else(|| ApiError::bad_request("Search query is required"))?;
    state.respond(state.service.search_groups(&query).await)
}

/// GET /groups/{group_id}
pub async fn get_group_by_id(
    State(state): State<ApiState>,
    Path(group_id): Path<String>,
) -> ApiResult<Group> {
    state.respond(state.service.get_group_by_id(&group_id).await)
}

/// POST /groups
pub async fn create_group(
    State(state): State<ApiState>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> ApiResult<CreateGroupResult> {
    let req = body(payload)?;
    let (Some(name), Some(participants)) = (present(req.name), req.participants) else {
        return Err(ApiError::bad_request("Group name and participants are required"));
    };
    state.respond(state.service.create_group(&name, &participants).await)
}

/// GET /groups/{group_id}/messages?limit=
pub async fn get_group_messages(
    State(state): State<ApiState>,
    Path(group_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> ApiResult<Vec<Message>> {
    state.respond(
        state
            .service
            .get_group_messages(&group_id, params.value())
            .await,
    )
}

/// POST /groups/{group_id}/participants/add
pub async fn add_participants(
    State(state): State<ApiState>,
    Path(group_id): Path<String>,
    payload: Result<Json<ParticipantsRequest>, JsonRejection>,
) -> ApiResult<AddParticipantsResult> {
    let req = body(payload)?;
    let Some(participants) = req.participants.filter(|p| !p.is_empty()) else {
        return Err(ApiError::bad_request("Participants are required"));
    };
    state.respond(
        state
            .service
            .add_participants_to_group(&group_id, &participants)
            .await,
    )
}

/// POST /groups/{group_id}/send
pub async fn send_group_message(
    State(state): State<ApiState>,
    Path(group_id): Path<String>,
    payload: Result<Json<GroupMessageRequest>, JsonRejection>,
) -> ApiResult<SendMessageResult> {
    let req = body(payload)?;
    let Some(message) = present(req.message) else {
        return Err(ApiError::bad_request("Message is required"));
    };
    state.respond(state.service.send_group_message(&group_id, &message).await)
}

/// POST /messages/{message_id}/media/download
///
/// Any request body is ignored; files always land in the server's media
/// directory.
pub async fn download_media(
    State(state): State<ApiState>,
    Path(message_id): Path<String>,
) -> ApiResult<MediaDescriptor> {
    state.respond(
        state
            .service
            .download_media_from_message(&message_id, &state.media_dir)
            .await,
    )
}

/// POST /send/media
pub async fn send_media(
    State(state): State<ApiState>,
    payload: Result<Json<SendMediaRequest>, JsonRejection>,
) -> ApiResult<SendMediaResult> {
    let req = body(payload)?;
    let (Some(number), Some(source)) = (present(req.number), present(req.source)) else {
        return Err(ApiError::bad_request("Number and source are required"));
    };
    state.respond(
        state
            .service
            .send_media_message(&number, &source, req.caption.as_deref())
            .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_falls_back_on_garbage() {
        let q = |l: Option<&str>| LimitQuery {
            limit: l.map(str::to_string),
        };
        assert_eq!(q(None).value(), DEFAULT_MESSAGE_LIMIT);
        assert_eq!(q(Some("abc")).value(), DEFAULT_MESSAGE_LIMIT);
        assert_eq!(q(Some("-3")).value(), DEFAULT_MESSAGE_LIMIT);
        assert_eq!(q(Some("25")).value(), 25);
    }

    #[test]
    fn empty_strings_are_absent() {
        assert_eq!(present(Some(String::new())), None);
        assert_eq!(present(Some("x".into())), Some("x".to_string()));
    }
}

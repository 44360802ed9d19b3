// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP `ServerHandler` exposing the WhatsApp service.
//!
//! Tools render failures as `Error: <message>` text with `isError` set,
//! since tool callers have no status codes. Resource reads and prompts
//! answer with protocol errors instead.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, GetPromptRequestParam, GetPromptResult, Implementation,
    ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, PaginatedRequestParam,
    PromptMessage, PromptMessageRole, ReadResourceRequestParam, ReadResourceResult,
    ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;
use serde_json::Map;

use wamcp_core::{ErrorKind, WaError, WhatsAppService};

use crate::params::{
    AddParticipantsParams, CreateGroupParams, DownloadMediaParams, GroupIdParams,
    GroupMessagesParams, MessagesParams, SearchParams, SendGroupMessageParams, SendMediaParams,
    SendMessageParams,
};
use crate::prompts;
use crate::resources::{self, ResourceRequest};

/// Advertised server name.
pub const SERVER_NAME: &str = "whatsapp-web-mcp";

const INSTRUCTIONS: &str = "WhatsApp Web exposed through the Model Context Protocol. \
Use the tools to read contacts, chats, groups and messages, and to send text or images. \
Phone numbers may be given with or without formatting; group ids end in @g.us.";

/// The MCP server. Cheap to clone; every session shares one service.
#[derive(Clone)]
pub struct WhatsAppMcpServer {
    service: Arc<dyn WhatsAppService>,
    media_dir: PathBuf,
    tool_router: ToolRouter<Self>,
}

fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

fn error_result(err: &WaError) -> CallToolResult {
    tracing::debug!(error = %err, kind = %err.kind(), "tool call failed");
    CallToolResult::error(vec![Content::text(format!("Error: {err}"))])
}

fn json_result<T: Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(text) => text_result(text),
        Err(e) => error_result(&WaError::internal_with("Failed to encode result", e)),
    }
}

fn render<T>(result: Result<T, WaError>, ok: impl FnOnce(T) -> CallToolResult) -> CallToolResult {
    match result {
        Ok(value) => ok(value),
        Err(e) => error_result(&e),
    }
}

/// Protocol error for a failed resource read or prompt.
pub fn protocol_error(err: WaError) -> McpError {
    let message = err.to_string();
    match err.kind() {
        ErrorKind::NotFound => McpError::resource_not_found(message, None),
        ErrorKind::InvalidInput => McpError::invalid_params(message, None),
        _ => McpError::internal_error(message, None),
    }
}

#[tool_router]
impl WhatsAppMcpServer {
    pub fn new(service: Arc<dyn WhatsAppService>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            media_dir: media_dir.into(),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get the connection status of the WhatsApp client")]
    async fn get_status(&self) -> Result<CallToolResult, McpError> {
        Ok(render(self.service.get_status().await, |s| {
            text_result(format!("WhatsApp client status: {}", s.status))
        }))
    }

    #[tool(description = "Search contacts by name or phone number")]
    async fn search_contacts(
        &self,
        Parameters(p): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(self.service.search_contacts(&p.query).await, |c| {
            json_result(&c)
        }))
    }

    #[tool(description = "Get the latest messages exchanged with a phone number")]
    async fn get_messages(
        &self,
        Parameters(p): Parameters<MessagesParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.service.get_messages(&p.number, p.limit).await,
            |m| json_result(&m),
        ))
    }

    #[tool(description = "List all chats with unread counts and last message")]
    async fn get_chats(&self) -> Result<CallToolResult, McpError> {
        Ok(render(self.service.get_chats().await, |c| json_result(&c)))
    }

    #[tool(description = "Send a text message to a phone number")]
    async fn send_message(
        &self,
        Parameters(p): Parameters<SendMessageParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.service.send_message(&p.number, &p.message).await,
            |r| {
                text_result(format!(
                    "Message sent successfully to {}. Message ID: {}",
                    p.number, r.message_id
                ))
            },
        ))
    }

    #[tool(description = "Create a group with the given participants")]
    async fn create_group(
        &self,
        Parameters(p): Parameters<CreateGroupParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.service.create_group(&p.name, &p.participants).await,
            |r| {
                let mut text = format!("Group created successfully. Group ID: {}", r.group_id);
                if let Some(code) = r.invite_code {
                    text.push_str(&format!("\nInvite code: {code}"));
                }
                text_result(text)
            },
        ))
    }

    #[tool(description = "Add participants to an existing group")]
    async fn add_participants_to_group(
        &self,
        Parameters(p): Parameters<AddParticipantsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.service
                .add_participants_to_group(&p.group_id, &p.participants)
                .await,
            |r| json_result(&r),
        ))
    }

    #[tool(description = "Get the latest messages of a group")]
    async fn get_group_messages(
        &self,
        Parameters(p): Parameters<GroupMessagesParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.service.get_group_messages(&p.group_id, p.limit).await,
            |m| json_result(&m),
        ))
    }

    #[tool(description = "Send a text message to a group")]
    async fn send_group_message(
        &self,
        Parameters(p): Parameters<SendGroupMessageParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.service
                .send_group_message(&p.group_id, &p.message)
                .await,
            |r| {
                text_result(format!(
                    "Message sent successfully to group {}. Message ID: {}",
                    p.group_id, r.message_id
                ))
            },
        ))
    }

    #[tool(description = "Search groups by name or description")]
    async fn search_groups(
        &self,
        Parameters(p): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(self.service.search_groups(&p.query).await, |g| {
            json_result(&g)
        }))
    }

    #[tool(description = "Get a group with its participants")]
    async fn get_group_by_id(
        &self,
        Parameters(p): Parameters<GroupIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(self.service.get_group_by_id(&p.group_id).await, |g| {
            json_result(&g)
        }))
    }

    #[tool(description = "Download the attachment of a message to the media directory")]
    async fn download_media_from_message(
        &self,
        Parameters(p): Parameters<DownloadMediaParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.service
                .download_media_from_message(&p.message_id, &self.media_dir)
                .await,
            |d| json_result(&d),
        ))
    }

    #[tool(description = "Send an image from an http(s):// or file:// source")]
    async fn send_media_message(
        &self,
        Parameters(p): Parameters<SendMediaParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.service
                .send_media_message(&p.number, &p.source, p.caption.as_deref())
                .await,
            |r| {
                text_result(format!(
                    "Media sent successfully to {}. Message ID: {}",
                    p.number, r.message_id
                ))
            },
        ))
    }
}

#[tool_handler]
impl ServerHandler for WhatsAppMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(
            resources::static_resources(),
        ))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let templates = resources::templates()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(ListResourceTemplatesResult::with_all_items(templates))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let uri = request.uri;
        let parsed = ResourceRequest::parse(&uri).ok_or_else(|| {
            McpError::resource_not_found(format!("Unknown resource: {uri}"), None)
        })?;
        let text = resources::read(self.service.as_ref(), &parsed)
            .await
            .map_err(protocol_error)?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        let prompts = prompts::list().map_err(protocol_error)?;
        Ok(ListPromptsResult::with_all_items(prompts))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let args = request.arguments.unwrap_or_else(Map::new);
        let (description, text) = match request.name.as_str() {
            prompts::COMPOSE_MESSAGE => (
                "Draft a WhatsApp message",
                prompts::compose_message(&args).map_err(protocol_error)?,
            ),
            prompts::ANALYZE_CONVERSATION => (
                "Analyze a WhatsApp conversation",
                prompts::analyze_conversation(self.service.as_ref(), &args)
                    .await
                    .map_err(protocol_error)?,
            ),
            other => {
                return Err(McpError::invalid_params(
                    format!("Unknown prompt: {other}"),
                    None,
                ));
            }
        };
        Ok(GetPromptResult {
            description: Some(description.to_string()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
        })
    }
}

// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates.

use serde_json::{Map, Value, json};

use rmcp::model::{Prompt, PromptArgument};
use wamcp_core::types::Message;
use wamcp_core::{WaError, WhatsAppService};

pub const COMPOSE_MESSAGE: &str = "compose_message";
pub const ANALYZE_CONVERSATION: &str = "analyze_conversation";

/// Messages read for a conversation analysis.
pub const ANALYSIS_WINDOW: usize = 20;

fn argument(name: &str, description: &str, required: bool) -> Result<PromptArgument, WaError> {
    serde_json::from_value(json!({
        "name": name,
        "description": description,
        "required": required,
    }))
    .map_err(|e| WaError::internal_with("Failed to build prompt argument", e))
}

/// Prompt descriptors for `prompts/list`.
pub fn list() -> Result<Vec<Prompt>, WaError> {
    Ok(vec![
        Prompt::new(
            COMPOSE_MESSAGE,
            Some("Draft a WhatsApp message for a given situation"),
            Some(vec![
                argument("context", "What the message is about", true)?,
                argument("tone", "friendly, formal, casual... (default friendly)", false)?,
                argument("length", "short, medium or long (default medium)", false)?,
            ]),
        ),
        Prompt::new(
            ANALYZE_CONVERSATION,
            Some("Summarize the recent conversation with a contact"),
            Some(vec![argument(
                "number",
                "Phone number of the contact",
                true,
            )?]),
        ),
    ])
}

fn arg<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn required<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str, WaError> {
    arg(args, name).ok_or_else(|| WaError::InvalidInput(format!("Argument '{name}' is required")))
}

/// Text of the `compose_message` prompt.
pub fn compose_message(args: &Map<String, Value>) -> Result<String, WaError> {
    let context = required(args, "context")?;
    let tone = arg(args, "tone").unwrap_or("friendly");
    let length = arg(args, "length").unwrap_or("medium");
    Ok(format!(
        "Compose a {length}-length WhatsApp message with a {tone} tone.\n\n\
         Context: {context}\n\n\
         Write only the message text, ready to send. Keep it natural for a chat app."
    ))
}

/// Render a transcript, one `You|Contact: <body> [<timestamp>]` line per message.
pub fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let who = if m.from_me { "You" } else { "Contact" };
            format!("{who}: {} [{}]", m.body, m.timestamp)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the `analyze_conversation` prompt. Reads the recent history.
pub async fn analyze_conversation(
    service: &dyn WhatsAppService,
    args: &Map<String, Value>,
) -> Result<String, WaError> {
    let number = required(args, "number")?;
    let messages = service.get_messages(number, ANALYSIS_WINDOW).await?;
    let body = if messages.is_empty() {
        "(no messages)".to_string()
    } else {
        transcript(&messages)
    };
    Ok(format!(
        "Analyze this WhatsApp conversation with {number}.\n\n\
         {body}\n\n\
         Summarize the main topics, note any open questions or commitments, \
         and describe the overall tone."
    ))
}

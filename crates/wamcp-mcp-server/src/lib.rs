// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP bindings for the WhatsApp service.
//!
//! [`WhatsAppMcpServer`] exposes the service as tools, resources and
//! prompts. [`transport`] serves it over stdio, legacy SSE and the
//! streamable HTTP transport.

pub mod params;
pub mod prompts;
pub mod resources;
pub mod server;
pub mod transport;

pub use server::{SERVER_NAME, WhatsAppMcpServer};
pub use transport::{http_router, serve_http, serve_stdio};

// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the WhatsApp MCP bridge.
//!
//! This crate holds everything both transport surfaces and both service
//! backends agree on: the response DTOs, the records a live messaging
//! session hands back, the [`WhatsAppSession`] and [`WhatsAppService`]
//! traits, the typed error, and the id/timestamp normalization helpers.

pub mod error;
pub mod ids;
pub mod service;
pub mod session;
pub mod time;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, WaError};
pub use service::{DEFAULT_MESSAGE_LIMIT, WhatsAppService};
pub use session::{LifecycleSignal, SessionState, WhatsAppSession};
pub use types::ClientInfo;

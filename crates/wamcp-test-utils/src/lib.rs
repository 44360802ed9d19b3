// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the WhatsApp MCP bridge.
//!
//! - [`MockSession`] - in-memory `WhatsAppSession` with call counting and
//!   captured sends
//! - [`fixtures`] - record builders and a ready-made sample account

pub mod fixtures;
pub mod mock_session;

pub use mock_session::{MockSession, SentMessage};

// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST surface for the WhatsApp service.
//!
//! Every handler is a thin translation: extract and presence-check the
//! parameters, call the service, answer with JSON. Failures are mapped to
//! HTTP statuses by [`error::ApiError`] from the error kind.

pub mod api_key;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{ApiState, ServerConfig, router, start_server};

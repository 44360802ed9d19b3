// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service Adapter: one [`WhatsAppService`] contract, two backends.
//!
//! The backend is picked once at startup by [`build_service`]; callers only
//! ever hold an `Arc<dyn WhatsAppService>`.

pub mod embedded;
pub mod media;
pub mod remote;

use std::sync::Arc;

use wamcp_core::{WaError, WhatsAppService, WhatsAppSession};

pub use embedded::EmbeddedService;
pub use media::MediaSource;
pub use remote::RemoteService;

/// Where service calls are executed.
pub enum Backend {
    /// A live session owned by this process.
    Embedded(Arc<dyn WhatsAppSession>),
    /// Another deployment's REST API.
    Remote { base_url: String, api_key: String },
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Embedded(_) => f.write_str("Embedded"),
            Backend::Remote { base_url, .. } => f
                .debug_struct("Remote")
                .field("base_url", base_url)
                .field("api_key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Construct the service for `backend`.
pub fn build_service(backend: Backend) -> Result<Arc<dyn WhatsAppService>, WaError> {
    Ok(match backend {
        Backend::Embedded(session) => Arc::new(EmbeddedService::new(session)),
        Backend::Remote { base_url, api_key } => Arc::new(RemoteService::new(&base_url, api_key)?),
    })
}

// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST server built on axum.

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router, middleware as axum_middleware};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use wamcp_core::{WaError, WhatsAppService};

use crate::auth::{AuthConfig, auth_middleware};
use crate::error::ApiError;
use crate::handlers;

/// Shared state for the request handlers.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<dyn WhatsAppService>,
    /// Destination for downloaded attachments.
    pub media_dir: PathBuf,
    /// Omit `details` from 500 responses.
    pub hide_error_details: bool,
}

impl ApiState {
    pub(crate) fn respond<T>(&self, result: Result<T, WaError>) -> Result<Json<T>, ApiError> {
        result
            .map(Json)
            .map_err(|e| ApiError::from_service(e, self.hide_error_details))
    }
}

/// Bind address and auth for the REST server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mount point of the API routes, e.g. `/api`.
    pub base_path: String,
    /// Bearer token; `None` serves the API without authentication.
    pub api_key: Option<String>,
}

/// Build the application router.
///
/// `/health` is always public. The API routes are mounted under
/// `base_path` and wrapped by the bearer check when a key is configured.
pub fn router(state: ApiState, config: &ServerConfig) -> Router {
    let mut api = Router::new()
        .route("/status", get(handlers::get_status))
        .route("/contacts", get(handlers::get_contacts))
        .route("/contacts/search", get(handlers::search_contacts))
        .route("/chats", get(handlers::get_chats))
        .route("/messages/{number}", get(handlers::get_messages))
        .route(
            "/messages/{message_id}/media/download",
            post(handlers::download_media),
        )
        .route("/send", post(handlers::send_message))
        .route("/send/media", post(handlers::send_media))
        .route("/groups", get(handlers::get_groups).post(handlers::create_group))
        .route("/groups/search", get(handlers::search_groups))
        .route("/groups/{group_id}", get(handlers::get_group_by_id))
        .route(
            "/groups/{group_id}/messages",
            get(handlers::get_group_messages),
        )
        .route(
            "/groups/{group_id}/participants/add",
            post(handlers::add_participants),
        )
        .route("/groups/{group_id}/send", post(handlers::send_group_message))
        .with_state(state);

    if let Some(key) = &config.api_key {
        api = api.route_layer(axum_middleware::from_fn_with_state(
            AuthConfig::bearer(key),
            auth_middleware,
        ));
    }

    let base = config.base_path.trim_end_matches('/');
    let app = Router::new().route("/health", get(handlers::health));
    let app = if base.is_empty() {
        app.merge(api)
    } else {
        app.nest(base, api)
    };

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve `app` until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), WaError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| {
            WaError::internal_with(format!("failed to bind REST server to {addr}: {e}"), e)
        })?;

    tracing::info!("REST API listening on {addr}{}", config.base_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| WaError::internal_with(format!("REST server error: {e}"), e))
}

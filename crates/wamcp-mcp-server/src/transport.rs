// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transports: stdio, legacy SSE, and streamable HTTP.
//!
//! Legacy SSE: `GET /sse` opens a stream whose first event, `endpoint`,
//! names `/message?sessionId=<id>`. Clients POST JSON-RPC messages there
//! and read responses as `message` events. Each stream runs its own
//! server instance until the client disconnects.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use dashmap::DashMap;
use futures::channel::mpsc;
use futures::{SinkExt, Stream, StreamExt, stream};
use rmcp::ServiceExt;
use rmcp::model::{ClientJsonRpcMessage, ServerJsonRpcMessage};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use wamcp_core::WaError;

use crate::server::WhatsAppMcpServer;

const SESSION_BUFFER: usize = 64;

type Sessions = Arc<DashMap<String, mpsc::Sender<ClientJsonRpcMessage>>>;

#[derive(Clone)]
struct SseState {
    server: WhatsAppMcpServer,
    sessions: Sessions,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// Removes the session entry when its event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        tracing::debug!(session = %self.id, "SSE session closed");
    }
}

fn message_event(message: &ServerJsonRpcMessage) -> Event {
    let data = serde_json::to_string(message).unwrap_or_default();
    Event::default().event("message").data(data)
}

async fn sse_handler(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = uuid::Uuid::new_v4().simple().to_string();
    let (client_tx, client_rx) = mpsc::channel::<ClientJsonRpcMessage>(SESSION_BUFFER);
    let (server_tx, server_rx) = mpsc::channel::<ServerJsonRpcMessage>(SESSION_BUFFER);
    state.sessions.insert(session_id.clone(), client_tx);
    tracing::debug!(session = %session_id, "SSE session opened");

    let server = state.server.clone();
    let id = session_id.clone();
    tokio::spawn(async move {
        match server.serve((server_tx, client_rx)).await {
            Ok(running) => {
                let _ = running.waiting().await;
            }
            Err(e) => tracing::warn!(session = %id, error = %e, "SSE session failed to initialize"),
        }
    });

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/message?sessionId={session_id}"));
    let guard = SessionGuard {
        id: session_id,
        sessions: state.sessions.clone(),
    };
    let messages = stream::unfold((server_rx, guard), |(mut rx, guard)| async move {
        let message = rx.next().await?;
        Some((Ok(message_event(&message)), (rx, guard)))
    });

    Sse::new(stream::once(async move { Ok(endpoint) }).chain(messages))
        .keep_alive(KeepAlive::default())
}

async fn message_handler(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    Json(message): Json<ClientJsonRpcMessage>,
) -> StatusCode {
    let Some(mut sender) = state
        .sessions
        .get(&query.session_id)
        .map(|entry| entry.value().clone())
    else {
        return StatusCode::NOT_FOUND;
    };
    match sender.send(message).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => {
            state.sessions.remove(&query.session_id);
            StatusCode::GONE
        }
    }
}

/// Router serving `/sse`, `/message` and the streamable HTTP endpoint `/mcp`.
pub fn http_router(server: WhatsAppMcpServer) -> Router {
    let factory_server = server.clone();
    let streamable = StreamableHttpService::new(
        move || Ok(factory_server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let state = SseState {
        server,
        sessions: Arc::new(DashMap::new()),
    };

    Router::new()
        .route("/sse", get(sse_handler))
        .route("/message", post(message_handler))
        .with_state(state)
        .nest_service("/mcp", streamable)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the HTTP transports until `shutdown` is cancelled.
pub async fn serve_http(
    server: WhatsAppMcpServer,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> Result<(), WaError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        WaError::internal_with(format!("failed to bind MCP server to {addr}: {e}"), e)
    })?;
    tracing::info!("MCP server listening on {addr} (SSE at /sse, streamable HTTP at /mcp)");

    axum::serve(listener, http_router(server))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| WaError::internal_with(format!("MCP server error: {e}"), e))
}

/// Serve one session over stdin/stdout until the peer closes or
/// `shutdown` is cancelled.
pub async fn serve_stdio(
    server: WhatsAppMcpServer,
    shutdown: CancellationToken,
) -> Result<(), WaError> {
    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| WaError::internal(format!("MCP stdio session failed to start: {e}")))?;
    tracing::info!("MCP server running on stdio");

    let session_token = running.cancellation_token();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        session_token.cancel();
    });
    running
        .waiting()
        .await
        .map_err(|e| WaError::internal_with("MCP stdio session aborted", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt as _;
    use wamcp_service::EmbeddedService;
    use wamcp_test_utils::MockSession;

    fn router() -> Router {
        let service = Arc::new(EmbeddedService::new(Arc::new(MockSession::ready())));
        http_router(WhatsAppMcpServer::new(service, std::env::temp_dir()))
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/message?sessionId=nope")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sse_stream_opens_with_event_stream_type() {
        let request = Request::builder().uri("/sse").body(Body::empty()).unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/event-stream"));
    }

    #[test]
    fn guard_removes_session() {
        let sessions: Sessions = Arc::new(DashMap::new());
        let (tx, _rx) = mpsc::channel(1);
        sessions.insert("abc".into(), tx);
        drop(SessionGuard {
            id: "abc".into(),
            sessions: sessions.clone(),
        });
        assert!(sessions.is_empty());
    }
}

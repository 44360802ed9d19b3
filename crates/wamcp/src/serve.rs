// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mode selection and server startup.
//!
//! The backend is chosen once here from configuration. Every server below
//! only sees an `Arc<dyn WhatsAppService>`.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wamcp_config::{AuthStrategy, McpMode, McpTransport, RunMode, WamcpConfig};
use wamcp_core::{WaError, WhatsAppService, WhatsAppSession};
use wamcp_gateway::{ApiState, ServerConfig, api_key};
use wamcp_mcp_server::WhatsAppMcpServer;
use wamcp_service::{Backend, build_service};
use wamcp_session::SessionFactory;

use crate::shutdown;

/// Runs the configured server until a shutdown signal arrives.
pub async fn run(config: WamcpConfig) -> Result<(), WaError> {
    init_tracing(&config.log.level);
    info!(mode = %config.mode, version = env!("CARGO_PKG_VERSION"), "starting wamcp");

    let cancel = shutdown::install_signal_handler();
    run_until(&config, cancel).await?;

    info!("wamcp shutdown complete");
    Ok(())
}

/// Dispatch on the run mode.
async fn run_until(config: &WamcpConfig, cancel: CancellationToken) -> Result<(), WaError> {
    match config.mode {
        RunMode::WhatsappApi => {
            let session = start_session(config).await?;
            let result = serve_api(config, session.clone(), cancel).await;
            close_session(session.as_ref()).await;
            result
        }
        RunMode::Mcp => match config.mcp.mode {
            McpMode::Standalone => {
                let session = start_session(config).await?;
                let service = build_service(Backend::Embedded(session.clone()))?;
                let result = serve_mcp(config, service, cancel).await;
                close_session(session.as_ref()).await;
                result
            }
            McpMode::Api => {
                info!(base_url = %config.mcp.api_base_url, "delegating to remote REST API");
                let service = build_service(Backend::Remote {
                    base_url: config.mcp.api_base_url.clone(),
                    api_key: config.mcp.api_key.clone(),
                })?;
                serve_mcp(config, service, cancel).await
            }
        },
    }
}

async fn start_session(config: &WamcpConfig) -> Result<Arc<dyn WhatsAppSession>, WaError> {
    let session: Arc<dyn WhatsAppSession> = SessionFactory::new(config).create().await?;
    Ok(session)
}

async fn serve_api(
    config: &WamcpConfig,
    session: Arc<dyn WhatsAppSession>,
    cancel: CancellationToken,
) -> Result<(), WaError> {
    let service = build_service(Backend::Embedded(session))?;

    let persist = config.whatsapp.effective_auth_strategy() == AuthStrategy::Local;
    let key = api_key::load_or_create(Path::new(&config.whatsapp.auth_data_path), persist).await?;
    info!("WhatsApp API key: {key}");

    let server_config = ServerConfig {
        host: config.api.host.clone(),
        port: config.api.port,
        base_path: config.api.base_path.clone(),
        api_key: Some(key),
    };
    let state = ApiState {
        service,
        media_dir: config.whatsapp.media_dir(),
        hide_error_details: config.api.hide_error_details,
    };
    let app = wamcp_gateway::router(state, &server_config);
    wamcp_gateway::start_server(&server_config, app, cancel).await
}

async fn serve_mcp(
    config: &WamcpConfig,
    service: Arc<dyn WhatsAppService>,
    cancel: CancellationToken,
) -> Result<(), WaError> {
    let server = WhatsAppMcpServer::new(service, config.whatsapp.media_dir());
    match config.mcp.transport {
        McpTransport::Sse => {
            wamcp_mcp_server::serve_http(server, &config.mcp.host, config.mcp.port, cancel).await
        }
        McpTransport::Command => wamcp_mcp_server::serve_stdio(server, cancel).await,
    }
}

async fn close_session(session: &dyn WhatsAppSession) {
    match session.destroy().await {
        Ok(()) => info!("WhatsApp session closed"),
        Err(e) => warn!(error = %e, "failed to close WhatsApp session"),
    }
}

/// Filter directives for a configured log level.
///
/// `http` is `debug` for our crates plus request traces from tower-http.
fn filter_directives(log_level: &str) -> String {
    match log_level {
        "http" => "wamcp=debug,tower_http=debug,warn".to_string(),
        level => format!("wamcp={level},warn"),
    }
}

/// Initializes the tracing subscriber. Output goes to stderr so that stdout
/// stays free for the stdio transport.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_level_adds_request_traces() {
        assert_eq!(filter_directives("http"), "wamcp=debug,tower_http=debug,warn");
        assert_eq!(filter_directives("info"), "wamcp=info,warn");
        assert_eq!(filter_directives("trace"), "wamcp=trace,warn");
    }

    #[tokio::test]
    async fn remote_mcp_mode_stops_on_cancel() {
        let mut config = WamcpConfig::default();
        config.mcp.mode = McpMode::Api;
        config.mcp.host = "127.0.0.1".to_string();
        config.mcp.port = 0;
        let cancel = CancellationToken::new();
        cancel.cancel();

        run_until(&config, cancel).await.unwrap();
    }

    #[tokio::test]
    async fn remote_mcp_mode_rejects_bad_base_url() {
        let mut config = WamcpConfig::default();
        config.mcp.mode = McpMode::Api;
        config.mcp.api_base_url = "not a url".to_string();

        let err = run_until(&config, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), wamcp_core::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn missing_driver_aborts_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WamcpConfig::default();
        config.mode = RunMode::WhatsappApi;
        config.whatsapp.auth_data_path = dir.path().join("auth").display().to_string();
        config.driver.command = dir.path().join("no-such-driver").display().to_string();

        let err = run_until(&config, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), wamcp_core::ErrorKind::Internal);
        assert!(err.to_string().contains("failed to spawn driver"));
    }
}

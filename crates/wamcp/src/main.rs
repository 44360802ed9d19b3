// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! wamcp - WhatsApp Web exposed as a REST API and an MCP server.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::Parser;
use wamcp_config::{AuthStrategy, McpMode, McpTransport, RunMode, WamcpConfig};

/// wamcp - WhatsApp Web as a REST API and an MCP server.
#[derive(Parser, Debug, Default)]
#[command(name = "wamcp", version, about, long_about = None)]
struct Cli {
    /// Run the MCP server or the REST API server.
    #[arg(short = 'm', long)]
    mode: Option<RunMode>,

    /// Where the MCP server gets its data: a local session or a remote REST API.
    #[arg(short = 'c', long)]
    mcp_mode: Option<McpMode>,

    /// MCP transport: `sse` (HTTP) or `command` (stdio).
    #[arg(short = 't', long)]
    transport: Option<McpTransport>,

    /// Port of the MCP HTTP transports.
    #[arg(short = 'p', long)]
    sse_port: Option<u16>,

    /// Port of the REST API server.
    #[arg(long)]
    api_port: Option<u16>,

    /// Directory holding session credentials.
    #[arg(short = 'a', long)]
    auth_data_path: Option<String>,

    /// Credential persistence: `local` or `none`.
    #[arg(short = 's', long)]
    auth_strategy: Option<AuthStrategy>,

    /// Base URL of the remote REST API in `api` MCP mode.
    #[arg(short = 'b', long)]
    api_base_url: Option<String>,

    /// Bearer key for the remote REST API.
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Directory for downloaded media.
    #[arg(long)]
    media_storage_path: Option<String>,

    /// Also write the pairing QR code to this file.
    #[arg(long)]
    qr_code_file: Option<String>,

    /// One of error, warn, info, http, debug, trace.
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Explicit configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags win over every configuration source.
    fn apply(self, config: &mut WamcpConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(mode) = self.mcp_mode {
            config.mcp.mode = mode;
        }
        if let Some(transport) = self.transport {
            config.mcp.transport = transport;
        }
        if let Some(port) = self.sse_port {
            config.mcp.port = port;
        }
        if let Some(port) = self.api_port {
            config.api.port = port;
        }
        if let Some(path) = self.auth_data_path {
            config.whatsapp.auth_data_path = path;
        }
        if let Some(strategy) = self.auth_strategy {
            config.whatsapp.auth_strategy = strategy;
        }
        if let Some(url) = self.api_base_url {
            config.mcp.api_base_url = url;
        }
        if let Some(key) = self.api_key {
            config.mcp.api_key = key;
        }
        if self.media_storage_path.is_some() {
            config.whatsapp.media_storage_path = self.media_storage_path;
        }
        if self.qr_code_file.is_some() {
            config.whatsapp.qr_code_file = self.qr_code_file;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
    }
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    let mut config = match wamcp_config::load(cli.config.take().as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            wamcp_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    cli.apply(&mut config);
    if let Err(errors) = wamcp_config::validate_config(&config) {
        wamcp_config::render_errors(&errors);
        std::process::exit(1);
    }

    if let Err(e) = serve::run(config).await {
        tracing::error!(error = %e, "wamcp exited with an error");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "wamcp", "-m", "whatsapp-api", "-c", "api", "-t", "command", "-p", "4000", "-a",
            "/data/auth", "-s", "none", "-b", "http://remote:3001/api", "-k", "secret", "-l",
            "debug",
        ])
        .unwrap();
        let mut config = WamcpConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.mode, RunMode::WhatsappApi);
        assert_eq!(config.mcp.mode, McpMode::Api);
        assert_eq!(config.mcp.transport, McpTransport::Command);
        assert_eq!(config.mcp.port, 4000);
        assert_eq!(config.whatsapp.auth_data_path, "/data/auth");
        assert_eq!(config.whatsapp.auth_strategy, AuthStrategy::None);
        assert_eq!(config.mcp.api_base_url, "http://remote:3001/api");
        assert_eq!(config.mcp.api_key, "secret");
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let cli = Cli::try_parse_from(["wamcp"]).unwrap();
        let mut config = WamcpConfig::default();
        config.api.port = 8080;
        config.whatsapp.media_storage_path = Some("/srv/media".into());
        cli.apply(&mut config);

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.whatsapp.media_storage_path.as_deref(), Some("/srv/media"));
        assert_eq!(config.mode, RunMode::Mcp);
    }

    #[test]
    fn long_only_flags_apply() {
        let cli = Cli::try_parse_from([
            "wamcp",
            "--api-port",
            "3101",
            "--media-storage-path",
            "/tmp/media",
            "--qr-code-file",
            "/tmp/qr.svg",
            "--config",
            "/etc/wamcp/custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/wamcp/custom.toml")));
        let mut config = WamcpConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.api.port, 3101);
        assert_eq!(config.whatsapp.media_storage_path.as_deref(), Some("/tmp/media"));
        assert_eq!(config.whatsapp.qr_code_file.as_deref(), Some("/tmp/qr.svg"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["wamcp", "--mode", "telegram"]).is_err());
    }
}

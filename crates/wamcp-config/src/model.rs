// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the WhatsApp MCP bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable and command-line overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WamcpConfig {
    /// Which server this process runs.
    #[serde(default)]
    pub mode: RunMode,

    /// Messaging session settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Browser-automation driver process.
    #[serde(default)]
    pub driver: DriverConfig,

    /// REST API server.
    #[serde(default)]
    pub api: ApiConfig,

    /// MCP server.
    #[serde(default)]
    pub mcp: McpConfig,

    /// Outbound webhook dispatch.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// What the process runs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RunMode {
    /// MCP server.
    #[default]
    Mcp,
    /// REST API server.
    WhatsappApi,
}

/// Where the MCP server gets its data from.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum McpMode {
    /// Drive a local session directly.
    #[default]
    Standalone,
    /// Delegate to a remote REST API deployment.
    Api,
}

/// MCP transport.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum McpTransport {
    /// Server-sent events over HTTP.
    #[default]
    Sse,
    /// Standard input/output.
    Command,
}

/// Credential store used by the session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthStrategy {
    /// Persist credentials under `auth_data_path`.
    #[default]
    Local,
    /// No persistent credentials. A fresh API key is minted every start.
    None,
}

/// Messaging session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Directory holding the credential profile, `webhook.json` and `api_key.txt`.
    #[serde(default = "default_auth_data_path")]
    pub auth_data_path: String,

    #[serde(default)]
    pub auth_strategy: AuthStrategy,

    /// Running inside a container. Forces the `none` auth strategy.
    #[serde(default)]
    pub docker_container: bool,

    /// Where downloaded media is stored. Defaults to `<auth_data_path>/media`.
    #[serde(default)]
    pub media_storage_path: Option<String>,

    /// Write the pairing code to this file as SVG instead of the terminal.
    #[serde(default)]
    pub qr_code_file: Option<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            auth_data_path: default_auth_data_path(),
            auth_strategy: AuthStrategy::default(),
            docker_container: false,
            media_storage_path: None,
            qr_code_file: None,
        }
    }
}

impl WhatsAppConfig {
    /// Resolved media directory.
    pub fn media_dir(&self) -> PathBuf {
        match &self.media_storage_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.auth_data_path).join("media"),
        }
    }

    /// The strategy actually used. Container deployments never persist credentials.
    pub fn effective_auth_strategy(&self) -> AuthStrategy {
        if self.docker_container {
            AuthStrategy::None
        } else {
            self.auth_strategy
        }
    }
}

fn default_auth_data_path() -> String {
    ".wwebjs_auth".to_string()
}

/// Driver process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Executable that runs the browser-automation client.
    #[serde(default = "default_driver_command")]
    pub command: String,

    /// Extra arguments passed to the driver.
    #[serde(default)]
    pub args: Vec<String>,

    /// Maximum concurrent calls into the driver.
    #[serde(default = "default_driver_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command: default_driver_command(),
            args: Vec::new(),
            max_in_flight: default_driver_max_in_flight(),
        }
    }
}

fn default_driver_command() -> String {
    "wamcp-driver".to_string()
}

fn default_driver_max_in_flight() -> usize {
    4
}

/// REST API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Mount point of the routes.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Omit `details` from 500 responses.
    #[serde(default)]
    pub hide_error_details: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_api_port(),
            base_path: default_base_path(),
            hide_error_details: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3001
}

fn default_base_path() -> String {
    "/api".to_string()
}

/// MCP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    #[serde(default)]
    pub mode: McpMode,

    #[serde(default)]
    pub transport: McpTransport,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_mcp_port")]
    pub port: u16,

    /// Base URL of the remote REST API, used in `api` mode.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer key for the remote REST API.
    #[serde(default)]
    pub api_key: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            mode: McpMode::default(),
            transport: McpTransport::default(),
            host: default_host(),
            port: default_mcp_port(),
            api_base_url: default_api_base_url(),
            api_key: String::new(),
        }
    }
}

fn default_mcp_port() -> u16 {
    3002
}

fn default_api_base_url() -> String {
    "http://localhost:3001/api".to_string()
}

/// Webhook dispatch limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Maximum outstanding deliveries. Further events are dropped.
    #[serde(default = "default_webhook_max_in_flight")]
    pub max_in_flight: usize,

    /// Per-delivery timeout.
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_webhook_max_in_flight(),
            timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

fn default_webhook_max_in_flight() -> usize {
    16
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// One of `error`, `warn`, `info`, `http`, `debug`, `trace`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log levels accepted by `log.level`.
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "http", "debug", "trace"];

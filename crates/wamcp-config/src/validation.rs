// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! bind hosts, non-empty paths, non-zero bounds and mode combinations.

use crate::diagnostic::ConfigError;
use crate::model::{LOG_LEVELS, McpMode, WamcpConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &WamcpConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.whatsapp.auth_data_path.trim().is_empty() {
        fail("whatsapp.auth_data_path must not be empty".to_string());
    }
    if let Some(path) = &config.whatsapp.media_storage_path
        && path.trim().is_empty()
    {
        fail("whatsapp.media_storage_path must not be empty when set".to_string());
    }

    if config.driver.command.trim().is_empty() {
        fail("driver.command must not be empty".to_string());
    }
    if config.driver.max_in_flight == 0 {
        fail("driver.max_in_flight must be at least 1".to_string());
    }

    for (key, host) in [("api.host", &config.api.host), ("mcp.host", &config.mcp.host)] {
        if let Some(message) = check_host(key, host) {
            fail(message);
        }
    }
    for (key, port) in [("api.port", config.api.port), ("mcp.port", config.mcp.port)] {
        if port == 0 {
            fail(format!("{key} must not be 0"));
        }
    }

    if !config.api.base_path.starts_with('/') {
        fail(format!(
            "api.base_path `{}` must start with `/`",
            config.api.base_path
        ));
    }

    if config.mcp.mode == McpMode::Api {
        let url = config.mcp.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            fail(format!(
                "mcp.api_base_url `{url}` must be an http:// or https:// URL in api mode"
            ));
        }
    }

    if config.webhook.max_in_flight == 0 {
        fail("webhook.max_in_flight must be at least 1".to_string());
    }
    if config.webhook.timeout_secs == 0 {
        fail("webhook.timeout_secs must be at least 1".to_string());
    }

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        fail(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_host(key: &str, host: &str) -> Option<String> {
    let addr = host.trim();
    if addr.is_empty() {
        return Some(format!("{key} must not be empty"));
    }
    let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
    let is_valid_hostname = addr
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
    if is_valid_ip || is_valid_hostname {
        None
    } else {
        Some(format!("{key} `{addr}` is not a valid IP address or hostname"))
    }
}

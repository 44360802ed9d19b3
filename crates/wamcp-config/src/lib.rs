// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the WhatsApp MCP bridge.
//!
//! TOML configuration with strict key checking (`deny_unknown_fields`), XDG
//! file hierarchy lookup, `WAMCP_*` environment overrides and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! let config = wamcp_config::load_and_validate(None).expect("config errors");
//! println!("REST port: {}", config.api.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_str};
pub use model::{AuthStrategy, McpMode, McpTransport, RunMode, WamcpConfig};
pub use validation::validate_config;

/// Load configuration from the file hierarchy and validate it.
pub fn load_and_validate(explicit: Option<&Path>) -> Result<WamcpConfig, Vec<ConfigError>> {
    let config = load(explicit)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration without validating it.
///
/// The binary uses this to apply command-line overrides before calling
/// [`validate_config`].
pub fn load(explicit: Option<&Path>) -> Result<WamcpConfig, Vec<ConfigError>> {
    loader::load_config(explicit)
        .map_err(|err| diagnostic::figment_to_config_errors(err, &collect_toml_sources(explicit)))
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<WamcpConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read every config file that exists, for error span resolution.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    let local = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(loader::LOCAL_CONFIG_FILE).to_path_buf());
    let local = std::env::current_dir()
        .map(|d| d.join(&local))
        .unwrap_or(local);

    [
        Some(local),
        loader::user_config_path(),
        Some(Path::new(loader::SYSTEM_CONFIG_PATH).to_path_buf()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| {
        std::fs::read_to_string(&path)
            .ok()
            .map(|content| (path.display().to_string(), content))
    })
    .collect()
}

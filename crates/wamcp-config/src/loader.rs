// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wamcp.toml` > `~/.config/wamcp/wamcp.toml` > `/etc/wamcp/wamcp.toml`
//! with environment variable overrides via the `WAMCP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WamcpConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/wamcp/wamcp.toml";

/// Local config file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "wamcp.toml";

/// Config sections, in the order used to split env var names.
const SECTIONS: &[&str] = &["whatsapp", "driver", "api", "mcp", "webhook", "log"];

/// Path of the per-user config file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wamcp").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wamcp/wamcp.toml` (system-wide)
/// 3. `~/.config/wamcp/wamcp.toml` (user XDG config)
/// 4. `./wamcp.toml`, or `explicit` when given
/// 5. `WAMCP_*` environment variables and `DOCKER_CONTAINER`
pub fn load_config(explicit: Option<&Path>) -> Result<WamcpConfig, figment::Error> {
    build_figment(explicit).extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WamcpConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WamcpConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment(explicit: Option<&Path>) -> Figment {
    let local = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
    Figment::new()
        .merge(Serialized::defaults(WamcpConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(local))
        .merge(env_provider())
        .merge(docker_provider())
}

/// `WAMCP_<SECTION>_<KEY>` maps to `<section>.<key>`.
///
/// Uses an explicit section table instead of `Env::split("_")` because key
/// names contain underscores: `WAMCP_MCP_API_BASE_URL` is `mcp.api_base_url`.
fn env_provider() -> Env {
    Env::prefixed("WAMCP_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

/// Container runtimes conventionally set `DOCKER_CONTAINER=true`.
fn docker_provider() -> Env {
    Env::raw()
        .only(&["DOCKER_CONTAINER"])
        .map(|_| "whatsapp.docker_container".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("mcp_api_base_url"), "mcp.api_base_url");
        assert_eq!(map_env_key("whatsapp_auth_data_path"), "whatsapp.auth_data_path");
        assert_eq!(map_env_key("api_hide_error_details"), "api.hide_error_details");
        assert_eq!(map_env_key("log_level"), "log.level");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "wamcp.toml",
                r#"
[api]
port = 4000
"#,
            )?;
            jail.set_env("WAMCP_API_PORT", "5000");
            jail.set_env("WAMCP_MCP_API_KEY", "secret");
            jail.set_env("DOCKER_CONTAINER", "true");

            let config = load_config(None)?;
            assert_eq!(config.api.port, 5000);
            assert_eq!(config.mcp.api_key, "secret");
            assert!(config.whatsapp.docker_container);
            Ok(())
        });
    }

    #[test]
    fn explicit_path_replaces_local_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("wamcp.toml", "[mcp]\nport = 1111\n")?;
            jail.create_file("other.toml", "[mcp]\nport = 2222\n")?;
            let config = load_config(Some(Path::new("other.toml")))?;
            assert_eq!(config.mcp.port, 2222);
            Ok(())
        });
    }
}

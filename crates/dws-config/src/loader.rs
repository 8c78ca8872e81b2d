// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dws.toml` > `~/.config/dws-mcp/dws.toml` > `/etc/dws-mcp/dws.toml`
//! with environment variable overrides via `DWS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DwsConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/dws-mcp/dws.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "dws.toml";

/// Returns the per-user config file path, if a config directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dws-mcp/dws.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dws-mcp/dws.toml` (system-wide)
/// 3. `~/.config/dws-mcp/dws.toml` (user XDG config)
/// 4. `./dws.toml` (local directory)
/// 5. `DWS_*` environment variables
pub fn load_config() -> Result<DwsConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DwsConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DwsConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DwsConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DwsConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DwsConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")`: `DWS_API_CLIENT_ID` must map to
/// `api.client_id`, not `api.client.id`. `DWS_API_KEY` is the credential and
/// is read separately, so it is ignored here rather than rejected as an
/// unknown `api.key` field.
fn env_provider() -> Env {
    Env::prefixed("DWS_").ignore(&["api_key"]).map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: DWS_SANDBOX_ROOT -> "sandbox_root"
        let mapped = key
            .as_str()
            .replacen("api_", "api.", 1)
            .replacen("sandbox_", "sandbox.", 1)
            .replacen("credits_", "credits.", 1)
            .replacen("server_", "server.", 1);
        mapped.into()
    })
}

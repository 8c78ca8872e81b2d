// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the dws-mcp server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.
//!
//! The API credential is deliberately absent: it is read from the
//! environment only (see [`crate::api_key_from_env`]).

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DwsConfig {
    /// Remote processing API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Path sandbox settings.
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Local credit usage ledger settings.
    #[serde(default)]
    pub credits: CreditsConfig,

    /// Process-level settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Remote processing API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the processing API. Endpoints are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client identifier sent as the `User-Agent` header.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Timeout for build and sign requests. `None` means no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Timeout for AI redaction requests, which run far longer than builds.
    #[serde(default = "default_ai_redact_timeout_secs")]
    pub ai_redact_timeout_secs: u64,

    /// Response header carrying the credits charged for a request.
    #[serde(default = "default_credit_cost_header")]
    pub credit_cost_header: String,

    /// Response header carrying the remaining credit balance.
    #[serde(default = "default_credit_remaining_header")]
    pub credit_remaining_header: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client_id: default_client_id(),
            request_timeout_secs: None,
            ai_redact_timeout_secs: default_ai_redact_timeout_secs(),
            credit_cost_header: default_credit_cost_header(),
            credit_remaining_header: default_credit_remaining_header(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.nutrient.io".to_string()
}

fn default_client_id() -> String {
    format!("dws-mcp/{}", env!("CARGO_PKG_VERSION"))
}

fn default_ai_redact_timeout_secs() -> u64 {
    300 // 5 minutes
}

fn default_credit_cost_header() -> String {
    "x-credits-cost".to_string()
}

fn default_credit_remaining_header() -> String {
    "x-credits-remaining".to_string()
}

/// Path sandbox configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Jail directory. `None` disables the sandbox; all paths must then be absolute.
    /// The `--sandbox` flag and `SANDBOX_PATH` take precedence over this value.
    #[serde(default)]
    pub root: Option<String>,
}

/// Credit ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreditsConfig {
    /// Record per-request credit usage reported by the API.
    #[serde(default = "default_credits_enabled")]
    pub enabled: bool,

    /// Path to the SQLite ledger file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            enabled: default_credits_enabled(),
            database_path: default_database_path(),
        }
    }
}

fn default_credits_enabled() -> bool {
    true
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("dws-mcp").join("credits.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("credits.db"))
        .to_string_lossy()
        .into_owned()
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

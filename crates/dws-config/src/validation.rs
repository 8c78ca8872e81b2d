// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! URL schemes, non-empty identifiers, and positive timeouts.

use crate::diagnostic::ConfigError;
use crate::model::DwsConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &DwsConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.api.base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        errors.push(ConfigError::validation(format!(
            "api.base_url must start with http:// or https://, got `{base_url}`"
        )));
    } else if base_url
        .split_once("://")
        .is_none_or(|(_, rest)| rest.trim_matches('/').is_empty())
    {
        errors.push(ConfigError::validation(format!(
            "api.base_url `{base_url}` has no host"
        )));
    }

    if config.api.client_id.trim().is_empty() {
        errors.push(ConfigError::validation("api.client_id must not be empty"));
    }

    if config.api.request_timeout_secs == Some(0) {
        errors.push(ConfigError::validation(
            "api.request_timeout_secs must be greater than 0 (omit it to disable the timeout)",
        ));
    }

    if config.api.ai_redact_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "api.ai_redact_timeout_secs must be greater than 0",
        ));
    }

    for (key, value) in [
        ("api.credit_cost_header", &config.api.credit_cost_header),
        ("api.credit_remaining_header", &config.api.credit_remaining_header),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{key} must not be empty")));
        }
    }

    if let Some(root) = &config.sandbox.root
        && root.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "sandbox.root must not be empty (omit it to disable the sandbox)",
        ));
    }

    if config.credits.enabled && config.credits.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "credits.database_path must not be empty when credits.enabled is true",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

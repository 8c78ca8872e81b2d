// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dws check-config` output.

use std::fmt::Write;

use dws_config::{API_KEY_ENV, DwsConfig};

/// Renders the effective configuration. The credential is reported as
/// present or missing, never printed.
pub fn summary(config: &DwsConfig, api_key_present: bool) -> String {
    let mut out = String::from("configuration OK\n");
    let api = &config.api;
    let _ = writeln!(out, "  api.base_url           = {}", api.base_url);
    let _ = writeln!(out, "  api.client_id          = {}", api.client_id);
    let _ = writeln!(
        out,
        "  api.request_timeout    = {}",
        api.request_timeout_secs
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "none".to_string())
    );
    let _ = writeln!(out, "  api.ai_redact_timeout  = {}s", api.ai_redact_timeout_secs);
    let _ = writeln!(
        out,
        "  sandbox.root           = {}",
        config.sandbox.root.as_deref().unwrap_or("(disabled)")
    );
    let _ = writeln!(
        out,
        "  credits                = {}",
        if config.credits.enabled {
            config.credits.database_path.as_str()
        } else {
            "(disabled)"
        }
    );
    let _ = writeln!(out, "  server.log_level       = {}", config.server.log_level);
    let _ = writeln!(
        out,
        "  {API_KEY_ENV}            = {}",
        if api_key_present { "set" } else { "MISSING" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_defaults() {
        let config = DwsConfig::default();
        let text = summary(&config, false);
        assert!(text.contains("sandbox.root           = (disabled)"));
        assert!(text.contains("api.request_timeout    = none"));
        assert!(text.contains("DWS_API_KEY            = MISSING"));
    }

    #[test]
    fn summary_never_includes_the_credential() {
        let mut config = DwsConfig::default();
        config.sandbox.root = Some("/srv/docs".into());
        config.credits.enabled = false;
        let text = summary(&config, true);
        assert!(text.contains("= set"));
        assert!(text.contains("/srv/docs"));
        assert!(text.contains("credits                = (disabled)"));
    }
}

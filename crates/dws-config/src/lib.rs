// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the dws-mcp server.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `DWS_*` environment variable overrides, and miette
//! diagnostic rendering with typo suggestions.
//!
//! The API credential never lives in a config file. It is read from
//! [`API_KEY_ENV`] by [`api_key_from_env`].
//!
//! # Usage
//!
//! ```no_run
//! use dws_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("API base URL: {}", config.api.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

use secrecy::SecretString;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::DwsConfig;

/// Environment variable holding the processing API credential.
pub const API_KEY_ENV: &str = "DWS_API_KEY";

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `DwsConfig` or every diagnostic found.
pub fn load_and_validate() -> Result<DwsConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<DwsConfig, Vec<ConfigError>> {
    if !path.is_file() {
        return Err(vec![ConfigError::Other(format!(
            "config file {} does not exist",
            path.display()
        ))]);
    }
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<DwsConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read the API credential from [`API_KEY_ENV`].
pub fn api_key_from_env() -> Result<SecretString, ConfigError> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

/// Turn a raw credential value into a secret, rejecting missing or blank values.
pub fn api_key_from(value: Option<String>) -> Result<SecretString, ConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key.trim().to_string())),
        _ => Err(ConfigError::MissingCredential { var: API_KEY_ENV }),
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from(loader::SYSTEM_CONFIG_PATH)];
    if let Some(user) = loader::user_config_path() {
        candidates.push(user);
    }
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_PATH))
            .unwrap_or_else(|_| loader::LOCAL_CONFIG_PATH.into()),
    );

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn api_key_from_accepts_trimmed_value() {
        let key = api_key_from(Some("  secret-key \n".into())).unwrap();
        assert_eq!(key.expose_secret(), "secret-key");
    }

    #[test]
    fn api_key_from_rejects_missing_or_blank() {
        assert!(matches!(
            api_key_from(None),
            Err(ConfigError::MissingCredential { var: API_KEY_ENV })
        ));
        assert!(api_key_from(Some("   ".into())).is_err());
    }

    #[test]
    fn load_and_validate_str_reports_validation_errors() {
        let errors = load_and_validate_str("[api]\nbase_url = \"nope\"\n").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::Validation { .. }));
    }

    #[test]
    fn load_and_validate_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dws.toml");
        std::fs::write(&path, "[server]\nlog_level = \"debug\"\n").unwrap();
        let config = load_and_validate_path(&path).unwrap();
        assert_eq!(config.server.log_level, "debug");
    }

    #[test]
    fn load_and_validate_path_missing_file() {
        let errors = load_and_validate_path(Path::new("/nonexistent/dws.toml")).unwrap_err();
        assert!(errors[0].to_string().contains("does not exist"));
    }
}

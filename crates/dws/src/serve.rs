// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dws serve`: wires the jail, API client, and credit ledger into the
//! MCP server and runs it over stdio.

use std::sync::Arc;

use dws_config::DwsConfig;
use dws_core::DwsError;
use dws_credits::CreditLedger;
use dws_mcp_server::{DwsServer, OperationGateway, RedactingWriter, Redactor};
use dws_processor::DwsClient;
use dws_sandbox::PathJail;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

/// Runs the MCP server until the client disconnects.
///
/// `sandbox` comes from `--sandbox` or `SANDBOX_PATH` and takes precedence
/// over `sandbox.root` in the config.
pub async fn run_serve(
    config: DwsConfig,
    sandbox: Option<String>,
    api_key: SecretString,
) -> Result<(), DwsError> {
    let redactor = Redactor::new([api_key.expose_secret().to_string()]);
    init_tracing(&config.server.log_level, redactor.clone());

    info!("starting dws serve");

    let root = sandbox_root(sandbox, config.sandbox.root.as_deref());
    let jail = PathJail::new(root.as_deref())?;
    match jail.root() {
        Some(root) => info!(root = %root.display(), "sandbox enabled"),
        None => warn!("no sandbox configured; tools accept any absolute path"),
    }

    let client = DwsClient::new(&config.api, &api_key)?;
    let mut gateway = OperationGateway::new(jail, client).with_redactor(redactor);

    if config.credits.enabled {
        match CreditLedger::open(&config.credits.database_path).await {
            Ok(ledger) => {
                info!(path = %config.credits.database_path, "credit ledger opened");
                gateway = gateway.with_ledger(Arc::new(ledger));
            }
            Err(e) => {
                warn!(error = %e, "credit ledger unavailable; usage will not be recorded");
            }
        }
    }

    DwsServer::new(gateway).serve_stdio().await
}

/// Picks the jail root: flag or `SANDBOX_PATH` first, then the config file.
/// Blank values count as unset.
fn sandbox_root(cli: Option<String>, configured: Option<&str>) -> Option<String> {
    cli.filter(|s| !s.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .filter(|s| !s.trim().is_empty())
}

/// Logs go to stderr; stdout carries the MCP transport.
fn init_tracing(log_level: &str, redactor: Redactor) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "dws={log_level},dws_mcp_server={log_level},dws_processor={log_level},\
             dws_sandbox={log_level},dws_credits={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(move || RedactingWriter::new(std::io::stderr(), redactor.clone()))
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

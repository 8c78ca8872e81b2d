// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! dws - MCP server for the document processing API.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dws_config::DwsConfig;

/// dws - MCP server for the document processing API.
#[derive(Parser, Debug)]
#[command(name = "dws", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve MCP over stdio (the default).
    Serve(ServeArgs),
    /// Load and validate configuration, then print a summary.
    CheckConfig {
        /// Config file to use instead of the standard locations.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Sandbox directory. Overrides `sandbox.root` from the config file.
    #[arg(long, env = "SANDBOX_PATH")]
    sandbox: Option<String>,
    /// Config file to use instead of the standard locations.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> DwsConfig {
    let loaded = match path {
        Some(path) => dws_config::load_and_validate_path(path),
        None => dws_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            dws_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command.unwrap_or_else(|| Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            let config = load_config(args.config.as_deref());
            let api_key = match dws_config::api_key_from_env() {
                Ok(key) => key,
                Err(e) => {
                    dws_config::render_errors(&[e]);
                    std::process::exit(1);
                }
            };
            if let Err(e) = serve::run_serve(config, args.sandbox, api_key).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig { config } => {
            let config = load_config(config.as_deref());
            let key_present = dws_config::api_key_from_env().is_ok();
            print!("{}", check::summary(&config, key_present));
        }
    }
}

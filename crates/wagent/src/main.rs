// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! wagent - conversational WhatsApp agents backed by an AI assistant.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod agents;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use wagent_config::WagentConfig;

/// wagent - conversational WhatsApp agents backed by an AI assistant.
#[derive(Parser, Debug)]
#[command(name = "wagent", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every agent until SIGINT/SIGTERM.
    Serve,
    /// Manage agents, permission lists and API keys.
    Agents {
        #[command(subcommand)]
        command: agents::AgentsCommand,
    },
    /// Encrypt an API key and print its stored form.
    EncryptKey,
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&std::path::Path>) -> Option<WagentConfig> {
    let loaded = match path {
        Some(path) => wagent_config::load_and_validate_path(path),
        None => wagent_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => Some(config),
        Err(errors) => {
            wagent_config::render_errors(&errors);
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_deref()) else {
        return ExitCode::FAILURE;
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Agents { command } => agents::run(&config, command).await,
        Commands::EncryptKey => agents::encrypt_key(&config),
        Commands::CheckConfig => {
            println!(
                "wagent: config ok (service.name={}, storage.database_path={})",
                config.service.name, config.storage.database_path
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

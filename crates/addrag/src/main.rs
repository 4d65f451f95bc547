// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Addrag - an address resolution service over a vector corpus.
//!
//! This is the binary entry point for the Addrag service.

use clap::{Parser, Subcommand};

mod check;
mod config;
mod handlers;
mod health;
mod serve;
mod server;

/// Addrag - an address resolution service over a vector corpus.
#[derive(Parser, Debug)]
#[command(name = "addrag", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Addrag HTTP service.
    Serve,
    /// Probe the configured Qdrant and Ollama backends.
    Check,
    /// Print the effective merged configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match addrag_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            addrag_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("addrag serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Check) => match check::run_check(&config).await {
            Ok(report) => {
                if !report.all_healthy() {
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("addrag check: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::Config) => {
            if let Err(e) = config::run_config(&config) {
                eprintln!("addrag config: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("addrag: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = addrag_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.service.name, "addrag");
    }
}

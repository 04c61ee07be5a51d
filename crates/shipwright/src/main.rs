// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shipwright - order fulfillment core.
//!
//! This is the binary entry point for the shipwright service.

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Shipwright - order fulfillment core.
#[derive(Parser, Debug)]
#[command(name = "shipwright", version, about, long_about = None)]
struct Cli {
    /// Load configuration from an explicit file instead of the XDG
    /// hierarchy.
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway and the notification worker.
    Serve,
    /// Load and validate configuration, then exit.
    ConfigCheck,
}

fn load_config(cli: &Cli) -> shipwright_config::ShipwrightConfig {
    let result = match &cli.config {
        Some(path) => match shipwright_config::load_config_from_path(path) {
            Ok(config) => {
                shipwright_config::validation::validate_config(&config).map(|()| config)
            }
            Err(err) => Err(vec![shipwright_config::ConfigError::Parse {
                message: err.to_string(),
            }]),
        },
        None => shipwright_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            shipwright_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli);

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::ConfigCheck) => {
            println!(
                "config ok (service.name={}, storage.database_path={})",
                config.service.name, config.storage.database_path
            );
        }
    }
}

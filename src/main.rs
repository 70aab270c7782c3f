//! cronwright - durable scheduler for workflow launch plans
//!
//! Main entry point for the cronwright CLI and scheduler service.

mod adapters;
mod cli;
mod cmd_config;
mod cmd_schedule;
mod cmd_snapshot;
mod server;
mod signal;

use clap::Parser;

use cronwright_config::ConfigLoader;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&cli.config)?;

    match cli.command {
        None | Some(Commands::Run) => {
            server::init_tracing(&config.log_dir())?;
            server::run_scheduler(config).await
        }
        Some(Commands::Schedule { action }) => {
            server::init_console_tracing();
            cmd_schedule::handle_schedule_command(action, &config).await
        }
        Some(Commands::Snapshot { action }) => {
            server::init_console_tracing();
            cmd_snapshot::handle_snapshot_command(action, &config).await
        }
        Some(Commands::Config { action }) => {
            server::init_console_tracing();
            cmd_config::handle_config_command(action, &cli.config, &config)
        }
    }
}

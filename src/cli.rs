//! CLI definitions for cronwright.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// cronwright CLI.
#[derive(Parser)]
#[command(name = "cronwright")]
#[command(about = "Durable cron and fixed-rate scheduler for workflow launch plans")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/cronwright.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler in foreground (default)
    Run,

    /// Schedule registry commands
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Snapshot inspection commands
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Launch plan identity arguments.
#[derive(Args, Clone)]
pub(crate) struct IdentityArgs {
    /// Project
    #[arg(long)]
    pub project: String,

    /// Domain
    #[arg(long)]
    pub domain: String,

    /// Launch plan name
    #[arg(long)]
    pub name: String,

    /// Launch plan version
    #[arg(long)]
    pub version: String,
}

#[derive(Subcommand)]
pub(crate) enum ScheduleAction {
    /// Create or reactivate a schedule
    Upsert {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Cron expression (5 or 6 fields, or a descriptor such as @daily)
        #[arg(long, conflicts_with_all = ["rate", "unit"])]
        cron: Option<String>,

        /// Fixed rate value
        #[arg(long, requires = "unit")]
        rate: Option<u32>,

        /// Fixed rate unit (minute, hour, day)
        #[arg(long, requires = "rate")]
        unit: Option<String>,

        /// Workflow input that receives the scheduled time
        #[arg(long, default_value = "")]
        kickoff_arg: String,
    },

    /// Deactivate a schedule
    Deactivate {
        #[command(flatten)]
        identity: IdentityArgs,
    },

    /// List active schedules
    List {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum SnapshotAction {
    /// Show the recorded last fire time per schedule
    Show {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Validate the configuration file
    Validate,
}

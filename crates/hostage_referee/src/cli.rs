//! Command-line interface for hostage_referee.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hostage Chess referee - validates and applies actions
#[derive(Parser, Debug)]
#[command(name = "hostage_referee")]
#[command(about = "Rule referee for Hostage Chess games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Apply actions in order and print the reports as JSON
    Play {
        /// Encoded state to start from (defaults to the configured or standard start)
        #[arg(long)]
        state: Option<String>,

        /// Actions in notation: e2e4, e7e8q, N@f3, x0:1
        actions: Vec<String>,
    },

    /// List every legal action of a state
    Legal {
        /// Encoded state (defaults to the configured or standard start)
        #[arg(long)]
        state: Option<String>,
    },

    /// Render the board, pools and status of a state
    Show {
        /// Encoded state (defaults to the configured or standard start)
        #[arg(long)]
        state: Option<String>,
    },
}

//! Command-line interface for tictactoe_duel.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tic-tac-toe duel server
#[derive(Parser, Debug)]
#[command(name = "tictactoe_duel")]
#[command(about = "Two-player tic-tac-toe over WebSockets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

//! Tic-tac-toe duel server - CLI entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use tictactoe_duel::{GameServer, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port, host } => run_server(config, host, port).await,
        Command::Config { config } => print_config(config),
    }
}

/// Run the WebSocket game server
async fn run_server(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config = ServerConfig::load(config.as_deref())?;
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    info!(host = %config.host(), port = config.port(), "Starting tic-tac-toe duel server");
    GameServer::new(config).run().await
}

/// Print the effective configuration
fn print_config(config: Option<PathBuf>) -> Result<()> {
    let config = ServerConfig::load(config.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}

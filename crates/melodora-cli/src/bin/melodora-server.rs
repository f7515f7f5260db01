//! melodora-server - HTTP comparison service
//!
//! Usage:
//!   melodora-server                          # Uses config.toml if present
//!   melodora-server --config <path>          # Uses custom config
//!   melodora-server --bind 0.0.0.0:8000      # Overrides [server].bind

use anyhow::{Context, Result};
use clap::Parser;
use melodora_api::AppState;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "melodora-server")]
#[command(about = "Serve the Melodora comparison API", long_about = None)]
struct Args {
    /// Path to configuration file (TOML). If not provided, uses config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    melodora_cli::init_logger(if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    let config = melodora_cli::load_config(args.config.as_deref())?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    log::info!(
        "Connecting to PostgreSQL at {}:{}/{}",
        config.postgresql.host,
        config.postgresql.port,
        config.postgresql.database
    );
    let comparator = melodora_core::build_comparator(&config)
        .await
        .context("Failed to initialise comparison service")?;

    let state = AppState::new(comparator, config.server.history_limit);
    melodora_api::serve(&bind, state)
        .await
        .with_context(|| format!("Server on {} stopped", bind))?;

    Ok(())
}

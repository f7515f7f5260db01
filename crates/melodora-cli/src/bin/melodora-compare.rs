//! melodora-compare - run one comparison from the command line
//!
//! Usage:
//!   melodora-compare <user_uid> <source_url>
//!   melodora-compare --config <path> <user_uid> <source_url>

use anyhow::Result;
use clap::Parser;
use melodora_cli::output::{print_error, print_json};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "melodora-compare")]
#[command(about = "Compare audio at a URL against the song catalog", long_about = None)]
struct Args {
    /// Path to configuration file (TOML). If not provided, uses config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User the comparison is recorded for
    user_uid: String,

    /// URL of the audio to compare
    source_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    melodora_cli::init_logger(if args.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    });

    let config = melodora_cli::load_config(args.config.as_deref())?;
    let comparator = melodora_core::build_comparator(&config).await?;

    match comparator.compare(&args.user_uid, &args.source_url).await {
        Ok(result) => {
            print_json(&result);
            Ok(())
        }
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

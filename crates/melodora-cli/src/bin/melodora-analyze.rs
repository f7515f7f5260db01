//! melodora-analyze - extract features from a local audio file
//!
//! Usage: melodora-analyze [--config <path>] <audio_file>

use anyhow::Result;
use clap::Parser;
use melodora_cli::output::{print_json, AnalysisSummary};
use melodora_core::{FeatureExtractor, SpectralExtractor};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "melodora-analyze")]
#[command(about = "Print tempo, key and embedding summary for an audio file", long_about = None)]
struct Args {
    /// Path to configuration file (TOML). Only [analysis] is used
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input audio file
    input: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    melodora_cli::init_logger(if args.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    });

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let config = melodora_cli::load_config(args.config.as_deref())?;
    let extractor = SpectralExtractor::new(config.analysis)?;
    let features = extractor.analyze(&args.input)?;

    print_json(&AnalysisSummary::new(
        &args.input.display().to_string(),
        &features,
    ));

    Ok(())
}

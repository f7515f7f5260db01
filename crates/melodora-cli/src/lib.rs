//! Shared helpers for the Melodora command-line tools

pub mod output;

use melodora_core::MelodoraConfig;
use std::path::Path;

/// Initialize env_logger at `level`, still overridable through `RUST_LOG`
pub fn init_logger(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Load the given config file, or `config.toml` if present, else defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<MelodoraConfig> {
    match path {
        Some(path) => MelodoraConfig::load(path),
        None => MelodoraConfig::load_or_default(Path::new("config.toml")),
    }
}

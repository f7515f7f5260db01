//! Service configuration for Melodora
//!
//! TOML file describing the HTTP listener, the PostgreSQL table store,
//! how source audio is downloaded, and the analysis parameters.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::AnalysisConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MelodoraConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub postgresql: PostgresqlConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_history_limit() -> i64 {
    100
}

/// PostgreSQL backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostgresqlConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for PostgresqlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    5432
}
fn default_database() -> String {
    "melodora".to_string()
}
fn default_user() -> String {
    "melodora_user".to_string()
}
fn default_password() -> String {
    "melodora_pass".to_string()
}
fn default_max_connections() -> u32 {
    10
}

/// How source audio is acquired
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Fetch the URL directly over HTTP
    Http,
    /// Run an external downloader such as yt-dlp
    Command,
}

/// Download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_mode")]
    pub mode: DownloadMode,
    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Program run in command mode
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments; `{url}` and `{output}` are substituted
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            timeout_s: default_timeout_s(),
            max_bytes: default_max_bytes(),
            program: default_program(),
            args: default_args(),
        }
    }
}

fn default_mode() -> DownloadMode {
    DownloadMode::Http
}
fn default_timeout_s() -> u64 {
    60
}
fn default_max_bytes() -> u64 {
    100 * 1024 * 1024
}
fn default_program() -> String {
    "yt-dlp".to_string()
}
fn default_args() -> Vec<String> {
    [
        "--no-playlist",
        "--extract-audio",
        "--audio-format",
        "wav",
        "--no-simulate",
        "--print",
        "title",
        "--output",
        "{output}",
        "{url}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl MelodoraConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: MelodoraConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Get PostgreSQL connection string
    pub fn connection_string(&self) -> String {
        let pg = &self.postgresql;
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            pg.user, pg.password, pg.host, pg.port, pg.database
        )
    }
}

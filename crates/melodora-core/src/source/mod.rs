//! Audio acquisition
//!
//! An [`AudioSource`] turns a URL into an [`AudioAsset`]: a local file inside
//! a temporary directory that is removed with the asset.

mod asset;
mod command;
mod http;

pub use asset::AudioAsset;
pub use command::CommandAudioSource;
pub use http::HttpAudioSource;

use crate::service_config::{DownloadConfig, DownloadMode};
use anyhow::Result;
use async_trait::async_trait;
use crc::{Crc, CRC_32_ISO_HDLC};
use std::sync::Arc;
use std::time::Duration;

const URL_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Downloads source audio for analysis
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Fetch `url` into a fresh scoped asset
    async fn fetch(&self, url: &str) -> Result<AudioAsset>;
}

/// Stable identifier for a source URL (CRC-32, lowercase hex)
pub fn source_id(url: &str) -> String {
    format!("{:08x}", URL_CRC.checksum(url.as_bytes()))
}

/// Build the configured source
pub fn from_config(config: &DownloadConfig) -> Result<Arc<dyn AudioSource>> {
    let timeout = Duration::from_secs(config.timeout_s);
    match config.mode {
        DownloadMode::Http => Ok(Arc::new(HttpAudioSource::new(timeout, config.max_bytes)?)),
        DownloadMode::Command => Ok(Arc::new(CommandAudioSource::new(
            config.program.clone(),
            config.args.clone(),
            timeout,
        ))),
    }
}

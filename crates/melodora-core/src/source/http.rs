//! Direct HTTP download of an audio file

use super::{source_id, AudioAsset, AudioSource};
use crate::audio::AudioFormat;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Fetches the URL itself and saves the response body
pub struct HttpAudioSource {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpAudioSource {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("melodora/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl AudioSource for HttpAudioSource {
    async fn fetch(&self, url: &str) -> Result<AudioAsset> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid source URL: {}", url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Unsupported URL scheme: {}", parsed.scheme());
        }

        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()
            .with_context(|| format!("Download of {} was refused", url))?;

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                anyhow::bail!("Source is {} bytes, limit is {}", len, self.max_bytes);
            }
        }

        let headers = response.headers().clone();
        let id = source_id(url);
        let ext = pick_extension(&parsed, &headers);
        let title = pick_title(&parsed, &headers);

        let dir = AudioAsset::scratch_dir()?;
        let path = dir.path().join(format!("{}.{}", id, ext));
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Download interrupted")?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                anyhow::bail!("Source exceeds {} byte limit", self.max_bytes);
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if written == 0 {
            anyhow::bail!("Source {} returned an empty body", url);
        }

        log::info!("Downloaded {} bytes from {} as \"{}\"", written, url, title);

        Ok(AudioAsset::new(dir, path, title, id))
    }
}

/// Extension from the URL path, else the Content-Type
fn pick_extension(url: &Url, headers: &HeaderMap) -> &'static str {
    let from_path = AudioFormat::from_path(Path::new(url.path()));
    if let Some(ext) = from_path.extension() {
        return ext;
    }

    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|mime| AudioFormat::from_mime(mime).extension())
        .unwrap_or("bin")
}

/// Title from Content-Disposition, else the last path segment, else the host
fn pick_title(url: &Url, headers: &HeaderMap) -> String {
    if let Some(name) = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(disposition_filename)
    {
        return file_stem(&name);
    }

    if let Some(segment) = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
    {
        return file_stem(&percent_decode(segment));
    }

    url.host_str().unwrap_or("unknown").to_string()
}

/// `filename*=UTF-8''...` (RFC 6266) wins over a plain `filename=`
fn disposition_filename(value: &str) -> Option<String> {
    let params = disposition_params(value);

    let extended = params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("filename*"))
        .and_then(|(_, v)| v.splitn(3, '\'').nth(2))
        .map(percent_decode);
    let plain = params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("filename"))
        .map(|(_, v)| v.clone());

    extended.or(plain).filter(|name| !name.is_empty())
}

/// Split `key=value` parameters, keeping `;` inside quoted values
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;

    for c in value.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .iter()
        .filter_map(|part| part.split_once('='))
        .map(|(key, v)| (key.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn percent_decode(text: &str) -> String {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string()
}

//! Audio acquisition through an external downloader such as yt-dlp

use super::{source_id, AudioAsset, AudioSource};
use crate::audio::AudioFormat;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Runs a configured program that writes one audio file into a scratch directory
///
/// Argument placeholders:
/// - `{url}`: the source URL
/// - `{output}`: yt-dlp output template `<dir>/<source_id>.%(ext)s`
/// - `{dir}`: the scratch directory
///
/// The first non-empty line on stdout becomes the title.
pub struct CommandAudioSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAudioSource {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn expand_args(&self, url: &str, dir: &Path, id: &str) -> Vec<String> {
        let output = dir.join(format!("{}.%(ext)s", id));
        let output = output.to_string_lossy();
        let dir = dir.to_string_lossy();
        let values = [("{url}", url), ("{output}", &*output), ("{dir}", &*dir)];
        self.args
            .iter()
            .map(|arg| substitute(arg, &values))
            .collect()
    }
}

/// Expand placeholders in one left-to-right pass; substituted text is never rescanned
fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while !rest.is_empty() {
        match values.iter().find(|(key, _)| rest.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    out.push(c);
                }
                rest = chars.as_str();
            }
        }
    }
    out
}

#[async_trait]
impl AudioSource for CommandAudioSource {
    async fn fetch(&self, url: &str) -> Result<AudioAsset> {
        let id = source_id(url);
        let dir = AudioAsset::scratch_dir()?;
        let args = self.expand_args(url, dir.path(), &id);

        log::debug!("Running {} {:?}", self.program, args);

        let mut command = Command::new(&self.program);
        command.args(&args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| anyhow::anyhow!("{} timed out after {:?}", self.program, self.timeout))?
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        let path = find_produced_file(dir.path())?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let title = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| id.clone());

        log::info!("Acquired \"{}\" from {} via {}", title, url, self.program);

        Ok(AudioAsset::new(dir, path, title, id))
    }
}

/// The audio file the downloader left behind
fn find_produced_file(dir: &Path) -> Result<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let audio: Vec<&PathBuf> = files
        .iter()
        .filter(|p| AudioFormat::from_path(p) != AudioFormat::Unknown)
        .collect();

    match (audio.as_slice(), files.as_slice()) {
        ([one], _) => Ok((*one).clone()),
        ([], [one]) => Ok(one.clone()),
        ([], []) => anyhow::bail!("Downloader produced no file"),
        _ => anyhow::bail!("Downloader produced {} files, expected one", files.len()),
    }
}

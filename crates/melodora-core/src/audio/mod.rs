//! Audio decoding and resampling
//!
//! Supports WAV, MP3, FLAC, OGG and the containers Symphonia can probe
//! (MP4/M4A, MKV/WebM, AAC) using pure Rust decoders.

mod container;
mod decoder;
mod resample;

pub use container::decode_with_symphonia;
pub use decoder::{decode_audio, AudioData};
pub use resample::resample_to_target;

use std::path::Path;

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,

    // Handled by Symphonia
    Mp4,
    Mkv,
    Aac,

    Unknown,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("wav") | Some("wave") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            Some("flac") => AudioFormat::Flac,
            Some("ogg") | Some("oga") => AudioFormat::Ogg,
            Some("mp4") | Some("m4a") | Some("m4v") | Some("mov") => AudioFormat::Mp4,
            Some("mkv") | Some("mka") | Some("webm") => AudioFormat::Mkv,
            Some("aac") => AudioFormat::Aac,
            _ => AudioFormat::Unknown,
        }
    }

    /// File extension used when saving a download of this format
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            AudioFormat::Wav => Some("wav"),
            AudioFormat::Mp3 => Some("mp3"),
            AudioFormat::Flac => Some("flac"),
            AudioFormat::Ogg => Some("ogg"),
            AudioFormat::Mp4 => Some("m4a"),
            AudioFormat::Mkv => Some("webm"),
            AudioFormat::Aac => Some("aac"),
            AudioFormat::Unknown => None,
        }
    }

    /// Detect format from a MIME type such as `audio/mpeg`
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => AudioFormat::Wav,
            "audio/mpeg" | "audio/mp3" => AudioFormat::Mp3,
            "audio/flac" | "audio/x-flac" => AudioFormat::Flac,
            "audio/ogg" | "application/ogg" | "audio/vorbis" => AudioFormat::Ogg,
            "audio/mp4" | "audio/x-m4a" | "video/mp4" => AudioFormat::Mp4,
            "audio/webm" | "video/webm" | "audio/x-matroska" | "video/x-matroska" => AudioFormat::Mkv,
            "audio/aac" | "audio/aacp" => AudioFormat::Aac,
            _ => AudioFormat::Unknown,
        }
    }
}

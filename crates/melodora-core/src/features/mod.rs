//! Audio feature extraction
//!
//! Turns a local audio file into the three values a comparison needs: a
//! 512-value embedding, a tempo estimate and a key estimate.

mod embedding;
mod key;
mod tempo;

pub use embedding::{compute_embedding, EMBEDDING_BANDS};
pub use key::{estimate_key, KEY_NAMES};
pub use tempo::estimate_bpm;

use crate::audio;
use crate::config::AnalysisConfig;
use crate::transform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output of the feature extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Tempo in beats per minute, 0.0 when no pulse was found
    pub bpm: f64,
    /// Key name such as `"C major"` or `"F# minor"`
    pub key: String,
    /// Raw embedding values; length is checked by the caller
    pub embedding: Vec<f32>,
}

/// Produces features for a decoded audio asset
///
/// Implementations are CPU-bound and called from a blocking thread.
pub trait FeatureExtractor: Send + Sync {
    fn analyze(&self, path: &Path) -> Result<AudioFeatures>;
}

/// Spectrogram-based extractor
#[derive(Debug, Clone, Default)]
pub struct SpectralExtractor {
    config: AnalysisConfig,
}

impl SpectralExtractor {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze mono samples already at the configured sample rate
    pub fn analyze_samples(&self, samples: &[f32]) -> Result<AudioFeatures> {
        let spectrogram = transform::compute_transform(samples, &self.config)?;

        // Log compression shared by every feature
        let log_spec: Vec<Vec<f32>> = spectrogram
            .magnitudes
            .iter()
            .map(|frame| frame.iter().map(|&m| m.ln_1p()).collect())
            .collect();

        let embedding = compute_embedding(&log_spec);
        let bpm = estimate_bpm(&log_spec, &self.config);
        let key = estimate_key(&spectrogram, &self.config);

        log::debug!(
            "Analyzed {} frames: bpm={:.1}, key={}",
            spectrogram.num_frames,
            bpm,
            key
        );

        Ok(AudioFeatures { bpm, key, embedding })
    }
}

impl FeatureExtractor for SpectralExtractor {
    fn analyze(&self, path: &Path) -> Result<AudioFeatures> {
        let start = std::time::Instant::now();

        let mut audio_data = audio::decode_audio(path, self.config.sample_rate)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        audio_data.truncate(self.config.max_duration_s);

        let features = self.analyze_samples(&audio_data.samples)?;

        log::info!(
            "Extracted features from {} ({} ms of audio) in {:.2}s",
            path.display(),
            audio_data.duration_ms,
            start.elapsed().as_secs_f64()
        );

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn write_tone(path: &Path, freq: f32, seconds: f32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..(44100.0 * seconds) as usize {
            let v = (2.0 * PI * freq * i as f32 / 44100.0).sin() * 0.6;
            writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_analyze_tone_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a4.wav");
        write_tone(&path, 440.0, 3.0);

        let extractor = SpectralExtractor::default();
        let features = extractor.analyze(&path).unwrap();

        assert_eq!(features.embedding.len(), melodora_embed::EMBEDDING_DIM);
        assert!(features.embedding.iter().all(|v| v.is_finite()));
        let norm: f32 = features.embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(features.key.starts_with("A "), "key was {}", features.key);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e4.wav");
        write_tone(&path, 329.63, 2.0);

        let extractor = SpectralExtractor::default();
        let a = extractor.analyze(&path).unwrap();
        let b = extractor.analyze(&path).unwrap();
        assert_eq!(a.embedding, b.embedding);
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = AnalysisConfig {
            fft_size: 1000,
            ..Default::default()
        };
        assert!(SpectralExtractor::new(config).is_err());
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, b"not audio").unwrap();
        assert!(SpectralExtractor::default().analyze(&path).is_err());
    }
}

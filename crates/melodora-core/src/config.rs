//! Configuration parameters for audio analysis

use serde::{Deserialize, Serialize};

/// Feature extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Audio processing
    pub sample_rate: u32,
    pub max_duration_s: f64,

    // Spectral transform (log-frequency)
    pub fft_size: usize,
    pub hop_size: usize,
    pub min_freq: f32,
    pub bands_per_octave: u32,
    pub octaves: u32,

    // Tempo search range
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            max_duration_s: 120.0,

            fft_size: 4096,
            hop_size: 512,
            min_freq: 32.703, // C1
            bands_per_octave: 36,
            octaves: 7,

            min_bpm: 60.0,
            max_bpm: 200.0,
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sample_rate == 0 {
            anyhow::bail!("Sample rate must be > 0");
        }
        if self.max_duration_s <= 0.0 {
            anyhow::bail!("max_duration_s must be > 0");
        }
        if self.fft_size < 16 || !self.fft_size.is_power_of_two() {
            anyhow::bail!("fft_size must be a power of two >= 16");
        }
        if self.hop_size == 0 || self.hop_size > self.fft_size {
            anyhow::bail!("hop_size must be in 1..=fft_size");
        }
        if self.bands_per_octave == 0 || self.bands_per_octave % 12 != 0 {
            anyhow::bail!("bands_per_octave must be a positive multiple of 12");
        }
        if self.octaves == 0 {
            anyhow::bail!("octaves must be > 0");
        }
        if self.max_freq() >= self.sample_rate as f32 / 2.0 {
            anyhow::bail!("Highest analysed band must stay below Nyquist");
        }
        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            anyhow::bail!("min_bpm must be > 0 and < max_bpm");
        }
        Ok(())
    }

    /// Upper edge of the top band
    pub fn max_freq(&self) -> f32 {
        self.min_freq * 2f32.powi(self.octaves as i32)
    }

    /// Total number of log-frequency bins
    pub fn num_bins(&self) -> usize {
        (self.bands_per_octave * self.octaves) as usize
    }

    /// Spectrogram frames per second
    pub fn frame_rate(&self) -> f64 {
        self.sample_rate as f64 / self.hop_size as f64
    }
}

//! Log-frequency spectral transform
//!
//! FFT magnitudes folded onto a constant-Q style grid of
//! `bands_per_octave` bins per octave, starting at `min_freq`.

use crate::config::AnalysisConfig;
use anyhow::Result;
use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Spectrogram representation
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Magnitude values [time_frame][frequency_bin]
    pub magnitudes: Vec<Vec<f32>>,
    /// Number of time frames
    pub num_frames: usize,
    /// Number of frequency bins
    pub num_bins: usize,
}

/// Which FFT bins feed one log-frequency bin
#[derive(Debug, Clone, Copy)]
struct BinMap {
    start: usize,
    end: usize,
    /// Fractional FFT bin of the centre frequency, used when `start == end`
    centre: f32,
}

/// Compute log-frequency magnitude spectrogram
pub fn compute_transform(samples: &[f32], config: &AnalysisConfig) -> Result<Spectrogram> {
    let hop_size = config.hop_size;
    let fft_size = config.fft_size;
    let num_bins = config.num_bins();

    if samples.len() < fft_size {
        anyhow::bail!(
            "Audio too short for analysis: {} samples, need at least {}",
            samples.len(),
            fft_size
        );
    }

    let num_frames = (samples.len() - fft_size) / hop_size + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let window = create_hann_window(fft_size);
    let bin_map = build_bin_map(config);

    // Frames are independent, transform them in parallel
    let magnitudes: Vec<Vec<f32>> = (0..num_frames)
        .into_par_iter()
        .map(|frame_idx| {
            let start = frame_idx * hop_size;

            let mut frame: Vec<Complex<f32>> = samples[start..start + fft_size]
                .iter()
                .zip(window.iter())
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect();

            fft.process(&mut frame);

            map_to_log_bins(&frame, &bin_map)
        })
        .collect();

    Ok(Spectrogram {
        magnitudes,
        num_frames,
        num_bins,
    })
}

/// Create Hann window
fn create_hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let x = i as f32 / (size - 1) as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}

/// Precompute FFT bin ranges for each log-frequency bin
fn build_bin_map(config: &AnalysisConfig) -> Vec<BinMap> {
    let hz_per_bin = config.sample_rate as f32 / config.fft_size as f32;
    let bpo = config.bands_per_octave as f32;
    let nyquist_bin = config.fft_size / 2;

    (0..config.num_bins())
        .map(|bin_idx| {
            let centre = config.min_freq * 2f32.powf(bin_idx as f32 / bpo);
            let lower = centre * 2f32.powf(-0.5 / bpo);
            let upper = centre * 2f32.powf(0.5 / bpo);

            let start = ((lower / hz_per_bin).ceil() as usize).min(nyquist_bin);
            let end = ((upper / hz_per_bin).ceil() as usize).min(nyquist_bin);

            BinMap {
                start,
                end,
                centre: centre / hz_per_bin,
            }
        })
        .collect()
}

/// Fold one FFT frame onto the log-frequency grid
fn map_to_log_bins(fft_output: &[Complex<f32>], bin_map: &[BinMap]) -> Vec<f32> {
    bin_map
        .iter()
        .map(|map| {
            if map.end > map.start {
                // Mean power over the band, back to magnitude
                let power: f32 = fft_output[map.start..map.end]
                    .iter()
                    .map(|c| c.norm_sqr())
                    .sum();
                (power / (map.end - map.start) as f32).sqrt()
            } else {
                // Band narrower than one FFT bin: interpolate the magnitude
                let lo = map.centre.floor() as usize;
                let hi = (lo + 1).min(fft_output.len() / 2);
                let frac = map.centre - lo as f32;
                fft_output[lo].norm() * (1.0 - frac) + fft_output[hi].norm() * frac
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, seconds: f32, config: &AnalysisConfig) -> Vec<f32> {
        let n = (config.sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / config.sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_hann_window() {
        let window = create_hann_window(513);
        assert_eq!(window.len(), 513);
        assert!(window[0].abs() < 0.001);
        assert!((window[256] - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_bin_map_covers_grid() {
        let config = AnalysisConfig::default();
        let map = build_bin_map(&config);
        assert_eq!(map.len(), 252);
        // High bands span several FFT bins, low bands none
        assert!(map[251].end > map[251].start);
        assert_eq!(map[0].end, map[0].start);
    }

    #[test]
    fn test_frame_count() {
        let config = AnalysisConfig::default();
        let samples = vec![0.0; config.fft_size + 10 * config.hop_size];
        let spec = compute_transform(&samples, &config).unwrap();
        assert_eq!(spec.num_frames, 11);
        assert_eq!(spec.magnitudes.len(), 11);
        assert_eq!(spec.magnitudes[0].len(), spec.num_bins);
    }

    #[test]
    fn test_sine_peaks_at_its_band() {
        let config = AnalysisConfig::default();
        let samples = sine(440.0, 1.0, &config);
        let spec = compute_transform(&samples, &config).unwrap();

        let frame = &spec.magnitudes[spec.num_frames / 2];
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        // A4 is 3 octaves + 9 semitones above C1
        let expected = 3 * 36 + 9 * 3;
        assert!((peak as i64 - expected as i64).abs() <= 1, "peak bin {}", peak);
    }

    #[test]
    fn test_too_short() {
        let config = AnalysisConfig::default();
        assert!(compute_transform(&[0.0; 100], &config).is_err());
    }
}

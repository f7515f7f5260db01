//! Key estimation by chroma profile matching

use crate::config::AnalysisConfig;
use crate::transform::Spectrogram;

/// Pitch class names, index 0 is C
pub const KEY_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Krumhansl-Kessler major key profile
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Estimate the musical key, e.g. `"C major"` or `"F# minor"`
///
/// Returns `"unknown"` when the spectrogram carries no energy.
pub fn estimate_key(spectrogram: &Spectrogram, config: &AnalysisConfig) -> String {
    let chroma = chroma_vector(spectrogram, config);
    if chroma.iter().all(|&v| v <= 0.0) {
        return "unknown".to_string();
    }

    let mut best = (f64::NEG_INFINITY, 0usize, "major");
    for tonic in 0..12 {
        for (mode, profile) in [("major", &MAJOR_PROFILE), ("minor", &MINOR_PROFILE)] {
            let rotated: [f64; 12] = std::array::from_fn(|pc| profile[(pc + 12 - tonic) % 12]);
            let score = pearson(&chroma, &rotated);
            if score > best.0 {
                best = (score, tonic, mode);
            }
        }
    }

    log::trace!("Key score {:.3} for {} {}", best.0, KEY_NAMES[best.1], best.2);
    format!("{} {}", KEY_NAMES[best.1], best.2)
}

/// Fold magnitudes into 12 pitch classes
///
/// Bin 0 sits on `min_freq` (C1 by default); every semitone covers
/// `bands_per_octave / 12` bins centred on the semitone's first bin.
fn chroma_vector(spectrogram: &Spectrogram, config: &AnalysisConfig) -> [f64; 12] {
    let bins_per_semitone = (config.bands_per_octave as usize / 12).max(1);
    let half = bins_per_semitone / 2;
    let mut chroma = [0.0f64; 12];

    for frame in &spectrogram.magnitudes {
        for (bin, &mag) in frame.iter().enumerate() {
            let semitone = (bin + half) / bins_per_semitone;
            chroma[semitone % 12] += mag as f64;
        }
    }
    chroma
}

fn pearson(a: &[f64; 12], b: &[f64; 12]) -> f64 {
    let mean_a = a.iter().sum::<f64>() / 12.0;
    let mean_b = b.iter().sum::<f64>() / 12.0;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 {
        cov / denom
    } else {
        0.0
    }
}

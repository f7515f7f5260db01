//! Spectral statistics embedding
//!
//! The log-frequency spectrogram is pooled into [`EMBEDDING_BANDS`] bands and
//! summarised over time by four statistics per band: mean, standard
//! deviation, mean positive flux and maximum. The concatenation is
//! L2-normalised so that cosine similarity compares shape only.

use melodora_embed::EMBEDDING_DIM;

/// Number of pooled frequency bands
pub const EMBEDDING_BANDS: usize = EMBEDDING_DIM / 4;

/// Compute the embedding from a log-magnitude spectrogram
///
/// Always returns [`EMBEDDING_DIM`] finite values; an empty or silent
/// spectrogram yields all zeros.
pub fn compute_embedding(log_spec: &[Vec<f32>]) -> Vec<f32> {
    let num_frames = log_spec.len();
    let mut embedding = vec![0.0f32; EMBEDDING_DIM];

    if num_frames == 0 {
        return embedding;
    }

    let pooled: Vec<Vec<f32>> = log_spec.iter().map(|frame| pool_bands(frame)).collect();

    for band in 0..EMBEDDING_BANDS {
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut flux = 0.0f64;
        let mut max = 0.0f32;

        for (t, frame) in pooled.iter().enumerate() {
            let v = frame[band];
            sum += v as f64;
            sum_sq += (v as f64) * (v as f64);
            max = max.max(v);
            if t > 0 {
                flux += (v - pooled[t - 1][band]).max(0.0) as f64;
            }
        }

        let n = num_frames as f64;
        let mean = sum / n;
        let variance = (sum_sq / n - mean * mean).max(0.0);
        let mean_flux = if num_frames > 1 { flux / (n - 1.0) } else { 0.0 };

        embedding[band] = mean as f32;
        embedding[EMBEDDING_BANDS + band] = variance.sqrt() as f32;
        embedding[2 * EMBEDDING_BANDS + band] = mean_flux as f32;
        embedding[3 * EMBEDDING_BANDS + band] = max;
    }

    normalize(&mut embedding);
    embedding
}

/// Average adjacent log-frequency bins into the pooled bands
fn pool_bands(frame: &[f32]) -> Vec<f32> {
    let num_bins = frame.len();
    (0..EMBEDDING_BANDS)
        .map(|band| {
            let start = band * num_bins / EMBEDDING_BANDS;
            let end = ((band + 1) * num_bins / EMBEDDING_BANDS).max(start + 1).min(num_bins);
            if start >= end {
                return 0.0;
            }
            frame[start..end].iter().sum::<f32>() / (end - start) as f32
        })
        .collect()
}

fn normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for v in values.iter_mut() {
            *v = (*v as f64 / norm) as f32;
        }
    }
}

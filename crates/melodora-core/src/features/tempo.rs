//! Tempo estimation from onset autocorrelation

use crate::config::AnalysisConfig;

/// Tempo the lag weighting is centred on
const PREFERRED_BPM: f64 = 120.0;

/// Estimate tempo in BPM from a log-magnitude spectrogram
///
/// Builds a spectral-flux onset envelope, autocorrelates it over the lags
/// covering `min_bpm..=max_bpm`, weights lags towards [`PREFERRED_BPM`] to
/// damp octave errors and refines the winning lag by parabolic
/// interpolation. Returns 0.0 when the envelope carries no pulse.
pub fn estimate_bpm(log_spec: &[Vec<f32>], config: &AnalysisConfig) -> f64 {
    let envelope = onset_envelope(log_spec);
    let frame_rate = config.frame_rate();

    let min_lag = ((60.0 * frame_rate / config.max_bpm).floor() as usize).max(1);
    let max_lag = (60.0 * frame_rate / config.min_bpm).ceil() as usize;

    if envelope.len() <= max_lag + 1 {
        return 0.0;
    }

    let acf = autocorrelation(&envelope, max_lag + 1);
    if acf[0] <= 0.0 {
        return 0.0;
    }

    let weighted = |lag: usize| -> f64 {
        let bpm = 60.0 * frame_rate / lag as f64;
        let octaves = (bpm / PREFERRED_BPM).log2();
        acf[lag] * (-0.5 * octaves * octaves).exp()
    };

    let best_lag = match (min_lag..=max_lag).max_by(|&a, &b| {
        weighted(a)
            .partial_cmp(&weighted(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    }) {
        Some(lag) => lag,
        None => return 0.0,
    };

    if acf[best_lag] <= 0.0 {
        return 0.0;
    }

    let refined = refine_peak(&acf, best_lag);
    let bpm = 60.0 * frame_rate / refined;

    log::trace!("Tempo lag {} (refined {:.2}) -> {:.2} BPM", best_lag, refined, bpm);

    bpm.clamp(config.min_bpm, config.max_bpm)
}

/// Half-wave rectified spectral flux, mean removed
fn onset_envelope(log_spec: &[Vec<f32>]) -> Vec<f64> {
    if log_spec.len() < 2 {
        return Vec::new();
    }

    let mut envelope: Vec<f64> = log_spec
        .windows(2)
        .map(|pair| {
            pair[1]
                .iter()
                .zip(pair[0].iter())
                .map(|(&cur, &prev)| (cur - prev).max(0.0) as f64)
                .sum()
        })
        .collect();

    let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
    for v in envelope.iter_mut() {
        *v -= mean;
    }
    envelope
}

/// Autocorrelation for lags `0..max_lag`
fn autocorrelation(signal: &[f64], max_lag: usize) -> Vec<f64> {
    (0..max_lag.min(signal.len()))
        .map(|lag| {
            signal[lag..]
                .iter()
                .zip(signal.iter())
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Parabolic interpolation of a peak at `idx`
fn refine_peak(values: &[f64], idx: usize) -> f64 {
    if idx == 0 || idx + 1 >= values.len() {
        return idx as f64;
    }
    let (left, centre, right) = (values[idx - 1], values[idx], values[idx + 1]);
    let denom = left - 2.0 * centre + right;
    if denom.abs() < f64::EPSILON {
        return idx as f64;
    }
    let offset = 0.5 * (left - right) / denom;
    idx as f64 + offset.clamp(-0.5, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::compute_transform;

    fn click_track(bpm: f64, seconds: f64, config: &AnalysisConfig) -> Vec<f32> {
        let sr = config.sample_rate as f64;
        let n = (sr * seconds) as usize;
        let period = sr * 60.0 / bpm;
        let mut samples = vec![0.0f32; n];

        let mut beat = 0.0;
        while (beat as usize) < n {
            let start = beat as usize;
            // Short decaying noise-like burst
            for i in 0..200.min(n - start) {
                let decay = (-(i as f32) / 40.0).exp();
                let sign = if (i * 7919) % 3 == 0 { -1.0 } else { 1.0 };
                samples[start + i] = sign * decay;
            }
            beat += period;
        }
        samples
    }

    fn log_spec(samples: &[f32], config: &AnalysisConfig) -> Vec<Vec<f32>> {
        compute_transform(samples, config)
            .unwrap()
            .magnitudes
            .into_iter()
            .map(|frame| frame.into_iter().map(|m| m.ln_1p()).collect())
            .collect()
    }

    #[test]
    fn test_click_track_120() {
        let config = AnalysisConfig::default();
        let spec = log_spec(&click_track(120.0, 12.0, &config), &config);
        let bpm = estimate_bpm(&spec, &config);
        assert!((bpm - 120.0).abs() <= 3.0, "estimated {}", bpm);
    }

    #[test]
    fn test_click_track_90() {
        let config = AnalysisConfig::default();
        let spec = log_spec(&click_track(90.0, 12.0, &config), &config);
        let bpm = estimate_bpm(&spec, &config);
        assert!((bpm - 90.0).abs() <= 3.0, "estimated {}", bpm);
    }

    #[test]
    fn test_silence_has_no_tempo() {
        let config = AnalysisConfig::default();
        let spec = vec![vec![0.0f32; config.num_bins()]; 400];
        assert_eq!(estimate_bpm(&spec, &config), 0.0);
    }

    #[test]
    fn test_refine_peak_midway() {
        let values = [0.0, 0.0, 1.0, 1.0, 0.0];
        assert!((refine_peak(&values, 2) - 2.5).abs() < 1e-9);
    }
}

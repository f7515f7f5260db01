//! Audio decoding for multiple formats

use super::{resample_to_target, AudioFormat};
use anyhow::{Context, Result};
use std::path::Path;

/// Decoded audio data
#[derive(Debug, Clone)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u32,
}

impl AudioData {
    /// Wrap interleaved samples, deriving the duration
    pub fn interleaved(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            duration_ms: duration_ms(samples.len(), sample_rate, channels),
            samples,
            sample_rate,
            channels,
        }
    }

    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        let mut mono = Vec::with_capacity(self.samples.len() / self.channels as usize);
        for chunk in self.samples.chunks(self.channels as usize) {
            let avg: f32 = chunk.iter().sum::<f32>() / chunk.len() as f32;
            mono.push(avg);
        }
        mono
    }

    /// Keep at most `max_seconds` of audio
    pub fn truncate(&mut self, max_seconds: f64) {
        let max_frames = (max_seconds * self.sample_rate as f64) as usize;
        let max_samples = max_frames * self.channels.max(1) as usize;
        if self.samples.len() > max_samples {
            self.samples.truncate(max_samples);
            self.duration_ms = duration_ms(self.samples.len(), self.sample_rate, self.channels);
        }
    }
}

/// Decode audio file to mono at the target sample rate
pub fn decode_audio(path: &Path, target_sample_rate: u32) -> Result<AudioData> {
    if !path.exists() {
        anyhow::bail!("Audio file not found: {}", path.display());
    }

    let format = AudioFormat::from_path(path);

    let mut audio_data = match format {
        AudioFormat::Wav => decode_wav(path)?,
        AudioFormat::Mp3 => decode_mp3(path)?,
        AudioFormat::Flac => decode_flac(path)?,
        AudioFormat::Ogg => decode_ogg(path)?,
        _ => super::decode_with_symphonia(path)?,
    };

    if audio_data.samples.is_empty() || audio_data.sample_rate == 0 {
        anyhow::bail!("No audio samples decoded from {}", path.display());
    }

    // Resample if needed
    if audio_data.sample_rate != target_sample_rate {
        let mono = audio_data.to_mono();
        let resampled = resample_to_target(&mono, audio_data.sample_rate, target_sample_rate)?;
        audio_data.samples = resampled;
        audio_data.sample_rate = target_sample_rate;
        audio_data.channels = 1;
    } else if audio_data.channels > 1 {
        // Convert to mono even if sample rate matches
        audio_data.samples = audio_data.to_mono();
        audio_data.channels = 1;
    }

    Ok(audio_data)
}

fn duration_ms(num_samples: usize, sample_rate: u32, channels: u16) -> u32 {
    let frames_per_second = sample_rate as f64 * channels.max(1) as f64;
    if frames_per_second == 0.0 {
        return 0;
    }
    (num_samples as f64 / frames_per_second * 1000.0) as u32
}

/// Decode WAV file
fn decode_wav(path: &Path) -> Result<AudioData> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels;

    // Read samples and convert to f32
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(AudioData::interleaved(samples, sample_rate, channels))
}

/// Decode MP3 file
fn decode_mp3(path: &Path) -> Result<AudioData> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read MP3 file: {}", path.display()))?;

    let mut decoder = minimp3::Decoder::new(&data[..]);
    let mut samples = Vec::new();
    let mut sample_rate = 0;
    let mut channels = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = frame.sample_rate as u32;
                    channels = frame.channels as u16;
                }
                // Convert i16 to f32
                samples.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => anyhow::bail!("MP3 decode error: {}", e),
        }
    }

    Ok(AudioData::interleaved(samples, sample_rate, channels))
}

/// Decode FLAC file
fn decode_flac(path: &Path) -> Result<AudioData> {
    let mut reader = claxon::FlacReader::open(path)
        .with_context(|| format!("Failed to open FLAC file: {}", path.display()))?;

    let info = reader.streaminfo();
    let sample_rate = info.sample_rate;
    let channels = info.channels as u16;

    let max_val = (1i64 << (info.bits_per_sample - 1)) as f32;
    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / max_val))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AudioData::interleaved(samples, sample_rate, channels))
}

/// Decode OGG Vorbis file
fn decode_ogg(path: &Path) -> Result<AudioData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open OGG file: {}", path.display()))?;

    let mut reader = lewton::inside_ogg::OggStreamReader::new(file)?;

    let sample_rate = reader.ident_hdr.audio_sample_rate;
    let channels = reader.ident_hdr.audio_channels as u16;

    let mut samples = Vec::new();

    while let Some(packet) = reader.read_dec_packet_itl()? {
        samples.extend(packet.iter().map(|&s| s as f32 / 32768.0));
    }

    Ok(AudioData::interleaved(samples, sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, seconds: f32) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = (sample_rate as f32 * seconds) as usize;
        for i in 0..frames {
            let v = ((i as f32 * 440.0 * 2.0 * std::f32::consts::PI / sample_rate as f32).sin()
                * 0.5
                * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(v).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_wav_stereo_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 22050, 2, 1.0);

        let audio = decode_audio(&path, 22050).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.samples.len(), 22050);
        assert!((audio.duration_ms as i64 - 1000).abs() <= 1);
    }

    #[test]
    fn test_decode_wav_resamples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 44100, 1, 0.5);

        let audio = decode_audio(&path, 22050).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert!((audio.samples.len() as i64 - 11025).abs() <= 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(decode_audio(Path::new("/nonexistent/file.wav"), 22050).is_err());
    }

    #[test]
    fn test_truncate() {
        let mut audio = AudioData {
            samples: vec![0.0; 22050 * 10],
            sample_rate: 22050,
            channels: 1,
            duration_ms: 10_000,
        };
        audio.truncate(2.0);
        assert_eq!(audio.samples.len(), 44100);
        assert_eq!(audio.duration_ms, 2000);
    }
}

//! JSON output formatting

use melodora_core::{AudioFeatures, CompareError};
use serde::Serialize;
use serde_json::json;

/// Number of leading embedding values shown by `melodora-analyze`
const PREVIEW_LEN: usize = 8;

/// What `melodora-analyze` reports for one file
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub path: String,
    pub bpm: f64,
    pub key: String,
    pub embedding_dim: usize,
    pub embedding_norm: f64,
    pub embedding_preview: Vec<f32>,
}

impl AnalysisSummary {
    pub fn new(path: &str, features: &AudioFeatures) -> Self {
        let norm = features
            .embedding
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt();

        Self {
            path: path.to_string(),
            bpm: (features.bpm * 10.0).round() / 10.0,
            key: features.key.clone(),
            embedding_dim: features.embedding.len(),
            embedding_norm: norm,
            embedding_preview: features.embedding.iter().take(PREVIEW_LEN).copied().collect(),
        }
    }
}

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing result: {}", e),
    }
}

/// Print a failed comparison the way the HTTP API reports it
pub fn print_error(err: &CompareError) {
    eprintln!("{}", json!({ "detail": err.to_string() }));
}

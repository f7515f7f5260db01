//! Decoding of stored embedding representations
//!
//! The table store may hand back an embedding column as a native float list,
//! pgvector text (`[1,2,3]`), JSON text (same shape, possibly wrapped in a
//! JSON string), or a Postgres array literal (`{1,2,3}`).

use crate::format::{EmbeddingError, EmbeddingVector, EMBEDDING_DIM, PADDED_DIM};

/// Parse a textual embedding into raw values
pub fn parse_values(text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let trimmed = text.trim();

    if trimmed.starts_with('"') {
        // JSON string holding the encoded array (fallback writes into jsonb)
        let inner: String = serde_json::from_str(trimmed)
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;
        if inner.trim_start().starts_with('"') {
            return Err(EmbeddingError::Parse("nested string encoding".to_string()));
        }
        return parse_values(&inner);
    }

    if trimmed.starts_with('[') {
        let values: Vec<f64> = serde_json::from_str(trimmed)
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;
        return Ok(values.into_iter().map(|v| v as f32).collect());
    }

    if let Some(body) = trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        return body
            .split(',')
            .map(|item| {
                item.trim()
                    .parse::<f32>()
                    .map_err(|e| EmbeddingError::Parse(format!("{:?}: {}", item.trim(), e)))
            })
            .collect();
    }

    Err(EmbeddingError::Parse(format!(
        "unrecognised embedding encoding starting with {:?}",
        trimmed.chars().next()
    )))
}

/// Build a comparable embedding from stored values
///
/// Padded rows are truncated back to [`EMBEDDING_DIM`]; any other length is
/// rejected.
pub fn from_stored_values(mut values: Vec<f32>) -> Result<EmbeddingVector, EmbeddingError> {
    if values.len() == PADDED_DIM {
        values.truncate(EMBEDDING_DIM);
    }
    EmbeddingVector::new(values)
}

/// Parse and validate a textual stored embedding
pub fn decode_stored(text: &str) -> Result<EmbeddingVector, EmbeddingError> {
    from_stored_values(parse_values(text)?)
}

//! Textual encoding of embeddings

/// JSON array text, used when the store rejects the native list
///
/// Non-finite values have no JSON form and are written as `null`, which
/// the reader rejects.
pub fn to_json_text(values: &[f32]) -> serde_json::Result<String> {
    serde_json::to_string(values)
}

use serde::{Deserialize, Serialize};

/// A row of the `songs` catalog
///
/// The embedding column is read back as text so that `REAL[]`, pgvector,
/// `JSONB` and `TEXT` columns all come through the same path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongRow {
    pub id: Option<i64>,
    pub title: String,
    pub url: String,
    pub embedding_text: Option<String>,
}

/// Input structure for inserting a comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComparison {
    pub user_uid: String,
    pub uploaded_url: String,
    pub uploaded_bpm: i32,
    pub uploaded_key: String,
    pub uploaded_embedding: Vec<f32>,
    pub matched_song_id: i64,
    pub matched_url: String,
    pub matched_title: String,
    pub from_title: String,
    pub similarity: f64,
}

/// A previously stored comparison, as listed in a user's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub id: i64,
    pub uploaded_url: String,
    pub from_title: String,
    pub matched_title: String,
    pub matched_url: String,
    pub similarity: f64,
    pub uploaded_bpm: Option<i32>,
    pub uploaded_key: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

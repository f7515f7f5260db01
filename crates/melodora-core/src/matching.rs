//! Nearest-match search over the song catalog
//!
//! Scores a query embedding against every candidate by cosine similarity
//! and keeps the best one. Candidates whose stored embedding cannot be
//! decoded are skipped rather than failing the whole search.

use melodora_embed::{decode_stored, from_stored_values, EmbeddingError, EmbeddingVector};
use serde::{Deserialize, Serialize};


/// Embedding as it was stored alongside a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredEmbedding {
    /// Native float list
    Values(Vec<f32>),
    /// Textual encoding (JSON, pgvector or array literal)
    Text(String),
    /// Column was NULL
    Missing,
}

impl StoredEmbedding {
    /// Decode into a comparable embedding
    pub fn decode(&self) -> Result<EmbeddingVector, EmbeddingError> {
        match self {
            StoredEmbedding::Values(values) => from_stored_values(values.clone()),
            StoredEmbedding::Text(text) => decode_stored(text),
            StoredEmbedding::Missing => Err(EmbeddingError::Parse("embedding is missing".to_string())),
        }
    }
}

impl From<Option<String>> for StoredEmbedding {
    fn from(text: Option<String>) -> Self {
        match text {
            Some(text) => StoredEmbedding::Text(text),
            None => StoredEmbedding::Missing,
        }
    }
}

/// A catalog song eligible to be matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSong {
    /// Primary key; absent when the stored row could not be coerced
    pub id: Option<i64>,
    pub title: String,
    pub url: String,
    pub embedding: StoredEmbedding,
}

/// Result of a nearest-match search
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome<'a> {
    /// Best candidate, `None` when nothing could be scored
    pub best: Option<&'a CandidateSong>,
    /// Cosine similarity of `best`, 0.0 when there is none
    pub similarity: f64,
}

/// Find the candidate most similar to `query`
///
/// Ties keep the earliest candidate in input order. An empty or entirely
/// malformed collection yields `best: None` with similarity 0.0.
pub fn find_best_match<'a>(
    query: &EmbeddingVector,
    candidates: &'a [CandidateSong],
) -> MatchOutcome<'a> {
    let mut best: Option<&'a CandidateSong> = None;
    let mut best_similarity = 0.0;
    let mut skipped = 0usize;

    for candidate in candidates {
        let embedding = match candidate.embedding.decode() {
            Ok(embedding) => embedding,
            Err(e) => {
                log::debug!(
                    "Skipping candidate {:?} ({}): {}",
                    candidate.id,
                    candidate.title,
                    e
                );
                skipped += 1;
                continue;
            }
        };

        let similarity = query.cosine_similarity(&embedding);
        if best.is_none() || similarity > best_similarity {
            best = Some(candidate);
            best_similarity = similarity;
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {} of {} candidates", skipped, candidates.len());
    }

    MatchOutcome {
        best,
        similarity: if best.is_some() { best_similarity } else { 0.0 },
    }
}

//! Comparison orchestration
//!
//! One request runs `Validating → Extracting → Matching → Persisting` and
//! ends in either a stored comparison or a classified [`CompareError`].
//! The downloaded asset is released on every path.

use std::sync::Arc;

use melodora_embed::EmbeddingVector;
use serde::{Deserialize, Serialize};

use crate::error::CompareError;
use crate::features::{AudioFeatures, FeatureExtractor};
use crate::matching::find_best_match;
use crate::source::{AudioAsset, AudioSource};
use crate::store::{CatalogStore, ComparisonRecord, ComparisonSummary, EmbeddingEncoding};


/// Upper bound on rows returned by [`Comparator::history`]
pub const MAX_HISTORY: i64 = 100;

/// Public outcome of a successful comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub comparison_id: i64,
    pub from_title: String,
    pub matched_title: String,
    pub matched_url: String,
    pub similarity: f64,
    pub uploaded_bpm: i32,
    pub uploaded_key: String,
}

/// Runs comparisons against injected collaborators
pub struct Comparator {
    source: Arc<dyn AudioSource>,
    extractor: Arc<dyn FeatureExtractor>,
    store: Arc<dyn CatalogStore>,
}

impl Comparator {
    pub fn new(
        source: Arc<dyn AudioSource>,
        extractor: Arc<dyn FeatureExtractor>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            source,
            extractor,
            store,
        }
    }

    /// Compare the audio at `source_url` against the catalog and record it
    pub async fn compare(
        &self,
        user_uid: &str,
        source_url: &str,
    ) -> Result<ComparisonResult, CompareError> {
        log::debug!("[{}] validating", user_uid);
        // Blank input is rejected, anything else is fetched and stored verbatim
        if user_uid.trim().is_empty() || source_url.trim().is_empty() {
            return Err(CompareError::InvalidRequest(
                "user_uid and source_url are required".to_string(),
            ));
        }

        log::debug!("[{}] extracting {}", user_uid, source_url);
        let asset = self
            .source
            .fetch(source_url)
            .await
            .map_err(|e| CompareError::processing("audio acquisition failed", e))?;
        log::debug!(
            "[{}] fetched {} as {} in {}",
            user_uid,
            asset.source_id(),
            asset.path().display(),
            asset
                .dir_path()
                .map(|d| d.display().to_string())
                .unwrap_or_default()
        );

        let result = self.process(user_uid, source_url, &asset).await;

        asset.cleanup();

        match &result {
            Ok(done) => log::info!(
                "[{}] matched \"{}\" to \"{}\" ({:.4}), comparison {}",
                user_uid,
                done.from_title,
                done.matched_title,
                done.similarity,
                done.comparison_id
            ),
            Err(e) => log::warn!("[{}] comparison failed: {}", user_uid, e),
        }

        result
    }

    /// Everything after acquisition; the caller owns the asset
    async fn process(
        &self,
        user_uid: &str,
        source_url: &str,
        asset: &AudioAsset,
    ) -> Result<ComparisonResult, CompareError> {
        let features = self.analyze(asset).await?;

        let embedding = EmbeddingVector::new(features.embedding)
            .map_err(|e| CompareError::Processing(e.to_string()))?;

        if !features.bpm.is_finite() {
            return Err(CompareError::Processing(format!(
                "tempo estimate is not finite: {}",
                features.bpm
            )));
        }
        let uploaded_bpm = features.bpm.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32;

        log::debug!("[{}] matching", user_uid);
        let songs = self
            .store
            .list_songs()
            .await
            .map_err(|e| CompareError::processing("failed to load songs", e))?;
        if songs.is_empty() {
            return Err(CompareError::NoData("no songs found".to_string()));
        }

        let outcome = find_best_match(&embedding, &songs);
        let best = outcome
            .best
            .ok_or_else(|| CompareError::NoMatch("no match found".to_string()))?;
        let matched_song_id = best
            .id
            .ok_or_else(|| CompareError::Processing("matched song missing ID".to_string()))?;

        let padded = embedding.padded();
        padded
            .validate()
            .map_err(|_| CompareError::Processing("invalid embedding format".to_string()))?;

        let record = ComparisonRecord {
            user_uid: user_uid.to_string(),
            uploaded_url: source_url.to_string(),
            uploaded_bpm,
            uploaded_key: features.key,
            uploaded_embedding: padded,
            matched_song_id,
            matched_url: best.url.clone(),
            matched_title: best.title.clone(),
            from_title: asset.title().to_string(),
            similarity: outcome.similarity,
        };

        log::debug!("[{}] persisting match with song {}", user_uid, matched_song_id);
        let comparison_id = self.persist(&record).await?;

        Ok(ComparisonResult {
            comparison_id,
            from_title: record.from_title,
            matched_title: record.matched_title,
            matched_url: record.matched_url,
            similarity: record.similarity,
            uploaded_bpm: record.uploaded_bpm,
            uploaded_key: record.uploaded_key,
        })
    }

    /// Run the extractor on a blocking thread
    async fn analyze(&self, asset: &AudioAsset) -> Result<AudioFeatures, CompareError> {
        let extractor = Arc::clone(&self.extractor);
        let path = asset.path().to_path_buf();

        tokio::task::spawn_blocking(move || extractor.analyze(&path))
            .await
            .map_err(|e| CompareError::Processing(format!("analysis task failed: {}", e)))?
            .map_err(|e| CompareError::processing("audio analysis failed", e))
    }

    /// Native write, then one JSON-text retry if it raised
    async fn persist(&self, record: &ComparisonRecord) -> Result<i64, CompareError> {
        let inserted = match self
            .store
            .insert_comparison(record, EmbeddingEncoding::Native)
            .await
        {
            Ok(inserted) => inserted,
            Err(e) => {
                log::warn!("Native embedding insert failed, retrying as JSON text: {:#}", e);
                self.store
                    .insert_comparison(record, EmbeddingEncoding::JsonText)
                    .await
                    .map_err(|e| {
                        CompareError::Persistence(format!("failed to save comparison: {:#}", e))
                    })?
            }
        };

        inserted.ok_or_else(|| CompareError::Persistence("failed to save comparison".to_string()))
    }

    /// A user's stored comparisons, newest first
    ///
    /// `limit` defaults to [`MAX_HISTORY`] and is clamped to `1..=MAX_HISTORY`.
    pub async fn history(
        &self,
        user_uid: &str,
        limit: Option<i64>,
    ) -> Result<Vec<ComparisonSummary>, CompareError> {
        if user_uid.trim().is_empty() {
            return Err(CompareError::InvalidRequest("user_uid is required".to_string()));
        }

        let limit = limit.unwrap_or(MAX_HISTORY).clamp(1, MAX_HISTORY);

        self.store
            .list_comparisons(user_uid, limit)
            .await
            .map_err(|e| CompareError::processing("failed to load history", e))
    }
}

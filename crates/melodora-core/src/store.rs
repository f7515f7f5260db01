//! Persistence gateway for the song catalog and the comparison log
//!
//! Provides the trait the orchestrator talks to, and its PostgreSQL
//! implementation on top of `melodora-db`.

use anyhow::Result;
use async_trait::async_trait;
use melodora_embed::PaddedEmbedding;
use serde::Serialize;

use crate::matching::{CandidateSong, StoredEmbedding};
use crate::service_config::PostgresqlConfig;

pub use melodora_db::ComparisonRow as ComparisonSummary;

/// How the uploaded embedding is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingEncoding {
    /// Native float list
    Native,
    /// JSON array text
    JsonText,
}

/// One comparison, ready to be written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    pub user_uid: String,
    pub uploaded_url: String,
    pub uploaded_bpm: i32,
    pub uploaded_key: String,
    pub uploaded_embedding: PaddedEmbedding,
    pub matched_song_id: i64,
    pub matched_url: String,
    pub matched_title: String,
    pub from_title: String,
    pub similarity: f64,
}

impl From<&ComparisonRecord> for melodora_db::NewComparison {
    fn from(record: &ComparisonRecord) -> Self {
        Self {
            user_uid: record.user_uid.clone(),
            uploaded_url: record.uploaded_url.clone(),
            uploaded_bpm: record.uploaded_bpm,
            uploaded_key: record.uploaded_key.clone(),
            uploaded_embedding: record.uploaded_embedding.as_slice().to_vec(),
            matched_song_id: record.matched_song_id,
            matched_url: record.matched_url.clone(),
            matched_title: record.matched_title.clone(),
            from_title: record.from_title.clone(),
            similarity: record.similarity,
        }
    }
}

/// Table store holding `songs` and `comparisons`
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every catalog song, in a stable order
    async fn list_songs(&self) -> Result<Vec<CandidateSong>>;

    /// Write a comparison; returns the generated id, `None` if no row came back
    async fn insert_comparison(
        &self,
        record: &ComparisonRecord,
        encoding: EmbeddingEncoding,
    ) -> Result<Option<i64>>;

    /// A user's comparisons, newest first
    async fn list_comparisons(&self, user_uid: &str, limit: i64) -> Result<Vec<ComparisonSummary>>;
}

/// PostgreSQL implementation of [`CatalogStore`]
pub struct PostgresqlGateway {
    pool: deadpool_postgres::Pool,
}

impl PostgresqlGateway {
    /// Create the pool and check the database is reachable
    pub async fn new(config: &PostgresqlConfig) -> Result<Self> {
        let pool = melodora_db::create_pool(
            &config.host,
            config.port,
            &config.database,
            &config.user,
            &config.password,
            config.max_connections,
        )?;

        melodora_db::test_connection(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CatalogStore for PostgresqlGateway {
    async fn list_songs(&self) -> Result<Vec<CandidateSong>> {
        let rows = melodora_db::get_all_songs(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| CandidateSong {
                id: row.id,
                title: row.title,
                url: row.url,
                embedding: StoredEmbedding::from(row.embedding_text),
            })
            .collect())
    }

    async fn insert_comparison(
        &self,
        record: &ComparisonRecord,
        encoding: EmbeddingEncoding,
    ) -> Result<Option<i64>> {
        let new_comparison = melodora_db::NewComparison::from(record);
        match encoding {
            EmbeddingEncoding::Native => {
                melodora_db::insert_comparison(&self.pool, &new_comparison).await
            }
            EmbeddingEncoding::JsonText => {
                melodora_db::insert_comparison_json(&self.pool, &new_comparison).await
            }
        }
    }

    async fn list_comparisons(&self, user_uid: &str, limit: i64) -> Result<Vec<ComparisonSummary>> {
        melodora_db::get_comparisons_by_user(&self.pool, user_uid, limit).await
    }
}

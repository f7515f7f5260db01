//! Melodora Core - audio similarity comparison
//!
//! Downloads a piece of audio, reduces it to an embedding plus tempo and
//! key estimates, finds the closest song in the catalog and records the
//! comparison.

pub mod audio;
pub mod compare;
pub mod config;
pub mod error;
pub mod features;
pub mod matching;
pub mod service_config;
pub mod source;
pub mod store;
pub mod transform;

pub use compare::{Comparator, ComparisonResult, MAX_HISTORY};
pub use config::AnalysisConfig;
pub use error::{CompareError, StatusClass};
pub use features::{AudioFeatures, FeatureExtractor, SpectralExtractor};
pub use matching::{find_best_match, CandidateSong, MatchOutcome, StoredEmbedding};
pub use service_config::MelodoraConfig;
pub use source::{AudioAsset, AudioSource};
pub use store::{
    CatalogStore, ComparisonRecord, ComparisonSummary, EmbeddingEncoding, PostgresqlGateway,
};

use std::sync::Arc;

/// Wire up a comparator from configuration
///
/// Connects to PostgreSQL, so this fails when the database is unreachable.
pub async fn build_comparator(config: &MelodoraConfig) -> anyhow::Result<Comparator> {
    let source = source::from_config(&config.download)?;
    let extractor = Arc::new(SpectralExtractor::new(config.analysis.clone())?);
    let store = Arc::new(PostgresqlGateway::new(&config.postgresql).await?);

    Ok(Comparator::new(source, extractor, store))
}

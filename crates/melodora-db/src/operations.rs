use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use serde_json::Value;

use crate::models::*;

const COMPARISON_COLUMNS: &str = "user_uid, uploaded_url, uploaded_bpm, uploaded_key, \
     uploaded_embedding, matched_song_id, matched_url, matched_title, from_title, similarity";

/// Get every song in the catalog, in primary key order
pub async fn get_all_songs(pool: &Pool) -> Result<Vec<SongRow>> {
    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT id::BIGINT, COALESCE(title, ''), COALESCE(url, ''), embedding::TEXT
             FROM songs
             ORDER BY id",
            &[],
        )
        .await
        .context("Failed to get songs")?;

    log::debug!("Loaded {} songs", rows.len());

    Ok(rows
        .iter()
        .map(|r| SongRow {
            id: r.get(0),
            title: r.get(1),
            url: r.get(2),
            embedding_text: r.get(3),
        })
        .collect())
}

/// Insert a comparison with the embedding bound as a native `REAL[]`
///
/// Returns the generated id, or `None` if the statement produced no row.
pub async fn insert_comparison(pool: &Pool, comparison: &NewComparison) -> Result<Option<i64>> {
    let client = pool.get().await?;

    let row = client
        .query_opt(
            &format!(
                "INSERT INTO comparisons ({COMPARISON_COLUMNS})
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                 RETURNING id::BIGINT"
            ),
            &[
                &comparison.user_uid,
                &comparison.uploaded_url,
                &comparison.uploaded_bpm,
                &comparison.uploaded_key,
                &comparison.uploaded_embedding,
                &comparison.matched_song_id,
                &comparison.matched_url,
                &comparison.matched_title,
                &comparison.from_title,
                &comparison.similarity,
            ],
        )
        .await
        .context("Failed to insert comparison")?;

    Ok(row.map(|r| r.get(0)))
}

/// Insert a comparison with the embedding encoded as JSON text
///
/// The record goes through `jsonb_populate_record`, so each column is
/// filled by its own input function. This lets the embedding land in
/// pgvector, `JSONB` or `TEXT` columns that reject a bound `REAL[]`.
pub async fn insert_comparison_json(pool: &Pool, comparison: &NewComparison) -> Result<Option<i64>> {
    let client = pool.get().await?;

    let record = comparison_json(comparison)?;

    let row = client
        .query_opt(
            &format!(
                "INSERT INTO comparisons ({COMPARISON_COLUMNS})
                 SELECT {COMPARISON_COLUMNS}
                 FROM jsonb_populate_record(NULL::comparisons, $1::jsonb)
                 RETURNING id::BIGINT"
            ),
            &[&record],
        )
        .await
        .context("Failed to insert comparison with JSON embedding")?;

    Ok(row.map(|r| r.get(0)))
}

/// Get a user's comparisons, newest first
pub async fn get_comparisons_by_user(
    pool: &Pool,
    user_uid: &str,
    limit: i64,
) -> Result<Vec<ComparisonRow>> {
    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT id::BIGINT, uploaded_url, COALESCE(from_title, ''),
                    COALESCE(matched_title, ''), COALESCE(matched_url, ''),
                    COALESCE(similarity, 0)::FLOAT8, uploaded_bpm::INTEGER,
                    uploaded_key, created_at
             FROM comparisons
             WHERE user_uid = $1
             ORDER BY created_at DESC
             LIMIT $2",
            &[&user_uid, &limit],
        )
        .await
        .context("Failed to get comparisons")?;

    log::debug!("Loaded {} comparisons for user {}", rows.len(), user_uid);

    Ok(rows
        .iter()
        .map(|r| ComparisonRow {
            id: r.get(0),
            uploaded_url: r.get(1),
            from_title: r.get(2),
            matched_title: r.get(3),
            matched_url: r.get(4),
            similarity: r.get(5),
            uploaded_bpm: r.get(6),
            uploaded_key: r.get(7),
            created_at: r.get(8),
        })
        .collect())
}

/// Build the JSON record for the fallback insert
fn comparison_json(comparison: &NewComparison) -> Result<Value> {
    let mut record =
        serde_json::to_value(comparison).context("Failed to serialize comparison")?;

    let embedding_text = melodora_embed::to_json_text(&comparison.uploaded_embedding)
        .context("Failed to serialize embedding")?;

    if let Value::Object(ref mut fields) = record {
        fields.insert("uploaded_embedding".to_string(), Value::String(embedding_text));
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison() -> NewComparison {
        NewComparison {
            user_uid: "u1".to_string(),
            uploaded_url: "https://example.com/a.wav".to_string(),
            uploaded_bpm: 120,
            uploaded_key: "C major".to_string(),
            uploaded_embedding: vec![0.5, 0.25, 0.0],
            matched_song_id: 7,
            matched_url: "https://example.com/7".to_string(),
            matched_title: "Seven".to_string(),
            from_title: "a".to_string(),
            similarity: 0.75,
        }
    }

    #[test]
    fn test_comparison_json_encodes_embedding_as_text() {
        let record = comparison_json(&comparison()).unwrap();

        assert_eq!(record["uploaded_embedding"], Value::String("[0.5,0.25,0.0]".to_string()));
        assert_eq!(record["matched_song_id"], 7);
        assert_eq!(record["user_uid"], "u1");
        assert_eq!(record["similarity"], 0.75);
    }

    #[test]
    fn test_comparison_json_round_trips_embedding() {
        let record = comparison_json(&comparison()).unwrap();
        let text = record["uploaded_embedding"].as_str().unwrap();
        let values = melodora_embed::parse_values(text).unwrap();
        assert_eq!(values, vec![0.5, 0.25, 0.0]);
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL with the reference schema loaded
    async fn test_insert_and_list_comparison() {
        let pool = crate::create_pool("localhost", 5432, "melodora", "melodora_user", "melodora_pass", 2)
            .unwrap();
        let client = pool.get().await.unwrap();
        client.batch_execute(crate::SCHEMA_SQL).await.unwrap();
        let song_id: i64 = client
            .query_one(
                "INSERT INTO songs (title, url, embedding) VALUES ('Seven', 'u', '{1,2}') RETURNING id",
                &[],
            )
            .await
            .unwrap()
            .get(0);
        drop(client);

        let mut new = comparison();
        new.user_uid = "integration-user".to_string();
        new.matched_song_id = song_id;

        let id = insert_comparison(&pool, &new).await.unwrap();
        assert!(id.is_some());

        let rows = get_comparisons_by_user(&pool, "integration-user", 10).await.unwrap();
        assert_eq!(rows[0].matched_title, "Seven");
    }
}

//! Router tests against in-memory collaborators

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use melodora_api::{build_router, AppState};
use melodora_core::{
    AudioAsset, AudioFeatures, AudioSource, CandidateSong, CatalogStore, Comparator,
    ComparisonRecord, ComparisonSummary, EmbeddingEncoding, FeatureExtractor, StoredEmbedding,
};
use melodora_embed::EMBEDDING_DIM;
use serde_json::{json, Value};
use tower::ServiceExt;

struct StubSource;

#[async_trait]
impl AudioSource for StubSource {
    async fn fetch(&self, _url: &str) -> Result<AudioAsset> {
        let dir = AudioAsset::scratch_dir()?;
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"RIFF")?;
        Ok(AudioAsset::new(dir, path, "Clip".to_string(), "0000".to_string()))
    }
}

struct StubExtractor;

impl FeatureExtractor for StubExtractor {
    fn analyze(&self, _path: &std::path::Path) -> Result<AudioFeatures> {
        Ok(AudioFeatures {
            bpm: 99.5,
            key: "E minor".to_string(),
            embedding: unit(4),
        })
    }
}

#[derive(Default)]
struct StubStore {
    songs: Vec<CandidateSong>,
    history: Vec<ComparisonSummary>,
    limits: Mutex<Vec<i64>>,
}

#[async_trait]
impl CatalogStore for StubStore {
    async fn list_songs(&self) -> Result<Vec<CandidateSong>> {
        Ok(self.songs.clone())
    }

    async fn insert_comparison(
        &self,
        _record: &ComparisonRecord,
        _encoding: EmbeddingEncoding,
    ) -> Result<Option<i64>> {
        Ok(Some(501))
    }

    async fn list_comparisons(&self, _user_uid: &str, limit: i64) -> Result<Vec<ComparisonSummary>> {
        self.limits.lock().unwrap().push(limit);
        Ok(self.history.clone())
    }
}

fn unit(index: usize) -> Vec<f32> {
    let mut values = vec![0.0; EMBEDDING_DIM];
    values[index] = 1.0;
    values
}

fn app(store: Arc<StubStore>) -> Router {
    let comparator = Comparator::new(Arc::new(StubSource), Arc::new(StubExtractor), store);
    build_router(AppState::new(comparator, 100))
}

fn catalog_store() -> StubStore {
    StubStore {
        songs: vec![CandidateSong {
            id: Some(12),
            title: "Twelve".to_string(),
            url: "https://catalog.example.com/12".to_string(),
            embedding: StoredEmbedding::Values(unit(4)),
        }],
        ..Default::default()
    }
}

async fn post_compare(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/music/compare")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_compare_success() {
    let app = app(Arc::new(catalog_store()));
    let (status, body) = post_compare(
        app,
        json!({ "user_uid": "user-1", "source_url": "https://example.com/clip.wav" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comparison_id"], 501);
    assert_eq!(body["matched_title"], "Twelve");
    assert_eq!(body["matched_url"], "https://catalog.example.com/12");
    assert_eq!(body["from_title"], "Clip");
    assert_eq!(body["uploaded_bpm"], 99);
    assert_eq!(body["uploaded_key"], "E minor");
    assert!((body["similarity"].as_f64().unwrap() - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_compare_accepts_youtube_url_alias() {
    let app = app(Arc::new(catalog_store()));
    let (status, _) = post_compare(
        app,
        json!({ "user_uid": "user-1", "youtube_url": "https://youtube.com/watch?v=x" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_compare_empty_fields_is_400() {
    let app = app(Arc::new(catalog_store()));
    let (status, body) = post_compare(app, json!({ "user_uid": "", "source_url": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "user_uid and source_url are required");
}

#[tokio::test]
async fn test_compare_missing_fields_is_400() {
    let app = app(Arc::new(catalog_store()));
    let (status, body) = post_compare(app, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_compare_empty_catalog_is_404() {
    let app = app(Arc::new(StubStore::default()));
    let (status, body) = post_compare(
        app,
        json!({ "user_uid": "user-1", "source_url": "https://example.com/a.wav" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "no songs found");
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = app(Arc::new(catalog_store()));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/music/compare")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_returns_rows() {
    let store = Arc::new(StubStore {
        history: vec![ComparisonSummary {
            id: 5,
            uploaded_url: "https://example.com/a".to_string(),
            from_title: "A".to_string(),
            matched_title: "Twelve".to_string(),
            matched_url: "https://catalog.example.com/12".to_string(),
            similarity: 0.8,
            uploaded_bpm: Some(120),
            uploaded_key: Some("C major".to_string()),
            created_at: Some(chrono::Utc::now()),
        }],
        ..Default::default()
    });

    let (status, body) = get_json(app(store.clone()), "/music/history/user-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["matched_title"], "Twelve");

    let (status, _) = get_json(app(store.clone()), "/music/history/user-1?limit=5000").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(*store.limits.lock().unwrap(), vec![100, 100]);
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(app(Arc::new(StubStore::default())), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "melodora");
}

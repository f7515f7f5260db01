//! Melodora HTTP API
//!
//! axum router exposing the comparison endpoint, per-user history and a
//! health check.

pub mod error;
pub mod handlers;

pub use error::{ApiError, ApiResult};
pub use handlers::{CompareRequest, HealthResponse};

use axum::{
    routing::{get, post},
    Router,
};
use melodora_core::Comparator;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub comparator: Arc<Comparator>,
    /// History rows returned when the request gives no `limit`
    pub history_limit: i64,
}

impl AppState {
    pub fn new(comparator: Comparator, history_limit: i64) -> Self {
        Self {
            comparator: Arc::new(comparator),
            history_limit,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/music/compare", post(handlers::compare))
        .route("/music/history/:user_uid", get(handlers::history))
        .route("/health", get(handlers::health))
        // The browser front-end calls the API directly
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await
}

//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use melodora_core::{CompareError, StatusClass};
use serde_json::json;
use thiserror::Error;

/// Error returned by a handler, rendered as `{"detail": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Orchestrator failure, status chosen by its class
    #[error(transparent)]
    Compare(#[from] CompareError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Compare(err) => status_for(err.status_class()),
        }
    }
}

/// Map an outcome class to its HTTP status
pub fn status_for(class: StatusClass) -> StatusCode {
    match class {
        StatusClass::ClientError => StatusCode::BAD_REQUEST,
        StatusClass::NotFound => StatusCode::NOT_FOUND,
        StatusClass::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }

        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

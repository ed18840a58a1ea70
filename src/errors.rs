use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to API callers.
///
/// Source and parsing failures never reach this type; they are absorbed by
/// the repository and show up as an empty table instead.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Requested record does not exist.
    NotFound(String),
    /// No customer data could be loaded from any source.
    NoData,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::NoData => write!(f, "No data loaded"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to a 404 with a JSON `{"error": ...}` body.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg.clone())
            }
            AppError::NoData => {
                tracing::warn!("Request served while no customer data is loaded");
                (StatusCode::NOT_FOUND, "No data loaded".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Why a single data source could not produce customer rows.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source file not found: {0}")]
    Missing(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("object store returned status {status} for {object}")]
    Status { status: u16, object: String },
    #[error("invalid object store endpoint: {0}")]
    Endpoint(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Status mapping happens here and nowhere else; handlers only pick variants.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing file, unparsable upload, blank query, malformed JSON body.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The filtered view came back empty for a valid query.
    #[error("No matching data: {0}")]
    NoData(String),

    /// A required column is absent from the active dataset.
    #[error("Schema error: {0}")]
    Schema(String),

    /// No uploaded dataset and the bundled default is missing or unparsable.
    #[error("Dataset unavailable: {0}")]
    DataUnavailable(String),

    /// I/O failure while reading uploaded bytes.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            AppError::NoData(msg) => (StatusCode::NOT_FOUND, "NO_DATA", msg.clone()),
            AppError::Schema(msg) => {
                tracing::error!("Schema error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "SCHEMA_ERROR", msg.clone())
            }
            AppError::DataUnavailable(msg) => {
                tracing::error!("Dataset unavailable: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATA_UNAVAILABLE",
                    msg.clone(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Failed to store the uploaded file".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

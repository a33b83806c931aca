//! Error types for the audit service
//!
//! Provides unified error handling using thiserror. Core operations (cache,
//! geolocation, scoring) never fail; these errors belong to the HTTP surface
//! and to the storage and dataset loaders.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Audit Error Enum ==
/// Unified error type for the audit service.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Requested key, tab or record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The user has not opted in to crowdsourced reporting
    #[error("Reporting disabled: {0}")]
    ReportingDisabled(String),

    /// Durable storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Storage Error Enum ==
/// Failures of the flat key-value store backing the caches.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed store contents: {0}")]
    Serde(#[from] serde_json::Error),
}

// == Geo Error Enum ==
/// Failures while loading the IPv4 range dataset.
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Cannot read geolocation dataset: {0}")]
    Io(#[from] std::io::Error),
}

// == Fetch Error Enum ==
/// Failures while downloading a benchmark bundle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid benchmark URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Benchmark request failed: {0}")]
    Http(#[from] reqwest::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuditError::NotFound(_) => StatusCode::NOT_FOUND,
            AuditError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuditError::ReportingDisabled(_) => StatusCode::FORBIDDEN,
            AuditError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuditError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the audit service.
pub type Result<T> = std::result::Result<T, AuditError>;

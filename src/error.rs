//! Error types for the document store
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ErrorResponse;

// == Store Error Enum ==
/// Unified error type for the store and its HTTP surface.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A write would push used space above the byte budget
    #[error("Capacity exceeded: {requested} bytes requested, {available} bytes available")]
    Capacity { requested: usize, available: usize },

    /// Key absent from the byte store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Active namespace has no document yet
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Record belongs to a different store identity
    #[error("Record owned by {found}, store is bound to {expected}")]
    Ownership { expected: Uuid, found: Uuid },

    /// Append attempted before a save target was declared
    #[error("No save target set before append")]
    NoSaveTarget,

    /// Write attempted before an owner identity was bound
    #[error("Store has no owner identity; bind one before writing")]
    NotBound,

    /// Invalid budget configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Document could not be (de)serialized or has an unknown schema version
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Remote metadata lookup failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A required collaborator is not configured
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::NotFound(_) | StoreError::NamespaceNotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Capacity { .. } => StatusCode::INSUFFICIENT_STORAGE,
            StoreError::Ownership { .. } => StatusCode::CONFLICT,
            StoreError::NoSaveTarget | StoreError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            StoreError::Upstream(_) => StatusCode::BAD_GATEWAY,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::NotBound | StoreError::Config(_) | StoreError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the store.
pub type Result<T> = std::result::Result<T, StoreError>;

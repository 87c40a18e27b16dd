//! Request DTOs for the document store API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::store::{Table, DEFAULT_NAMESPACE};

const MAX_KEY_LENGTH: usize = 256;

/// Request body for appending a record (POST /namespaces/:name/records)
///
/// # Fields
/// - `table`: The table to append into
/// - `key`: The record key (stored lower-cased)
/// - `payload`: Arbitrary JSON payload
#[derive(Debug, Clone, Deserialize)]
pub struct AppendRequest {
    pub table: Table,
    pub key: String,
    pub payload: Value,
}

impl AppendRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for saving a home page section (PUT /home/:section)
#[derive(Debug, Clone, Deserialize)]
pub struct HomeSectionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl HomeSectionRequest {
    pub fn validate(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("Title cannot be empty".to_string());
        }
        None
    }
}

/// Query string of the search endpoint (GET /search/:term)
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    /// Namespace to cache the result in
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Checks a record or path key.
pub fn validate_key(key: &str) -> Option<String> {
    if key.trim().is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}

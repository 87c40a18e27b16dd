//! Response DTOs for the document store API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::store::{Fetched, FetchSource, NamespaceDocument, StoreStats, Table};

/// Response body for namespace creation and reads (PUT/GET /namespaces/:name)
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceResponse {
    /// Lower-cased namespace name
    pub namespace: String,
    pub document: NamespaceDocument,
}

impl NamespaceResponse {
    pub fn new(namespace: impl Into<String>, document: NamespaceDocument) -> Self {
        Self {
            namespace: namespace.into(),
            document,
        }
    }
}

/// Response body for record appends (POST /namespaces/:name/records)
#[derive(Debug, Clone, Serialize)]
pub struct AppendResponse {
    pub namespace: String,
    pub table: Table,
    pub key: String,
    /// False when the namespace has no such table and nothing was written
    pub appended: bool,
    /// Bytes left in the store after the append
    pub remaining_space: usize,
}

impl AppendResponse {
    pub fn new(
        namespace: impl Into<String>,
        table: Table,
        key: impl Into<String>,
        appended: bool,
        remaining_space: usize,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            table,
            // Keys are stored lower-cased
            key: key.into().to_lowercase(),
            appended,
            remaining_space,
        }
    }
}

/// Response body for cached-term probes
/// (GET /namespaces/:name/tables/:table/terms/:term)
#[derive(Debug, Clone, Serialize)]
pub struct CachedTermResponse {
    pub term: String,
    pub table: Table,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl CachedTermResponse {
    pub fn new(term: impl Into<String>, table: Table, payload: Option<Value>) -> Self {
        Self {
            term: term.into(),
            table,
            cached: payload.is_some(),
            payload,
        }
    }
}

/// Response body for the search endpoint (GET /search/:term)
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub term: String,
    pub namespace: String,
    /// Where the payload came from
    pub source: FetchSource,
    /// Whether the payload is held in the store after the call
    pub cached: bool,
    pub payload: Value,
}

impl SearchResponse {
    pub fn new(term: impl Into<String>, namespace: impl Into<String>, fetched: Fetched) -> Self {
        Self {
            term: term.into(),
            namespace: namespace.into(),
            source: fetched.source,
            cached: fetched.cached,
            payload: fetched.payload,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Cache-aside lookups answered from the store
    pub hits: u64,
    /// Cache-aside lookups that went remote
    pub misses: u64,
    /// Records removed to reclaim space
    pub evictions: u64,
    pub remote_fetches: u64,
    pub persist_failures: u64,
    /// Current number of namespace documents
    pub total_entries: usize,
    pub space_used: usize,
    pub budget: usize,
    pub remaining_mib: f64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<StoreStats> for StatsResponse {
    fn from(stats: StoreStats) -> Self {
        let remaining = stats.budget.saturating_sub(stats.space_used);
        Self {
            hit_rate: stats.hit_rate(),
            remaining_mib: remaining as f64 / (1024.0 * 1024.0),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            remote_fetches: stats.remote_fetches,
            persist_failures: stats.persist_failures,
            total_entries: stats.total_entries,
            space_used: stats.space_used,
            budget: stats.budget,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

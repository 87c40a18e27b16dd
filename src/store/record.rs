//! Record Module
//!
//! Defines the timestamped, ownership-tagged unit of data stored in a table.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// == Record ==
/// A single appended entry within a namespace table.
///
/// Records are never mutated after creation; they are only removed whole
/// during eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Lower-cased key the payload is filed under (search term, section name, ...)
    pub key: String,
    /// Arbitrary JSON payload
    pub payload: Value,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Identity of the document store that created the record
    #[serde(rename = "parentID")]
    pub parent_id: Uuid,
}

impl Record {
    // == Constructor ==
    /// Creates a record stamped with the current time.
    ///
    /// # Arguments
    /// * `key` - Key to file the payload under; stored lower-cased
    /// * `payload` - The value to store
    /// * `parent_id` - Identity of the creating document store
    pub fn new(key: &str, payload: Value, parent_id: Uuid) -> Self {
        Self::with_timestamp(key, payload, parent_id, current_timestamp_ms())
    }

    /// Creates a record with an explicit timestamp.
    pub fn with_timestamp(key: &str, payload: Value, parent_id: Uuid, timestamp: u64) -> Self {
        Self {
            key: key.to_lowercase(),
            payload,
            timestamp,
            parent_id,
        }
    }

    // == Key Match ==
    /// Returns true if the record is filed under `term`, ignoring case.
    pub fn matches_key(&self, term: &str) -> bool {
        self.key == term.to_lowercase()
    }

    // == Payload Items ==
    /// Returns the payload as a list of items.
    ///
    /// List payloads yield their elements; any other payload is a single item.
    pub fn items(&self) -> &[Value] {
        match &self.payload {
            Value::Array(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        }
    }

    /// Returns true if the record was created by `identity`.
    pub fn is_owned_by(&self, identity: Uuid) -> bool {
        self.parent_id == identity
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

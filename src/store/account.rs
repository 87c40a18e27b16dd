//! Account Module
//!
//! Typed views over the `authentication` table and per-user table counts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{NamespaceDocument, Table};

// == Auth Record ==
/// Account details stored as an `authentication` payload.
///
/// The password is an opaque, already-hashed string and is never serialized
/// back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub joined: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
}

impl AuthRecord {
    /// Parses an account out of a payload item, if it has the right shape.
    pub fn from_item(item: &Value) -> Option<Self> {
        serde_json::from_value(item.clone()).ok()
    }

    /// First account found in a namespace's `authentication` table.
    pub fn first_in(document: &NamespaceDocument) -> Option<Self> {
        document
            .table(Table::Authentication)?
            .iter()
            .flat_map(|record| record.items())
            .find_map(Self::from_item)
    }
}

/// Lower-cases every `email` field of an authentication payload in place.
pub fn normalize_emails(payload: &mut Value) {
    let items: Vec<&mut Value> = match payload {
        Value::Array(items) => items.iter_mut().collect(),
        other => vec![other],
    };
    for item in items {
        if let Some(Value::String(email)) = item.get_mut("email") {
            *email = email.to_lowercase();
        }
    }
}

// == User Summary ==
/// Account plus record counts for a user namespace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub namespace: String,
    pub account: Option<AuthRecord>,
    pub search_terms: usize,
    pub favourites: usize,
    pub ratings: usize,
    pub watching_list: usize,
    pub key_words: usize,
}

impl UserSummary {
    pub fn from_document(namespace: &str, document: &NamespaceDocument) -> Self {
        let count = |table| document.table(table).map_or(0, <[_]>::len);
        Self {
            namespace: namespace.to_string(),
            account: AuthRecord::first_in(document),
            search_terms: count(Table::SearchTerms),
            favourites: count(Table::Favourites),
            ratings: count(Table::Ratings),
            watching_list: count(Table::WatchingList),
            key_words: count(Table::KeyWords),
        }
    }
}

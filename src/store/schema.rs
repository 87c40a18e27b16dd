//! Namespace Schema Module
//!
//! Fixed table layouts for user namespaces and the shared default namespace.
//! The table set of a document is decided at construction and cannot change
//! afterwards: there is no API to add or drop a table.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::Record;

/// Version tag written into every namespace document.
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the namespace shared by all anonymous callers.
pub const DEFAULT_NAMESPACE: &str = "default";

// == Table ==
/// Closed set of table identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Table {
    SearchTerms,
    Favourites,
    Ratings,
    WatchingList,
    KeyWords,
    Authentication,
    Profile,
    Movies,
    TvShows,
    HomePage,
}

/// Tables of a user namespace.
pub const USER_TABLES: [Table; 9] = [
    Table::SearchTerms,
    Table::Favourites,
    Table::Ratings,
    Table::WatchingList,
    Table::KeyWords,
    Table::Authentication,
    Table::Profile,
    Table::Movies,
    Table::TvShows,
];

/// Tables of the shared default namespace.
pub const DEFAULT_TABLES: [Table; 4] = [
    Table::SearchTerms,
    Table::Movies,
    Table::TvShows,
    Table::HomePage,
];

impl Table {
    pub const ALL: [Table; 10] = [
        Table::SearchTerms,
        Table::Favourites,
        Table::Ratings,
        Table::WatchingList,
        Table::KeyWords,
        Table::Authentication,
        Table::Profile,
        Table::Movies,
        Table::TvShows,
        Table::HomePage,
    ];

    /// Returns the table's name as it appears in stored documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::SearchTerms => "searchTerms",
            Table::Favourites => "favourites",
            Table::Ratings => "ratings",
            Table::WatchingList => "watchingList",
            Table::KeyWords => "keyWords",
            Table::Authentication => "authentication",
            Table::Profile => "profile",
            Table::Movies => "movies",
            Table::TvShows => "tvShows",
            Table::HomePage => "homePage",
        }
    }

    /// Protected tables are never touched by eviction.
    pub fn is_protected(&self) -> bool {
        matches!(self, Table::Authentication | Table::Profile)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = StoreError;

    /// Parses a table name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        Table::ALL
            .into_iter()
            .find(|table| table.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| StoreError::InvalidRequest(format!("Unknown table: {}", s)))
    }
}

// == Namespace Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamespaceKind {
    Default,
    User,
}

impl NamespaceKind {
    /// Picks the kind for a namespace name.
    pub fn for_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(DEFAULT_NAMESPACE) {
            NamespaceKind::Default
        } else {
            NamespaceKind::User
        }
    }

    pub fn tables(&self) -> &'static [Table] {
        match self {
            NamespaceKind::Default => &DEFAULT_TABLES,
            NamespaceKind::User => &USER_TABLES,
        }
    }
}

// == Namespace Document ==
/// One namespace's tables, stored as a single entry in the byte store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDocument {
    pub version: u32,
    pub kind: NamespaceKind,
    pub parent_id: Uuid,
    tables: BTreeMap<Table, Vec<Record>>,
}

impl NamespaceDocument {
    fn empty(kind: NamespaceKind, parent_id: Uuid) -> Self {
        Self {
            version: SCHEMA_VERSION,
            kind,
            parent_id,
            tables: kind.tables().iter().map(|t| (*t, Vec::new())).collect(),
        }
    }

    /// Fails if the document was written under a different schema version.
    pub fn check_version(&self) -> Result<()> {
        if self.version != SCHEMA_VERSION {
            return Err(StoreError::Serialization(format!(
                "Unsupported schema version {} (expected {})",
                self.version, SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    pub fn has_table(&self, table: Table) -> bool {
        self.tables.contains_key(&table)
    }

    /// Records of `table`, or None if the namespace has no such table.
    pub fn table(&self, table: Table) -> Option<&[Record]> {
        self.tables.get(&table).map(Vec::as_slice)
    }

    /// Mutable records of an existing table. Never creates a table.
    pub fn table_mut(&mut self, table: Table) -> Option<&mut Vec<Record>> {
        self.tables.get_mut(&table)
    }

    pub fn table_names(&self) -> Vec<Table> {
        self.tables.keys().copied().collect()
    }

    /// Iterates tables in a stable order.
    pub fn tables(&self) -> impl Iterator<Item = (Table, &[Record])> + '_ {
        self.tables.iter().map(|(t, records)| (*t, records.as_slice()))
    }

    /// Number of records across all tables.
    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

// == Constructors ==
/// Builds an empty user namespace with the nine user tables.
pub fn empty_user_namespace(parent_id: Uuid) -> NamespaceDocument {
    NamespaceDocument::empty(NamespaceKind::User, parent_id)
}

/// Builds an empty shared namespace with the four default tables.
pub fn empty_default_namespace(parent_id: Uuid) -> NamespaceDocument {
    NamespaceDocument::empty(NamespaceKind::Default, parent_id)
}

/// Builds the right empty document for a namespace name.
pub fn empty_namespace_for(name: &str, parent_id: Uuid) -> NamespaceDocument {
    match NamespaceKind::for_name(name) {
        NamespaceKind::Default => empty_default_namespace(parent_id),
        NamespaceKind::User => empty_user_namespace(parent_id),
    }
}

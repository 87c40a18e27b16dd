//! Store Module
//!
//! Byte-budgeted, namespaced in-memory document storage with eviction and
//! cache-aside retrieval.

mod account;
mod budget;
mod documents;
pub mod eviction;
mod fetcher;
mod record;
mod schema;
mod size;
mod stats;


// Re-export public types
pub use account::{AuthRecord, UserSummary};
pub use budget::ByteBudgetStore;
pub use documents::{Clock, DocumentStore};
pub use eviction::EvictionReport;
pub use fetcher::{CacheAsideFetcher, FetchSource, Fetched};
pub use record::{current_timestamp_ms, Record};
pub use schema::{
    empty_default_namespace, empty_namespace_for, empty_user_namespace, NamespaceDocument,
    NamespaceKind, Table, DEFAULT_NAMESPACE, DEFAULT_TABLES, SCHEMA_VERSION, USER_TABLES,
};
pub use size::{estimate_list_size, estimate_size};
pub use stats::StoreStats;

// == Public Constants ==
/// Default byte budget (5 MiB)
pub const DEFAULT_BUDGET_BYTES: usize = 5 * 1024 * 1024;

/// Hard ceiling for any configured budget
pub const MAX_BUDGET_BYTES: usize = 5 * 1024 * 1024;

//! Reelstore - a byte-budgeted, namespaced in-memory document store
//!
//! Stores per-user and shared JSON documents under a global byte budget,
//! evicts oldest records when space runs out, and serves remote metadata
//! lookups cache-aside.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{Result, StoreError};
pub use store::{ByteBudgetStore, CacheAsideFetcher, DocumentStore, Table};
pub use tasks::spawn_capacity_monitor;

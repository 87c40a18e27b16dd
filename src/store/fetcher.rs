//! Cache-Aside Fetcher Module
//!
//! Answers lookups from cached records and only falls through to the remote
//! source on a miss. The remote call happens outside of any store lock.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::{ByteBudgetStore, Record};

// == Fetch Source ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    Cache,
    Remote,
}

// == Fetched ==
/// Payload returned by [`CacheAsideFetcher::fetch_or_cached`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched {
    pub payload: Value,
    pub source: FetchSource,
    /// Whether the payload is held in the store after the call
    pub cached: bool,
}

// == Cache-Aside Fetcher ==
#[derive(Debug, Clone)]
pub struct CacheAsideFetcher {
    store: Arc<ByteBudgetStore>,
}

impl CacheAsideFetcher {
    pub fn new(store: Arc<ByteBudgetStore>) -> Self {
        Self { store }
    }

    /// Returns the payload cached under `cache_key` in `records`, if any.
    ///
    /// Matching ignores case; the first matching record wins.
    pub fn lookup<'a>(cache_key: &str, records: &'a [Record]) -> Option<&'a Value> {
        records
            .iter()
            .find(|record| record.matches_key(cache_key))
            .map(|record| &record.payload)
    }

    // == Fetch Or Cached ==
    /// Serves `cache_key` from `records`, or fetches and persists it.
    ///
    /// * Hit: the cached payload is returned and `remote_fetch` is not called.
    /// * Miss: `remote_fetch` is called exactly once. Its error is returned
    ///   unchanged and nothing is cached. On success `persist` is called; if
    ///   persisting fails the error is logged and the payload is still
    ///   returned with `cached == false`.
    pub async fn fetch_or_cached<F, Fut, P, E>(
        &self,
        cache_key: &str,
        records: &[Record],
        remote_fetch: F,
        persist: P,
    ) -> std::result::Result<Fetched, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
        P: FnOnce(&Value) -> Result<()>,
    {
        if let Some(payload) = Self::lookup(cache_key, records) {
            self.store.update_stats(|s| s.record_hit());
            debug!(cache_key, "Serving from cache");
            return Ok(Fetched {
                payload: payload.clone(),
                source: FetchSource::Cache,
                cached: true,
            });
        }

        self.store.update_stats(|s| s.record_miss());
        info!(cache_key, "Cache miss, fetching from remote");
        let payload = remote_fetch().await?;
        self.store.update_stats(|s| s.record_remote_fetch());

        let cached = match persist(&payload) {
            Ok(()) => true,
            Err(err) => {
                self.store.update_stats(|s| s.record_persist_failure());
                warn!(cache_key, error = %err, "Fetched payload could not be cached");
                false
            }
        };

        Ok(Fetched {
            payload,
            source: FetchSource::Remote,
            cached,
        })
    }
}

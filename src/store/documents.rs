//! Document Store Module
//!
//! Schema-aware layer over [`ByteBudgetStore`]: namespace selection, record
//! append with eviction, and cross-namespace lookups.

use std::future::Future;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::account::normalize_emails;
use crate::store::eviction::{evict, fully_evicted, reclaim_target};
use crate::store::{
    current_timestamp_ms, empty_default_namespace, empty_namespace_for, estimate_size, AuthRecord,
    ByteBudgetStore, CacheAsideFetcher, Fetched, NamespaceDocument, Record, Table, UserSummary,
    DEFAULT_NAMESPACE,
};

/// Source of record timestamps in Unix milliseconds.
pub type Clock = fn() -> u64;

// == Document Store ==
/// A cursor over the namespaced documents of a shared [`ByteBudgetStore`].
///
/// Constructing one generates a fresh identity and binds it as the owner of
/// the underlying store. Clones share that identity but keep their own
/// active namespace and save target, so each request handler can work on a
/// clone without affecting the others.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    store: Arc<ByteBudgetStore>,
    identity: Uuid,
    namespace: String,
    save_target: Option<Table>,
    clock: Clock,
}

impl DocumentStore {
    // == Constructor ==
    /// Creates a document store bound to `store`, pointing at the default
    /// namespace.
    pub fn new(store: Arc<ByteBudgetStore>) -> Self {
        let identity = Uuid::new_v4();
        store.set_owner(identity);
        info!(%identity, "Document store bound");

        Self {
            store,
            identity,
            namespace: DEFAULT_NAMESPACE.to_string(),
            save_target: None,
            clock: current_timestamp_ms,
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn identity(&self) -> Uuid {
        self.identity
    }

    /// The active namespace name, lower-cased.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn byte_store(&self) -> &Arc<ByteBudgetStore> {
        &self.store
    }

    pub fn pending_save_target(&self) -> Option<Table> {
        self.save_target
    }

    // == Namespace Selection ==
    /// Points the store at `name`. Nothing is created or loaded.
    pub fn select_namespace(&mut self, name: &str) {
        self.namespace = name.to_lowercase();
    }

    /// Drops the active pointer and save target, then selects `name`.
    ///
    /// Stored data is untouched.
    pub fn reset(&mut self, name: &str) {
        self.namespace.clear();
        self.save_target = None;
        self.select_namespace(name);
    }

    // == Create Tables ==
    /// Creates the active namespace's document if it does not exist yet.
    ///
    /// The shared default namespace is created alongside any user namespace.
    pub fn create_tables(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(StoreError::InvalidRequest(
                "Namespace name cannot be empty".to_string(),
            ));
        }

        self.create_if_absent(DEFAULT_NAMESPACE, || {
            empty_default_namespace(self.identity)
        })?;
        if self.namespace != DEFAULT_NAMESPACE {
            self.create_if_absent(&self.namespace, || {
                empty_namespace_for(&self.namespace, self.identity)
            })?;
        }
        Ok(())
    }

    fn create_if_absent(
        &self,
        name: &str,
        build: impl FnOnce() -> NamespaceDocument,
    ) -> Result<()> {
        let lock = self.store.key_lock(name);
        let _guard = lock.lock();

        if self.store.contains(name) {
            return Ok(());
        }
        self.store.put(name, &build())?;
        info!(namespace = name, "Namespace created");
        Ok(())
    }

    // == Save Target ==
    /// Declares the table that subsequent appends write into.
    pub fn set_pending_save_target(&mut self, table: Table) {
        self.save_target = Some(table);
    }

    // == Append ==
    /// Appends `payload` under `key` to the pending save target of the active
    /// namespace.
    ///
    /// Returns `Ok(false)` without writing when the namespace has no such
    /// table. If the write would not fit, oldest records are evicted first.
    /// The whole document is written back in one step.
    ///
    /// # Errors
    /// * `NoSaveTarget` if no save target was declared
    /// * `NamespaceNotFound` if the active namespace has no document
    /// * `Capacity` if eviction could not free enough space
    pub fn append(&self, key: &str, payload: Value) -> Result<bool> {
        let target = self.save_target.ok_or(StoreError::NoSaveTarget)?;
        let name = self.namespace.as_str();

        // Lock table entries exist only for namespaces that were created
        if !self.store.contains(name) {
            return Err(StoreError::NamespaceNotFound(name.to_string()));
        }
        let lock = self.store.key_lock(name);
        let _guard = lock.lock();

        let mut document = self.load(name)?;
        if !document.has_table(target) {
            debug!(namespace = name, %target, "Namespace has no such table, skipping append");
            return Ok(false);
        }

        let mut payload = payload;
        if target == Table::Authentication {
            normalize_emails(&mut payload);
        }
        let record = Record::with_timestamp(key, payload, self.identity, (self.clock)());
        let record_size = estimate_size(&record)?;

        let current = self.store.entry_size(name).unwrap_or(0);
        let growth = projected_size(&document, target, record_size)?.saturating_sub(current);
        let remaining = self.store.remaining_space();
        let capacity_error = || StoreError::Capacity {
            requested: growth,
            available: remaining,
        };

        let mut original = None;
        if growth > remaining {
            // Refuse up front if even a full eviction pass could not make room
            let owner = self.store.owner().ok_or(StoreError::NotBound)?;
            let floor = fully_evicted(&document, target, owner);
            let others = self.store.space_used().saturating_sub(current);
            if others + projected_size(&floor, target, record_size)? > self.store.budget() {
                return Err(capacity_error());
            }

            let to_free = reclaim_target(growth, remaining);
            let before = document.clone();
            let report = evict(&self.store, name, &mut document, target, to_free);
            if report.removed > 0 {
                original = Some(before);
                // Settle the accounting for what was evicted before growing
                self.store.put(name, &document)?;
                info!(
                    namespace = name,
                    removed = report.removed,
                    freed = report.freed,
                    "Evicted records to make room"
                );
            }
        }

        if let Some(records) = document.table_mut(target) {
            records.push(record);
        }
        if let Err(err) = self.store.put(name, &document) {
            // Another namespace took the freed space; put the evicted records back
            if let Some(original) = original {
                if let Err(restore_err) = self.store.put(name, &original) {
                    warn!(namespace = name, error = %restore_err, "Evicted records could not be restored");
                }
            }
            return Err(match err {
                StoreError::Capacity { .. } => capacity_error(),
                other => other,
            });
        }
        Ok(true)
    }

    // == Reads ==
    fn load(&self, name: &str) -> Result<NamespaceDocument> {
        let document: NamespaceDocument = self.store.get(name).map_err(|err| match err {
            StoreError::NotFound(_) => StoreError::NamespaceNotFound(name.to_string()),
            other => other,
        })?;
        document.check_version()?;
        Ok(document)
    }

    /// Returns the active namespace's document.
    pub fn document(&self) -> Result<NamespaceDocument> {
        self.load(&self.namespace)
    }

    /// Returns a copy of one table of the active namespace; empty if the
    /// namespace has no such table.
    pub fn table(&self, table: Table) -> Result<Vec<Record>> {
        Ok(self
            .document()?
            .table(table)
            .map(<[Record]>::to_vec)
            .unwrap_or_default())
    }

    // == Lookup By Email ==
    /// Finds the account registered under `email` in any namespace.
    pub fn lookup_by_email(&self, email: &str) -> Option<AuthRecord> {
        let email = email.to_lowercase();
        self.store.find_map(|_, document: NamespaceDocument| {
            document
                .table(Table::Authentication)?
                .iter()
                .flat_map(|record| record.items())
                .filter_map(AuthRecord::from_item)
                .find(|account| account.email == email)
        })
    }

    // == Is Term Cached ==
    /// Returns the payload stored under `term` in `records`, ignoring case.
    pub fn is_term_cached<'a>(&self, term: &str, records: &'a [Record]) -> Option<&'a Value> {
        CacheAsideFetcher::lookup(term, records)
    }

    // == Parse Result Page ==
    /// Returns the `results` list of the first payload that carries one.
    ///
    /// Payload lists are searched item by item. Empty if nothing matches.
    pub fn parse_result_page(document: &NamespaceDocument) -> Vec<Value> {
        document
            .tables()
            .flat_map(|(_, records)| records.iter())
            .flat_map(|record| record.items())
            .find_map(|item| item.get("results")?.as_array().cloned())
            .unwrap_or_default()
    }

    /// Finds an item by `id` inside the result page cached under `key`.
    pub fn find_result_by_id(&self, table: Table, key: &str, id: &str) -> Result<Option<Value>> {
        let records = self.table(table)?;
        let Some(payload) = self.is_term_cached(key, &records) else {
            return Ok(None);
        };

        let results = std::slice::from_ref(payload)
            .iter()
            .chain(payload.as_array().into_iter().flatten())
            .find_map(|item| item.get("results")?.as_array().cloned())
            .unwrap_or_default();

        Ok(results.into_iter().find(|item| match item.get("id") {
            Some(Value::String(s)) => s == id,
            Some(Value::Number(n)) => n.to_string() == id,
            _ => false,
        }))
    }

    /// Account and record counts for the active namespace.
    pub fn user_summary(&self) -> Result<UserSummary> {
        Ok(UserSummary::from_document(&self.namespace, &self.document()?))
    }

    // == Home Page Sections ==
    /// Appends a `{title, description}` section to the shared home page.
    pub fn save_home_section(&self, section: &str, title: &str, description: &str) -> Result<bool> {
        let mut shared = self.clone();
        shared.reset(DEFAULT_NAMESPACE);
        shared.create_tables()?;
        shared.set_pending_save_target(Table::HomePage);
        shared.append(section, json!([{ "title": title, "description": description }]))
    }

    // == Cached Fetch ==
    /// Cache-aside lookup of `term` in `table` of the active namespace.
    ///
    /// On a miss `remote` is awaited and its payload appended under `term`.
    pub async fn cached_fetch<F, Fut, E>(
        &self,
        table: Table,
        term: &str,
        remote: F,
    ) -> std::result::Result<Fetched, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
        E: From<StoreError>,
    {
        let records = self.table(table)?;
        let mut writer = self.clone();
        writer.set_pending_save_target(table);

        CacheAsideFetcher::new(self.store.clone())
            .fetch_or_cached(term, &records, remote, move |payload| {
                writer.append(term, payload.clone()).map(|_| ())
            })
            .await
    }

    // == Capacity ==
    /// The byte budget of the underlying store.
    pub fn maximum_size(&self) -> usize {
        self.store.budget()
    }

    pub fn remaining_space(&self) -> usize {
        self.store.remaining_space()
    }
}

/// Serialized size of `document` once a record of `record_size` bytes is
/// pushed onto `target`. A separator byte is only needed after an existing
/// record.
fn projected_size(document: &NamespaceDocument, target: Table, record_size: usize) -> Result<usize> {
    let separator = document
        .table(target)
        .map_or(0, |records| usize::from(!records.is_empty()));
    Ok(estimate_size(document)? + record_size + separator)
}

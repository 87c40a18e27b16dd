//! Eviction Module
//!
//! Oldest-first record removal used to make room before an append.
//!
//! The target table is drained first. If that is not enough, the fallback
//! tables are drained in [`FALLBACK_ORDER`]. Protected tables are skipped.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{ByteBudgetStore, NamespaceDocument, Table};

/// Extra space reclaimed on top of the incoming write, as a percentage of it.
pub const SAFETY_MARGIN_PERCENT: usize = 30;

/// Tables drained after the target table, in order.
pub const FALLBACK_ORDER: [Table; 5] = [
    Table::KeyWords,
    Table::SearchTerms,
    Table::Ratings,
    Table::WatchingList,
    Table::Favourites,
];

// == Eviction Report ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Bytes released from the budget
    pub freed: usize,
    /// Records removed
    pub removed: usize,
}

// == Reclaim Target ==
/// Bytes to free so that `incoming` plus the safety margin fits into
/// `remaining`. Zero when it already fits.
pub fn reclaim_target(incoming: usize, remaining: usize) -> usize {
    let margin = (incoming * SAFETY_MARGIN_PERCENT).div_ceil(100);
    (incoming + margin).saturating_sub(remaining)
}

// == Eviction Order ==
/// Tables to drain for a write into `target`, in order, limited to tables
/// the document actually has.
pub fn eviction_order(target: Table, document: &NamespaceDocument) -> Vec<Table> {
    let mut order = Vec::with_capacity(FALLBACK_ORDER.len() + 1);
    if !target.is_protected() {
        order.push(target);
    }
    order.extend(FALLBACK_ORDER.iter().copied().filter(|t| *t != target));
    order.retain(|t| document.has_table(*t));
    order
}

// == Fully Evicted ==
/// Copy of `document` with every record eviction could remove for a write
/// into `target` already gone. Nothing in the store is touched.
///
/// Per table, records go oldest-first up to the first one not created by
/// `owner`, mirroring where [`evict`] stops.
pub fn fully_evicted(document: &NamespaceDocument, target: Table, owner: Uuid) -> NamespaceDocument {
    let mut drained = document.clone();
    for table in eviction_order(target, document) {
        if let Some(records) = drained.table_mut(table) {
            let owned = records
                .iter()
                .take_while(|record| record.is_owned_by(owner))
                .count();
            records.drain(..owned);
        }
    }
    drained
}

// == Evict ==
/// Removes oldest records from `document` (stored under `key`) until
/// `to_free` bytes are released or nothing evictable is left.
///
/// Best-effort: a record that cannot be removed ends eviction of its table
/// and is logged. The caller's capacity check decides whether enough was freed.
pub fn evict(
    store: &ByteBudgetStore,
    key: &str,
    document: &mut NamespaceDocument,
    target: Table,
    to_free: usize,
) -> EvictionReport {
    let mut report = EvictionReport::default();

    for table in eviction_order(target, document) {
        if report.freed >= to_free {
            break;
        }
        let Some(records) = document.table_mut(table) else {
            continue;
        };

        while report.freed < to_free && !records.is_empty() {
            match store.remove_entry_at(key, 0, records) {
                Ok(freed) => {
                    report.freed += freed;
                    report.removed += 1;
                    store.update_stats(|s| s.record_eviction());
                }
                Err(err) => {
                    warn!(namespace = key, %table, error = %err, "Eviction stopped for table");
                    break;
                }
            }
        }
    }

    debug!(
        namespace = key,
        freed = report.freed,
        removed = report.removed,
        to_free,
        "Eviction pass finished"
    );
    report
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{empty_default_namespace, empty_user_namespace, estimate_size, Record};
    use serde_json::json;
    use uuid::Uuid;

    fn store_with_owner() -> (ByteBudgetStore, Uuid) {
        let store = ByteBudgetStore::with_budget(10_000).unwrap();
        let owner = Uuid::new_v4();
        store.set_owner(owner);
        (store, owner)
    }

    #[test]
    fn test_reclaim_target() {
        assert_eq!(reclaim_target(100, 0), 130);
        assert_eq!(reclaim_target(100, 50), 80);
        assert_eq!(reclaim_target(100, 500), 0);
        // Margin rounds up
        assert_eq!(reclaim_target(1, 0), 2);
    }

    #[test]
    fn test_order_starts_with_target() {
        let doc = empty_user_namespace(Uuid::new_v4());
        let order = eviction_order(Table::Movies, &doc);
        assert_eq!(order[0], Table::Movies);
        assert_eq!(&order[1..], &FALLBACK_ORDER);
    }

    #[test]
    fn test_order_skips_protected_target() {
        let doc = empty_user_namespace(Uuid::new_v4());
        let order = eviction_order(Table::Authentication, &doc);
        assert_eq!(order, FALLBACK_ORDER.to_vec());
        assert!(!order.contains(&Table::Profile));
    }

    #[test]
    fn test_order_does_not_repeat_target() {
        let doc = empty_user_namespace(Uuid::new_v4());
        let order = eviction_order(Table::Ratings, &doc);
        assert_eq!(order.iter().filter(|t| **t == Table::Ratings).count(), 1);
    }

    #[test]
    fn test_order_limited_to_schema() {
        let doc = empty_default_namespace(Uuid::new_v4());
        let order = eviction_order(Table::HomePage, &doc);
        assert_eq!(order, vec![Table::HomePage, Table::SearchTerms]);
    }

    #[test]
    fn test_evict_removes_oldest_first() {
        let (store, owner) = store_with_owner();
        let mut doc = empty_user_namespace(owner);
        let records = doc.table_mut(Table::SearchTerms).unwrap();
        for (i, term) in ["old", "mid", "new"].iter().enumerate() {
            records.push(Record::with_timestamp(term, json!([i]), owner, i as u64));
        }
        store.put("alice", &doc).unwrap();

        let one = estimate_size(&doc.table(Table::SearchTerms).unwrap()[0]).unwrap();
        let report = evict(&store, "alice", &mut doc, Table::SearchTerms, one);

        assert_eq!(report.removed, 1);
        let left: Vec<_> = doc
            .table(Table::SearchTerms)
            .unwrap()
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(left, vec!["mid", "new"]);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_evict_falls_back_to_other_tables() {
        let (store, owner) = store_with_owner();
        let mut doc = empty_user_namespace(owner);
        doc.table_mut(Table::KeyWords)
            .unwrap()
            .push(Record::new("kw", json!("x".repeat(50)), owner));
        doc.table_mut(Table::Authentication)
            .unwrap()
            .push(Record::new("authentication", json!({"email": "a@b.c"}), owner));
        store.put("alice", &doc).unwrap();

        let report = evict(&store, "alice", &mut doc, Table::Favourites, 10);

        assert_eq!(report.removed, 1);
        assert!(doc.table(Table::KeyWords).unwrap().is_empty());
        assert_eq!(doc.table(Table::Authentication).unwrap().len(), 1);
    }

    #[test]
    fn test_evict_never_touches_protected_tables() {
        let (store, owner) = store_with_owner();
        let mut doc = empty_user_namespace(owner);
        doc.table_mut(Table::Profile)
            .unwrap()
            .push(Record::new("profile", json!({"bio": "hi"}), owner));
        store.put("alice", &doc).unwrap();

        let report = evict(&store, "alice", &mut doc, Table::Profile, 1_000);

        assert_eq!(report, EvictionReport::default());
        assert_eq!(doc.table(Table::Profile).unwrap().len(), 1);
    }

    #[test]
    fn test_fully_evicted_keeps_protected_and_foreign_records() {
        let owner = Uuid::new_v4();
        let mut doc = empty_user_namespace(owner);
        let terms = doc.table_mut(Table::SearchTerms).unwrap();
        terms.push(Record::with_timestamp("old", json!(1), owner, 1));
        terms.push(Record::with_timestamp("foreign", json!(2), Uuid::new_v4(), 2));
        terms.push(Record::with_timestamp("new", json!(3), owner, 3));
        doc.table_mut(Table::KeyWords)
            .unwrap()
            .push(Record::new("kw", json!("x"), owner));
        doc.table_mut(Table::Authentication)
            .unwrap()
            .push(Record::new("authentication", json!({"email": "a@b.c"}), owner));

        let drained = fully_evicted(&doc, Table::Favourites, owner);

        assert!(drained.table(Table::KeyWords).unwrap().is_empty());
        let left: Vec<_> = drained
            .table(Table::SearchTerms)
            .unwrap()
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(left, vec!["foreign", "new"]);
        assert_eq!(drained.table(Table::Authentication).unwrap().len(), 1);
        // The source document is untouched
        assert_eq!(doc.table(Table::SearchTerms).unwrap().len(), 3);
    }

    #[test]
    fn test_evict_stops_on_foreign_record() {
        let (store, owner) = store_with_owner();
        let mut doc = empty_user_namespace(owner);
        doc.table_mut(Table::SearchTerms)
            .unwrap()
            .push(Record::new("foreign", json!(1), Uuid::new_v4()));
        store.put("alice", &doc).unwrap();
        let before = store.space_used();

        let report = evict(&store, "alice", &mut doc, Table::SearchTerms, 100);

        assert_eq!(report.removed, 0);
        assert_eq!(store.space_used(), before);
        assert_eq!(doc.table(Table::SearchTerms).unwrap().len(), 1);
    }
}

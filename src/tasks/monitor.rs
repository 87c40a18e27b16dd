//! Capacity Monitor Task
//!
//! Background task that periodically reports store usage against its budget.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::ByteBudgetStore;

/// Logs the store's usage once. Returns true if usage is at or above
/// `warn_percent` of the budget.
pub fn check_capacity(store: &ByteBudgetStore, warn_percent: u8) -> bool {
    let stats = store.stats();
    let usage = stats.usage_percent();

    if usage >= f64::from(warn_percent) {
        warn!(
            space_used = stats.space_used,
            budget = stats.budget,
            remaining_mib = store.remaining_mib(),
            "Store usage at {:.1}%, eviction likely on next writes",
            usage
        );
        true
    } else {
        debug!(
            space_used = stats.space_used,
            budget = stats.budget,
            entries = stats.total_entries,
            evictions = stats.evictions,
            "Store usage at {:.1}%",
            usage
        );
        false
    }
}

/// Spawns a background task that periodically checks store capacity.
///
/// # Arguments
/// * `store` - shared byte store to observe
/// * `interval_secs` - Interval in seconds between checks
/// * `warn_percent` - usage threshold for a warning
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_capacity_monitor(
    store: Arc<ByteBudgetStore>,
    interval_secs: u64,
    warn_percent: u8,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting capacity monitor with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;
            check_capacity(&store, warn_percent);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn bound_store(budget: usize) -> ByteBudgetStore {
        let store = ByteBudgetStore::with_budget(budget).unwrap();
        store.set_owner(Uuid::new_v4());
        store
    }

    #[test]
    fn test_check_capacity_below_threshold() {
        let store = bound_store(1_000);
        store.put("a", &json!("x")).unwrap();
        assert!(!check_capacity(&store, 80));
    }

    #[test]
    fn test_check_capacity_above_threshold() {
        let store = bound_store(100);
        store.put("a", &json!("x".repeat(88))).unwrap();
        assert!(check_capacity(&store, 80));
    }

    #[tokio::test]
    async fn test_monitor_keeps_running() {
        let store = Arc::new(bound_store(1_000));
        let handle = spawn_capacity_monitor(store, 1, 80);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(!handle.is_finished(), "Monitor should keep running");

        handle.abort();
    }

    #[tokio::test]
    async fn test_monitor_can_be_aborted() {
        let store = Arc::new(ByteBudgetStore::new());

        let handle = spawn_capacity_monitor(store, 1, 80);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}

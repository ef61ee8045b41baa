//! TrackingStore — redb-backed persistence for promotion-tracking entries.
//!
//! `load()` returns the full entry set (empty for a fresh store);
//! `save()` replaces the persisted set wholesale and stamps
//! `last_updated`, all inside one write transaction. A save that fails
//! mid-way leaves the previously committed set intact.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::tables::{ENTRIES, META};
use crate::types::TrackingEntry;

const LAST_UPDATED: &str = "last_updated";

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe tracking store backed by redb.
#[derive(Clone)]
pub struct TrackingStore {
    db: Arc<Database>,
}

impl TrackingStore {
    /// Open (or create) a persistent tracking store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "tracking store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory tracking store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory tracking store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(ENTRIES).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Load every tracking entry. A fresh store yields an empty set.
    pub fn load(&self) -> StoreResult<Vec<TrackingEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: TrackingEntry =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// Replace the persisted entry set and stamp `last_updated`.
    ///
    /// Runs in a single write transaction: entries removed from the set
    /// disappear, everything else is rewritten, and a failure before
    /// commit leaves the previous set untouched.
    pub fn save(&self, entries: &[TrackingEntry]) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            txn.delete_table(ENTRIES).map_err(map_err!(Table))?;
            let mut table = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
            for entry in entries {
                let key = entry.table_key();
                let value = serde_json::to_vec(entry).map_err(map_err!(Serialize))?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            meta.insert(LAST_UPDATED, epoch_secs())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(count = entries.len(), "tracking entries saved");
        Ok(())
    }

    /// When the store was last saved, if ever.
    pub fn last_updated(&self) -> StoreResult<Option<u64>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(META).map_err(map_err!(Table))?;
        Ok(table
            .get(LAST_UPDATED)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value()))
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RolloutStatus;

    fn test_entry(task: &str, update: &str) -> TrackingEntry {
        TrackingEntry {
            update_id: update.to_string(),
            task_id: task.to_string(),
            title: format!("Update {update}"),
            reference_code: format!("REF-{update}"),
            status: RolloutStatus::InTesting,
            approved_for_test_at: 1000,
            eligible_for_promotion_at: 1000 + 7 * 86_400,
            promoted_at: None,
            successful_installations: 0,
            failed_installations: 0,
            pending_installations: 0,
            status_message: "Approved for test group".to_string(),
        }
    }

    #[test]
    fn fresh_store_loads_empty() {
        let store = TrackingStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert!(store.last_updated().unwrap().is_none());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let store = TrackingStore::open_in_memory().unwrap();
        let entries = vec![test_entry("task-1", "u-1"), test_entry("task-1", "u-2")];

        store.save(&entries).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains(&entries[0]));
        assert!(loaded.contains(&entries[1]));
    }

    #[test]
    fn save_replaces_previous_set() {
        let store = TrackingStore::open_in_memory().unwrap();
        store
            .save(&[test_entry("task-1", "u-1"), test_entry("task-1", "u-2")])
            .unwrap();

        // A later save with fewer entries drops the missing ones.
        store.save(&[test_entry("task-1", "u-2")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].update_id, "u-2");
    }

    #[test]
    fn save_preserves_mutations() {
        let store = TrackingStore::open_in_memory().unwrap();
        let mut entry = test_entry("task-1", "u-1");
        store.save(&[entry.clone()]).unwrap();

        entry.status = RolloutStatus::Promoted;
        entry.promoted_at = Some(2000);
        entry.successful_installations = 5;
        entry.status_message = "Promoted to production".to_string();
        store.save(&[entry.clone()]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![entry]);
    }

    #[test]
    fn save_stamps_last_updated() {
        let store = TrackingStore::open_in_memory().unwrap();
        store.save(&[test_entry("task-1", "u-1")]).unwrap();
        assert!(store.last_updated().unwrap().is_some());
    }

    #[test]
    fn same_update_under_two_tasks_keeps_two_entries() {
        let store = TrackingStore::open_in_memory().unwrap();
        store
            .save(&[test_entry("task-1", "u-1"), test_entry("task-2", "u-1")])
            .unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("tracking.redb");

        {
            let store = TrackingStore::open(&db_path).unwrap();
            store.save(&[test_entry("task-1", "u-1")]).unwrap();
        }

        // Reopen the same database file.
        let store = TrackingStore::open(&db_path).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].update_id, "u-1");
        assert!(store.last_updated().unwrap().is_some());
    }
}

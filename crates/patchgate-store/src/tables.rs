//! redb table definitions for the tracking store.
//!
//! Entries use `&str` keys and `&[u8]` values (JSON-serialized records).
//! Composite keys follow the pattern `{task_id}:{update_id}`.

use redb::TableDefinition;

/// Tracking entries keyed by `{task_id}:{update_id}`.
pub const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("tracking_entries");

/// Store-wide metadata (the `last_updated` stamp).
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

//! patchgate-store — durable tracking state for staged rollouts.
//!
//! Backed by [redb](https://docs.rs/redb), holds one `TrackingEntry` per
//! (update, task) pair plus a collection-wide `last_updated` stamp.
//!
//! # Architecture
//!
//! The store is read wholesale at phase start and written wholesale at
//! phase end: `load()` returns every entry, `save()` replaces the persisted
//! set inside a single write transaction. Between runs the persisted set is
//! the only source of truth; in-memory state is never carried across
//! invocations.
//!
//! The `TrackingStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`). An in-memory backend is available for testing.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::TrackingStore;
pub use types::{RolloutStatus, TaskId, TrackingEntry};

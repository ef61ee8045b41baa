//! Domain types for the tracking store.
//!
//! A `TrackingEntry` records one update moving through the staged rollout
//! under one task. Entries are created by the approval phase, mutated by
//! the promotion phase, and never deleted — the store doubles as the
//! rollout audit trail.

use serde::{Deserialize, Serialize};

/// Identifier of the rollout task that owns an entry.
pub type TaskId = String;

/// Rollout position of a tracked update.
///
/// Transitions are one-directional: `InTesting → Promoted` or
/// `InTesting → Blocked`, and `Blocked → Promoted` once a later pass
/// finds the gates satisfied. `Promoted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutStatus {
    /// Approved for the test targets, collecting installation results.
    InTesting,
    /// Failed a promotion gate; re-evaluated on later passes.
    Blocked,
    /// Approved for the production targets.
    Promoted,
}

/// One update being rolled out under one task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingEntry {
    /// External identifier of the update. Immutable.
    pub update_id: String,
    /// Rollout task that owns this entry. Immutable.
    pub task_id: TaskId,
    /// Update title, captured at approval time. Display only.
    pub title: String,
    /// Vendor reference code, captured at approval time. Display only.
    pub reference_code: String,
    pub status: RolloutStatus,
    /// Unix timestamp (seconds) of the test-group approval. Set once.
    pub approved_for_test_at: u64,
    /// `approved_for_test_at` plus the cooling-off window. Never
    /// recomputed, even when the entry is re-blocked later.
    pub eligible_for_promotion_at: u64,
    /// Unix timestamp of the transition to `Promoted`. Set exactly once.
    pub promoted_at: Option<u64>,
    /// Test-group installation counts, refreshed on every promotion pass
    /// while the entry is not yet promoted.
    pub successful_installations: u32,
    pub failed_installations: u32,
    pub pending_installations: u32,
    /// Human-readable rationale of the last status decision.
    pub status_message: String,
}

impl TrackingEntry {
    /// Build the composite key for the entries table.
    pub fn table_key(&self) -> String {
        Self::key_for(&self.task_id, &self.update_id)
    }

    /// Key for a (task, update) pair without an entry at hand.
    pub fn key_for(task_id: &str, update_id: &str) -> String {
        format!("{task_id}:{update_id}")
    }
}

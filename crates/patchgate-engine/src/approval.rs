//! Approval phase — opens tracking entries for newly-available updates.
//!
//! For each configured test target the phase queries the admin server for
//! unapproved updates matching the policy's classifications, skips updates
//! already tracked under the task, and approves the rest for that test
//! target. One failing update never aborts the scan of the remaining
//! candidates: the failure is logged and the loop moves on.

use std::collections::HashSet;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use patchgate_api::AdminApi;
use patchgate_store::{RolloutStatus, TrackingEntry};

use crate::policy::RolloutPolicy;

/// Message recorded on a freshly opened entry.
pub const APPROVED_MESSAGE: &str = "Approved for test group";

/// Result of one approval pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApprovalOutcome {
    /// Entries opened during this pass.
    pub new_approvals: u32,
}

/// Run the approval phase for one task.
///
/// Appends new entries to `entries`; existing entries are never touched.
/// Re-running against an unchanged server is a no-op: the per-(update,
/// task) key guard skips anything already tracked before any API call is
/// made.
pub async fn run_approval_phase<C: AdminApi>(
    task_id: &str,
    policy: &RolloutPolicy,
    entries: &mut Vec<TrackingEntry>,
    client: &C,
    now: u64,
    cancel: &watch::Receiver<bool>,
) -> ApprovalOutcome {
    let mut tracked: HashSet<String> = entries.iter().map(|e| e.table_key()).collect();
    let mut outcome = ApprovalOutcome::default();

    for target in &policy.test_targets {
        if *cancel.borrow() {
            info!(task = %task_id, "approval phase cancelled");
            return outcome;
        }

        let candidates = match client.list_unapproved_updates(&policy.classifications).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(task = %task_id, target = %target, error = %e, "candidate query failed");
                continue;
            }
        };

        debug!(
            task = %task_id,
            target = %target,
            count = candidates.len(),
            "candidates fetched"
        );

        for update in candidates {
            if *cancel.borrow() {
                info!(task = %task_id, "approval phase cancelled");
                return outcome;
            }

            let key = TrackingEntry::key_for(task_id, &update.id);
            if tracked.contains(&key) {
                continue; // Already staged under this task.
            }

            match client.approve_update(&update.id, target).await {
                Ok(()) => {
                    info!(
                        task = %task_id,
                        update = %update.id,
                        target = %target,
                        "update approved for testing"
                    );
                    entries.push(TrackingEntry {
                        update_id: update.id,
                        task_id: task_id.to_string(),
                        title: update.title,
                        reference_code: update.reference_code,
                        status: RolloutStatus::InTesting,
                        approved_for_test_at: now,
                        eligible_for_promotion_at: now + policy.cooling_off_secs(),
                        promoted_at: None,
                        successful_installations: 0,
                        failed_installations: 0,
                        pending_installations: 0,
                        status_message: APPROVED_MESSAGE.to_string(),
                    });
                    tracked.insert(key);
                    outcome.new_approvals += 1;
                }
                Err(e) => {
                    warn!(
                        task = %task_id,
                        update = %update.id,
                        target = %target,
                        error = %e,
                        "approval failed"
                    );
                }
            }
        }
    }

    outcome
}

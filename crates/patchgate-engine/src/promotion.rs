//! Promotion phase — evaluates tracked updates once their cooling-off
//! window has elapsed.
//!
//! Every `InTesting` or `Blocked` entry owned by the task whose
//! eligibility timestamp has passed gets its installation counts refreshed
//! from the admin server and is then gated, in fixed order: insufficient
//! successes block first, then excess failures; otherwise the update is
//! approved for every production target and the entry becomes `Promoted`.
//!
//! Blocked entries keep their original eligibility timestamp, so once that
//! point is past they are reconsidered on every subsequent pass until they
//! promote. Per-target approval failures and the best-effort decline of a
//! superseded update are logged and never revert a promotion.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use patchgate_api::AdminApi;
use patchgate_store::{RolloutStatus, TrackingEntry};

use crate::policy::RolloutPolicy;

/// Message recorded on promotion.
pub const PROMOTED_MESSAGE: &str = "Promoted to production";

/// Result of one promotion pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PromotionOutcome {
    pub promotions: u32,
    pub blocked: u32,
}

/// Decision for a single evaluated entry.
enum Gate {
    Promote,
    Block(String),
}

/// Apply the promotion gates to an entry's refreshed counts.
///
/// The first failing gate wins and supplies the recorded reason.
fn evaluate_gates(policy: &RolloutPolicy, entry: &TrackingEntry) -> Gate {
    if policy.require_successful_installations
        && entry.successful_installations < policy.minimum_successful_installations
    {
        return Gate::Block(format!(
            "Insufficient successful installations: {}/{}",
            entry.successful_installations, policy.minimum_successful_installations
        ));
    }
    if policy.abort_on_failures && entry.failed_installations > policy.max_allowed_failures {
        return Gate::Block(format!(
            "Too many failures: {} (max: {})",
            entry.failed_installations, policy.max_allowed_failures
        ));
    }
    Gate::Promote
}

/// Run the promotion phase for one task. Mutates entries in place.
///
/// Cancellation is honored between entries: an entry whose evaluation has
/// begun is carried through to its decision, and everything decided before
/// the signal stays decided.
pub async fn run_promotion_phase<C: AdminApi>(
    task_id: &str,
    policy: &RolloutPolicy,
    entries: &mut [TrackingEntry],
    client: &C,
    now: u64,
    cancel: &watch::Receiver<bool>,
) -> PromotionOutcome {
    let mut outcome = PromotionOutcome::default();

    for entry in entries.iter_mut() {
        if entry.task_id != task_id || entry.status == RolloutStatus::Promoted {
            continue;
        }
        if now < entry.eligible_for_promotion_at {
            debug!(update = %entry.update_id, "cooling off, not yet eligible");
            continue;
        }
        if *cancel.borrow() {
            info!(task = %task_id, "promotion phase cancelled");
            break;
        }

        // Telemetry refresh happens regardless of the decision below.
        match client
            .installation_outcome(&entry.update_id, &policy.test_targets)
            .await
        {
            Ok(counts) => {
                entry.successful_installations = counts.installed;
                entry.failed_installations = counts.failed;
                entry.pending_installations = counts.pending;
            }
            Err(e) => {
                warn!(
                    update = %entry.update_id,
                    error = %e,
                    "installation outcome query failed"
                );
                continue; // Keep prior status and counts; retry next run.
            }
        }

        match evaluate_gates(policy, entry) {
            Gate::Block(reason) => {
                info!(update = %entry.update_id, %reason, "promotion blocked");
                entry.status = RolloutStatus::Blocked;
                entry.status_message = reason;
                outcome.blocked += 1;
            }
            Gate::Promote => {
                promote(entry, policy, client, now).await;
                outcome.promotions += 1;
            }
        }
    }

    outcome
}

/// Approve the update for every production target, then mark the entry.
///
/// Per-target failures are logged and do not stop the remaining targets;
/// partial success still promotes the entry.
async fn promote<C: AdminApi>(
    entry: &mut TrackingEntry,
    policy: &RolloutPolicy,
    client: &C,
    now: u64,
) {
    for target in &policy.production_targets {
        if let Err(e) = client.approve_update(&entry.update_id, target).await {
            warn!(
                update = %entry.update_id,
                target = %target,
                error = %e,
                "production approval failed"
            );
        }
    }

    entry.status = RolloutStatus::Promoted;
    entry.promoted_at = Some(now);
    entry.status_message = PROMOTED_MESSAGE.to_string();
    info!(update = %entry.update_id, "promoted to production");

    if policy.decline_superseded {
        decline_if_superseded(entry, client).await;
    }
}

/// Best-effort: a failure here never affects the entry.
async fn decline_if_superseded<C: AdminApi>(entry: &TrackingEntry, client: &C) {
    match client.is_superseded(&entry.update_id).await {
        Ok(true) => match client.decline_update(&entry.update_id).await {
            Ok(()) => info!(update = %entry.update_id, "superseded update declined"),
            Err(e) => warn!(
                update = %entry.update_id,
                error = %e,
                "decline of superseded update failed"
            ),
        },
        Ok(false) => {}
        Err(e) => {
            warn!(update = %entry.update_id, error = %e, "supersession query failed");
        }
    }
}

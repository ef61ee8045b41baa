//! Run coordinator — one scheduled tick of the engine.
//!
//! Sequences load → approval phase → save → promotion phase → save and
//! folds the phase counters into the result record handed back to the
//! invoking scheduler. The approval phase's effects are persisted before
//! promotion begins, so a failure later in the run never rolls them back.
//! Store and policy errors terminate the run; everything else is contained
//! inside the phases.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use patchgate_api::AdminApi;
use patchgate_store::TrackingStore;

use crate::approval::run_approval_phase;
use crate::error::EngineResult;
use crate::policy::RolloutPolicy;
use crate::promotion::run_promotion_phase;

/// Counters from one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub new_approvals: u32,
    pub promotions: u32,
    pub blocked: u32,
}

/// Error detail carried by a failed [`RunOutcome`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub message: String,
    pub kind: String,
}

/// Scheduler-facing result record for one invocation.
///
/// This is the only contract the external scheduler (or a GUI on top of
/// it) needs to display run status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    #[serde(flatten)]
    pub report: Option<RunReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

impl RunOutcome {
    pub fn from_result(result: &EngineResult<RunReport>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                report: Some(*report),
                error: None,
            },
            Err(e) => Self {
                success: false,
                report: None,
                error: Some(RunError {
                    message: e.to_string(),
                    kind: e.kind().to_string(),
                }),
            },
        }
    }
}

/// Execute one engine tick for `task_id`.
///
/// The caller guarantees at most one concurrent run per task id (one
/// external trigger per task). The cancellation signal stops the phases
/// from starting new per-item API calls; decisions made before the signal
/// are still persisted.
pub async fn run_once<C: AdminApi>(
    task_id: &str,
    policy: &RolloutPolicy,
    store: &TrackingStore,
    client: &C,
    cancel: &watch::Receiver<bool>,
) -> EngineResult<RunReport> {
    policy.validate()?;

    // One clock reading per run: every entry opened or promoted in this
    // tick carries the same timestamp.
    let now = epoch_secs();

    let mut entries = store.load()?;
    info!(task = %task_id, entries = entries.len(), "run starting");

    let approval = run_approval_phase(task_id, policy, &mut entries, client, now, cancel).await;
    store.save(&entries)?;

    let promotion = run_promotion_phase(task_id, policy, &mut entries, client, now, cancel).await;
    store.save(&entries)?;

    let report = RunReport {
        new_approvals: approval.new_approvals,
        promotions: promotion.promotions,
        blocked: promotion.blocked,
    };
    info!(
        task = %task_id,
        new_approvals = report.new_approvals,
        promotions = report.promotions,
        blocked = report.blocked,
        "run finished"
    );
    Ok(report)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

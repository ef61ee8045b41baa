//! Scripted admin API double shared by the engine test modules.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tokio::sync::watch;

use patchgate_api::{AdminApi, ApiError, ApiResult, InstallationOutcome, UpdateSummary};

/// Serves canned responses and records every call.
#[derive(Default)]
pub struct ScriptedApi {
    /// Served to every candidate query (filtered by classification).
    pub unapproved: Vec<UpdateSummary>,
    /// Installation counts per update id.
    pub outcomes: HashMap<String, InstallationOutcome>,
    /// Updates reported as superseded.
    pub superseded: HashSet<String>,
    /// (update, group) approvals that fail.
    pub failing_approvals: HashSet<(String, String)>,
    /// Update ids whose outcome query fails.
    pub failing_outcomes: HashSet<String>,
    /// Update ids whose decline fails.
    pub failing_declines: HashSet<String>,
    /// Whether every candidate query fails.
    pub fail_listing: bool,

    pub calls: Mutex<Calls>,
}

/// Call log, in invocation order per method.
#[derive(Debug, Default)]
pub struct Calls {
    pub listings: Vec<Vec<String>>,
    pub approvals: Vec<(String, String)>,
    pub declines: Vec<String>,
    pub outcome_queries: Vec<String>,
    pub supersession_queries: Vec<String>,
}

fn transient(what: &str) -> ApiError {
    ApiError::Request(format!("scripted failure: {what}"))
}

impl AdminApi for ScriptedApi {
    async fn list_unapproved_updates(
        &self,
        classifications: &[String],
    ) -> ApiResult<Vec<UpdateSummary>> {
        self.calls
            .lock()
            .unwrap()
            .listings
            .push(classifications.to_vec());
        if self.fail_listing {
            return Err(transient("listing"));
        }
        if classifications.is_empty() {
            return Ok(self.unapproved.clone());
        }
        Ok(self
            .unapproved
            .iter()
            .filter(|u| classifications.contains(&u.classification))
            .cloned()
            .collect())
    }

    async fn approve_update(&self, update_id: &str, target_group_id: &str) -> ApiResult<()> {
        let pair = (update_id.to_string(), target_group_id.to_string());
        self.calls.lock().unwrap().approvals.push(pair.clone());
        if self.failing_approvals.contains(&pair) {
            return Err(transient("approve"));
        }
        Ok(())
    }

    async fn decline_update(&self, update_id: &str) -> ApiResult<()> {
        self.calls
            .lock()
            .unwrap()
            .declines
            .push(update_id.to_string());
        if self.failing_declines.contains(update_id) {
            return Err(transient("decline"));
        }
        Ok(())
    }

    async fn installation_outcome(
        &self,
        update_id: &str,
        _target_group_ids: &[String],
    ) -> ApiResult<InstallationOutcome> {
        self.calls
            .lock()
            .unwrap()
            .outcome_queries
            .push(update_id.to_string());
        if self.failing_outcomes.contains(update_id) {
            return Err(transient("outcome"));
        }
        Ok(self.outcomes.get(update_id).copied().unwrap_or_default())
    }

    async fn is_superseded(&self, update_id: &str) -> ApiResult<bool> {
        self.calls
            .lock()
            .unwrap()
            .supersession_queries
            .push(update_id.to_string());
        Ok(self.superseded.contains(update_id))
    }
}

/// Candidate update fixture.
pub fn update(id: &str, classification: &str) -> UpdateSummary {
    UpdateSummary {
        id: id.to_string(),
        title: format!("Update {id}"),
        reference_code: format!("REF-{id}"),
        classification: classification.to_string(),
    }
}

/// A cancellation signal that never fires.
pub fn never_cancelled() -> watch::Receiver<bool> {
    watch::channel(false).1
}

/// A cancellation signal that has already fired.
pub fn cancelled() -> watch::Receiver<bool> {
    watch::channel(true).1
}

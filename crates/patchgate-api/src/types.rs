//! Wire types returned by the update administration server.

use serde::{Deserialize, Serialize};

/// Opaque identifier of an update on the administration server.
pub type UpdateId = String;

/// Identifier of a target group (a named set of machines).
pub type TargetGroupId = String;

/// Summary of an update as returned by the unapproved-updates query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateSummary {
    pub id: UpdateId,
    pub title: String,
    /// Vendor reference code (KB / advisory number). Display only.
    pub reference_code: String,
    /// Classification string ("security", "critical", "feature", ...).
    pub classification: String,
}

/// Installation counts for an update across a set of target groups.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallationOutcome {
    /// Machines that installed the update successfully.
    pub installed: u32,
    /// Machines where installation failed.
    pub failed: u32,
    /// Machines that have not reported a final state yet.
    pub pending: u32,
}

//! Rollout policy — which updates are staged, where, and what gates
//! promotion. Supplied externally (TOML file), read-only to the engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Configuration of one staged rollout task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutPolicy {
    /// Target groups that receive updates first.
    pub test_targets: Vec<String>,
    /// Target groups that receive updates after promotion.
    pub production_targets: Vec<String>,
    /// Classifications eligible for staging. Empty means all.
    pub classifications: Vec<String>,
    /// Days between test approval and promotion eligibility.
    pub cooling_off_days: u32,
    /// Require a minimum number of successful test installations.
    pub require_successful_installations: bool,
    pub minimum_successful_installations: u32,
    /// Block promotion when test failures exceed the cap.
    pub abort_on_failures: bool,
    pub max_allowed_failures: u32,
    /// Decline a promoted update once a newer update supersedes it.
    pub decline_superseded: bool,
}

impl Default for RolloutPolicy {
    fn default() -> Self {
        Self {
            test_targets: Vec::new(),
            production_targets: Vec::new(),
            classifications: Vec::new(),
            cooling_off_days: 7,
            require_successful_installations: true,
            minimum_successful_installations: 1,
            abort_on_failures: true,
            max_allowed_failures: 0,
            decline_superseded: false,
        }
    }
}

impl RolloutPolicy {
    /// Load and validate a policy from a TOML file.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Policy(format!("cannot read {}: {e}", path.display())))?;
        let policy: RolloutPolicy = toml::from_str(&content)
            .map_err(|e| EngineError::Policy(format!("cannot parse {}: {e}", path.display())))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reject configurations the engine cannot run against.
    ///
    /// Checked before any entry is touched, so a bad policy surfaces as
    /// the run's terminal error rather than as per-item noise.
    pub fn validate(&self) -> EngineResult<()> {
        if self.test_targets.is_empty() {
            return Err(EngineError::Policy("no test targets configured".into()));
        }
        if self.production_targets.is_empty() {
            return Err(EngineError::Policy(
                "no production targets configured".into(),
            ));
        }
        if self.require_successful_installations && self.minimum_successful_installations == 0 {
            return Err(EngineError::Policy(
                "minimum_successful_installations must be at least 1 when required".into(),
            ));
        }
        Ok(())
    }

    /// Cooling-off window in seconds.
    pub fn cooling_off_secs(&self) -> u64 {
        u64::from(self.cooling_off_days) * 86_400
    }

    /// Sample policy for `patchgated init`.
    pub fn scaffold() -> Self {
        Self {
            test_targets: vec!["Test Workstations".to_string()],
            production_targets: vec!["All Workstations".to_string()],
            classifications: vec!["security".to_string(), "critical".to_string()],
            cooling_off_days: 7,
            require_successful_installations: true,
            minimum_successful_installations: 3,
            abort_on_failures: true,
            max_allowed_failures: 0,
            decline_superseded: true,
        }
    }

    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Policy(e.to_string()))
    }
}

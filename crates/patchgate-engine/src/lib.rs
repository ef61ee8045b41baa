//! patchgate-engine — the staged (canary) approval engine.
//!
//! Invoked once per tick by an external periodic trigger, the engine
//! discovers newly-available updates matching a rollout policy, approves
//! them for a small set of test targets, observes real installation
//! outcomes over a cooling-off period, and promotes each update to the
//! production targets only once the outcome gates pass — otherwise it
//! blocks the update and records why.
//!
//! # Components
//!
//! - **`policy`** — rollout policy configuration, loading, validation
//! - **`approval`** — scans for eligible updates and opens tracking entries
//! - **`promotion`** — evaluates eligible entries and promotes or blocks
//! - **`coordinator`** — one run: load, approve, persist, promote, persist
//!
//! # Failure containment
//!
//! A single run is sequential: the approval phase completes, including its
//! store save, before the promotion phase begins. Per-update and per-target
//! API failures are contained at item granularity inside the phase loops;
//! only store and configuration errors terminate a run. The external
//! trigger guarantees at most one concurrent run per task id — the engine
//! takes no lock of its own.

pub mod approval;
pub mod coordinator;
pub mod error;
pub mod policy;
pub mod promotion;

#[cfg(test)]
pub(crate) mod test_support;

pub use approval::ApprovalOutcome;
pub use coordinator::{RunOutcome, RunReport, run_once};
pub use error::{EngineError, EngineResult};
pub use policy::RolloutPolicy;
pub use promotion::PromotionOutcome;

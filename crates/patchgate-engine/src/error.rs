//! Engine error taxonomy — only the classes that terminate a run.
//!
//! Per-update and per-target API failures are handled inside the phase
//! loops and never surface here.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort a coordinator run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rollout policy is missing, unreadable, or unusable.
    #[error("policy error: {0}")]
    Policy(String),

    /// The tracking store could not be read or written.
    #[error("store error: {0}")]
    Store(#[from] patchgate_store::StoreError),
}

impl EngineError {
    /// Stable kind string for the scheduler-facing result record.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Policy(_) => "policy",
            EngineError::Store(_) => "store",
        }
    }
}

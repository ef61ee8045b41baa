//! Error types for the tracking store.
//!
//! Every variant is fatal to the run that hits it: proceeding on
//! in-memory state would let the next run read stale data and duplicate
//! approvals.

use thiserror::Error;

/// Result type alias for tracking store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during tracking store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}

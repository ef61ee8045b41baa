//! Error types for admin API calls.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for admin API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors from a single admin API call.
///
/// All variants are transient from the engine's point of view: callers
/// recover at per-update / per-target granularity and never abort a phase
/// over one of these.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

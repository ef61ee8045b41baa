//! patchgate-api — client for the update administration server.
//!
//! The engine talks to the administration server through the [`AdminApi`]
//! trait: candidate queries, approvals, declines, installation outcomes,
//! and supersession checks. `HttpAdminApi` implements the trait over the
//! server's JSON HTTP/1 endpoint; tests substitute scripted doubles.
//!
//! Every call is a single request with its own timeout. Failures are
//! transient from the caller's point of view and are recovered at
//! per-update / per-target granularity by the phase loops.

pub mod client;
pub mod error;
pub mod types;

pub use client::{AdminApi, ConnectionConfig, HttpAdminApi};
pub use error::{ApiError, ApiResult};
pub use types::{InstallationOutcome, TargetGroupId, UpdateId, UpdateSummary};

//! Error types for collaborator boundaries.
//!
//! There are no fatal errors in normal operation. Storage failures are
//! reported through [`StoreError`] so callers can degrade to "no high
//! score" / "save skipped" and keep the session playable.

use thiserror::Error;

/// Failure modes of the high-score persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store is not available at all (e.g. storage disabled).
    #[error("score store unavailable")]
    Unavailable,
    /// The store exists but the operation failed.
    #[error("score store backend: {0}")]
    Backend(String),
}

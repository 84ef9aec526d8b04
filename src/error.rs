//! Error types for oustdom.

use thiserror::Error;

/// Errors from a single source refresh attempt.
///
/// All of these are recoverable at the cycle level: the orchestrator logs
/// them, marks the source's status gauge and moves on, leaving the previous
/// cache file as last known good.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid status code {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to publish cache file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

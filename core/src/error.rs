//! Error types for the sync layer.

use thiserror::Error;

/// Failures a Remote Store backend can report.
///
/// None of these ever reach callers of the sync engine; they are turned into
/// a local fallback (reads) or handed to the observer (writes).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote store timed out")]
    Timeout,
    #[error("remote store denied access")]
    PermissionDenied,
    #[error("document not found")]
    NotFound,
    #[error("remote transport error: {0}")]
    Transport(String),
    #[error("malformed remote document: {0}")]
    Malformed(String),
}

/// Errors surfaced by the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The entity (or a stored document) failed schema validation.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The on-device store could not be read or written. Fatal for the entity.
    #[error("local store failure: {0}")]
    LocalStore(String),
    /// `From` conversion target for [`RemoteError`]. The engine never returns
    /// it; remote failures end in a local fallback or the observer.
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteError),
}

impl SyncError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap any local store failure, keeping the full context chain.
    pub fn local(err: &anyhow::Error) -> Self {
        Self::LocalStore(format!("{err:#}"))
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LocalStore(_))
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;

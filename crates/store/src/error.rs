//! Store-level error model.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary error.
///
/// Uniqueness violations surface as `Conflict` with a generic message; the
/// caller reports them without retrying (writes are last-write-wins, there is
/// no version to retry against).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

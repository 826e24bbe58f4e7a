//! Domain errors for the record cache layer.

use thiserror::Error;

use crate::domain::models::RecordId;
use crate::domain::observable::CollectionError;

/// Domain-level errors surfaced by the repository and its collaborators.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found: {0}")]
    NotFound(RecordId),

    #[error("record already present: {0}")]
    AlreadyExists(RecordId),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Convenience alias used throughout the crate.
pub type RepoResult<T> = Result<T, RepoError>;

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Storage(err.to_string())
    }
}

impl From<CollectionError<RecordId>> for RepoError {
    fn from(err: CollectionError<RecordId>) -> Self {
        match err {
            CollectionError::AlreadyExists(id) => RepoError::AlreadyExists(id),
            CollectionError::NotFound(id) => RepoError::NotFound(id),
        }
    }
}

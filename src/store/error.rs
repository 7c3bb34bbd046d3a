use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("store call timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("weights version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The backend rejected the write on a uniqueness or integrity rule
    #[error("constraint violation: {0}")]
    Constraint(String),
}

impl StoreError {
    /// Failures worth retrying with backoff. Conflicts are resolved by
    /// re-running the learning cycle, not by replaying the write.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Io(_)
                | StoreError::Backend(_)
                | StoreError::Timeout(_)
                | StoreError::Unavailable(_)
        )
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        let integrity = e.code().is_some_and(|code| {
            *code == SqlState::UNIQUE_VIOLATION
                || *code == SqlState::FOREIGN_KEY_VIOLATION
                || *code == SqlState::CHECK_VIOLATION
                || *code == SqlState::NOT_NULL_VIOLATION
        });
        if integrity {
            StoreError::Constraint(e.to_string())
        } else if e.is_closed() {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}

use contour_types::Guid;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("record not found: {0}")]
    NotFound(Guid),

    /// A record with this identifier already exists.
    #[error("record already exists: {0}")]
    AlreadyExists(Guid),

    /// The record is protected and no access override is active.
    #[error("access denied to record {id}: {reason}")]
    AccessDenied { id: Guid, reason: String },

    /// A backend lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

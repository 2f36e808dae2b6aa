/// Failure inside a [`BugStore`](crate::BugStore) implementation.
///
/// These are never user errors; the API layer reports them as a generic
/// internal failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row no longer maps onto the domain model.
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

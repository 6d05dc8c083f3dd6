/// Errors from store operations.
///
/// Callers propagate these unchanged; nothing in Kindred retries them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A put or delete call carried more items than the store accepts at once.
    #[error("batch of {size} exceeds the store limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// The backend could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

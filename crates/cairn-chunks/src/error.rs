use cairn_hash::Ref;

/// Errors from chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The requested chunk is not in the store.
    #[error("chunk not found: {0}")]
    ChunkNotFound(Ref),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for chunk store operations.
pub type ChunkResult<T> = Result<T, ChunkError>;

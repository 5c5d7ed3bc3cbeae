use cairn_chunks::ChunkError;
use cairn_hash::{HashError, Ref};
use thiserror::Error;

/// Errors from encoding, decoding, and resolving values.
///
/// Every failure is surfaced to the caller; nothing here is retried
/// internally, and a failed decode never yields a partially-built value.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A textual ref in the input did not parse.
    #[error(transparent)]
    MalformedRef(#[from] HashError),

    /// A ref pointed at a chunk the store does not have.
    #[error("chunk not found: {0}")]
    ChunkNotFound(Ref),

    /// The `cb` array violated the compound-blob grammar or its invariants.
    #[error("invalid compound blob: {0}")]
    InvalidCompoundBlob(String),

    /// Generic wire-grammar mismatch.
    #[error("decode error: {0}")]
    Decode(String),

    /// Numbers must be finite to have a canonical encoding.
    #[error("cannot encode non-finite number: {0}")]
    NonFiniteNumber(f64),

    /// A flat blob appeared inside another value. Blobs encode as their own
    /// chunks; route the value through [`write_value`](crate::write_value),
    /// which chunks nested blobs into refs first.
    #[error("nested flat blob has no inline encoding; write it through the chunk store")]
    NestedBlob,

    /// I/O failure from the chunk store collaborator.
    #[error("chunk store error: {0}")]
    Store(#[from] ChunkError),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

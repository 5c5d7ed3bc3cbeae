use cairn_hash::Ref;

use crate::error::{ChunkError, ChunkResult};

/// Content-addressed chunk store.
///
/// All implementations must satisfy these invariants:
/// - Chunks are immutable once written. Content-addressing guarantees this:
///   the same bytes always produce the same ref.
/// - `put` is idempotent and deduplicating: writing the same bytes twice
///   stores one chunk and returns the same ref.
/// - Concurrent `get`/`put` from multiple callers is safe.
/// - The store never interprets chunk contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait ChunkStore: Send + Sync {
    /// Write a chunk and return its content-addressed ref.
    fn put(&self, data: &[u8]) -> ChunkResult<Ref>;

    /// Read a chunk by ref.
    ///
    /// Returns `Ok(None)` if the chunk does not exist.
    /// Returns `Err` on I/O failure.
    fn get(&self, r: &Ref) -> ChunkResult<Option<Vec<u8>>>;

    /// Check whether a chunk exists in the store.
    fn has(&self, r: &Ref) -> ChunkResult<bool> {
        Ok(self.get(r)?.is_some())
    }

    /// Read a chunk that must exist; a miss is [`ChunkError::ChunkNotFound`].
    fn get_required(&self, r: &Ref) -> ChunkResult<Vec<u8>> {
        self.get(r)?.ok_or(ChunkError::ChunkNotFound(*r))
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use cairn_hash::Ref;
use tracing::trace;

use crate::error::ChunkResult;
use crate::traits::ChunkStore;

/// In-memory, HashMap-based chunk store.
///
/// Intended for tests and embedding. All chunks are held in memory behind a
/// `RwLock` for safe concurrent access. Chunks are cloned on read.
pub struct MemoryChunkStore {
    chunks: RwLock<HashMap<Ref, Vec<u8>>>,
}

impl MemoryChunkStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of chunks currently stored.
    pub fn len(&self) -> usize {
        self.chunks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored chunks.
    pub fn total_bytes(&self) -> u64 {
        self.chunks
            .read()
            .expect("lock poisoned")
            .values()
            .map(|c| c.len() as u64)
            .sum()
    }

    /// Remove all chunks from the store.
    pub fn clear(&self) {
        self.chunks.write().expect("lock poisoned").clear();
    }
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkStore for MemoryChunkStore {
    fn put(&self, data: &[u8]) -> ChunkResult<Ref> {
        let r = Ref::of(data);
        let mut map = self.chunks.write().expect("lock poisoned");
        // Idempotent: the same bytes always map to the same ref.
        map.entry(r).or_insert_with(|| data.to_vec());
        trace!(r = %r.short_hex(), len = data.len(), "put chunk");
        Ok(r)
    }

    fn get(&self, r: &Ref) -> ChunkResult<Option<Vec<u8>>> {
        let map = self.chunks.read().expect("lock poisoned");
        let found = map.get(r).cloned();
        trace!(r = %r.short_hex(), hit = found.is_some(), "get chunk");
        Ok(found)
    }

    fn has(&self, r: &Ref) -> ChunkResult<bool> {
        Ok(self.chunks.read().expect("lock poisoned").contains_key(r))
    }
}

impl std::fmt::Debug for MemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChunkStore")
            .field("chunk_count", &self.len())
            .finish()
    }
}

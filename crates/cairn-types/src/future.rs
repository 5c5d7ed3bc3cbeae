use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, OnceLock};

use cairn_chunks::ChunkStore;
use cairn_hash::Ref;
use tracing::debug;

use crate::codec;
use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// A lazily-resolved, memoizing handle to a value.
///
/// A future always knows the [`Ref`] of the value it stands for; the value
/// itself is either resident from construction ([`Future::of_value`]) or
/// fetched from a chunk store on first access ([`Future::resolve`]). The
/// resident slot is write-once: concurrent resolutions may both fetch, but
/// they converge on one cached value and the cache never changes afterwards.
/// Clones share the cache.
///
/// Equality and ordering compare digests only, so an unresolved future and a
/// resolved one over the same content are equal.
#[derive(Clone)]
pub struct Future {
    inner: Arc<Inner>,
}

struct Inner {
    digest: Ref,
    cell: OnceLock<Value>,
}

impl Future {
    /// A future backed by a ref, to be resolved against a chunk store later.
    pub fn from_ref(digest: Ref) -> Self {
        Self {
            inner: Arc::new(Inner {
                digest,
                cell: OnceLock::new(),
            }),
        }
    }

    /// A future holding a resident value.
    ///
    /// The digest is computed eagerly from the value's canonical encoding,
    /// so the value must already be encodable (nested flat blobs must have
    /// been chunked through [`write_value`](crate::write_value)).
    pub fn of_value(value: Value) -> CodecResult<Self> {
        let digest = Ref::of(&codec::encode(&value)?);
        let cell = OnceLock::new();
        let _ = cell.set(value);
        Ok(Self {
            inner: Arc::new(Inner { digest, cell }),
        })
    }

    /// The content digest of the target value.
    pub fn digest(&self) -> Ref {
        self.inner.digest
    }

    /// The resident value, if resolution has already happened.
    pub fn value(&self) -> Option<&Value> {
        self.inner.cell.get()
    }

    pub fn is_resident(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    /// Resolve the target value, fetching and decoding it on first access.
    ///
    /// A store miss is [`CodecError::ChunkNotFound`]; decode failures are
    /// surfaced unchanged. On success the value is cached and later calls
    /// return it without touching the store.
    pub fn resolve(&self, store: &dyn ChunkStore) -> CodecResult<&Value> {
        if let Some(v) = self.inner.cell.get() {
            return Ok(v);
        }
        let digest = self.inner.digest;
        let bytes = store
            .get(&digest)?
            .ok_or(CodecError::ChunkNotFound(digest))?;
        debug!(r = %digest.short_hex(), len = bytes.len(), "resolved chunk");
        let value = codec::decode(&bytes)?;
        // First successful resolution wins; a concurrent loser converges on
        // the cached value.
        let _ = self.inner.cell.set(value);
        Ok(self.inner.cell.get().expect("cell was just populated"))
    }
}

impl PartialEq for Future {
    fn eq(&self, other: &Self) -> bool {
        self.inner.digest == other.inner.digest
    }
}

impl Eq for Future {}

impl PartialOrd for Future {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Future {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.digest.cmp(&other.inner.digest)
    }
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("digest", &self.inner.digest)
            .field("resident", &self.is_resident())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_chunks::MemoryChunkStore;

    #[test]
    fn resolve_fetches_and_caches() {
        let store = MemoryChunkStore::new();
        let bytes = codec::encode(&Value::String("hello".into())).unwrap();
        let r = store.put(&bytes).unwrap();

        let fut = Future::from_ref(r);
        assert!(!fut.is_resident());

        let v = fut.resolve(&store).unwrap().clone();
        assert_eq!(v, Value::String("hello".into()));
        assert!(fut.is_resident());

        // Cached: resolution survives the chunk disappearing.
        store.clear();
        let again = fut.resolve(&store).unwrap();
        assert_eq!(*again, v);
    }

    #[test]
    fn resolve_reports_missing_chunk() {
        let store = MemoryChunkStore::new();
        let fut = Future::from_ref(Ref::of(b"not stored"));
        match fut.resolve(&store) {
            Err(CodecError::ChunkNotFound(r)) => assert_eq!(r, Ref::of(b"not stored")),
            other => panic!("expected ChunkNotFound, got {other:?}"),
        }
    }

    #[test]
    fn of_value_is_resident_and_addressed() {
        let fut = Future::of_value(Value::Bool(true)).unwrap();
        assert!(fut.is_resident());

        let expected = Ref::of(&codec::encode(&Value::Bool(true)).unwrap());
        assert_eq!(fut.digest(), expected);
    }

    #[test]
    fn equality_compares_digests_not_residency() {
        let resident = Future::of_value(Value::Bool(true)).unwrap();
        let pending = Future::from_ref(resident.digest());
        assert_eq!(resident, pending);

        let other = Future::of_value(Value::Bool(false)).unwrap();
        assert_ne!(resident, other);
    }

    #[test]
    fn clones_share_the_cache() {
        let store = MemoryChunkStore::new();
        let bytes = codec::encode(&Value::Number(7.0)).unwrap();
        let r = store.put(&bytes).unwrap();

        let a = Future::from_ref(r);
        let b = a.clone();
        a.resolve(&store).unwrap();
        assert!(b.is_resident());
    }

    #[test]
    fn concurrent_resolution_converges() {
        use std::thread;

        let store = std::sync::Arc::new(MemoryChunkStore::new());
        let bytes = codec::encode(&Value::String("shared".into())).unwrap();
        let r = store.put(&bytes).unwrap();
        let fut = Future::from_ref(r);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let fut = fut.clone();
                let store = std::sync::Arc::clone(&store);
                thread::spawn(move || fut.resolve(&*store).unwrap().clone())
            })
            .collect();
        for h in handles {
            assert_eq!(
                h.join().expect("no panic"),
                Value::String("shared".into())
            );
        }
    }
}

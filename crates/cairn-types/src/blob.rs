use std::cmp::Ordering;

use cairn_chunks::ChunkStore;

use crate::codec;
use crate::error::{CodecError, CodecResult};
use crate::future::Future;
use crate::value::Value;

/// A byte-sequence value: either a flat run of bytes or a compound blob
/// assembled from chunked children.
#[derive(Clone, Debug)]
pub enum Blob {
    Flat(Vec<u8>),
    Compound(CompoundBlob),
}

impl Blob {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Blob::Flat(bytes.into())
    }

    /// Logical length in bytes.
    pub fn len(&self) -> u64 {
        match self {
            Blob::Flat(b) => b.len() as u64,
            Blob::Compound(cb) => cb.total_len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a blob from `data`, splitting it into chunks with `chunker` and
    /// writing each chunk through the store. A single-chunk source stays
    /// flat; anything larger becomes a [`CompoundBlob`] whose children are
    /// unresolved refs to the written chunks.
    pub fn write_chunked(
        data: &[u8],
        chunker: &dyn Chunker,
        store: &dyn ChunkStore,
    ) -> CodecResult<Blob> {
        let chunks = chunker.split(data);
        if chunks.len() <= 1 {
            return Ok(Blob::Flat(data.to_vec()));
        }

        let mut offsets = Vec::with_capacity(chunks.len());
        let mut children = Vec::with_capacity(chunks.len());
        let mut offset = 0u64;
        for chunk in chunks {
            offsets.push(offset);
            offset += chunk.len() as u64;
            let bytes = codec::encode(&Value::Blob(Blob::Flat(chunk.to_vec())))?;
            children.push(Future::from_ref(store.put(&bytes)?));
        }
        Ok(Blob::Compound(CompoundBlob::new(
            data.len() as u64,
            offsets,
            children,
        )?))
    }

    /// Read `len` bytes starting at `start`, resolving only the children
    /// needed to cover the range. The range is clamped to the blob's length.
    pub fn read_range(&self, start: u64, len: u64, store: &dyn ChunkStore) -> CodecResult<Vec<u8>> {
        let end = start.saturating_add(len).min(self.len());
        if start >= end {
            return Ok(Vec::new());
        }
        match self {
            Blob::Flat(bytes) => Ok(bytes[start as usize..end as usize].to_vec()),
            Blob::Compound(cb) => cb.read_range(start, end, store),
        }
    }

    /// The full byte content.
    pub fn read_all(&self, store: &dyn ChunkStore) -> CodecResult<Vec<u8>> {
        self.read_range(0, self.len(), store)
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Blob {}

impl PartialOrd for Blob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Blob {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Blob::Flat(a), Blob::Flat(b)) => a.cmp(b),
            (Blob::Flat(_), Blob::Compound(_)) => Ordering::Less,
            (Blob::Compound(_), Blob::Flat(_)) => Ordering::Greater,
            (Blob::Compound(a), Blob::Compound(b)) => a
                .total_len()
                .cmp(&b.total_len())
                .then_with(|| a.offsets().cmp(b.offsets()))
                .then_with(|| a.children().cmp(b.children())),
        }
    }
}

/// A blob assembled from N ≥ 1 child chunks.
///
/// `offsets[i]` is the starting byte position of `children[i]` within the
/// blob; offsets are strictly ascending and start at 0, and there is exactly
/// one offset per child. Built once at encode time, immutable thereafter;
/// reads resolve only the children covering the requested range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompoundBlob {
    total_len: u64,
    offsets: Vec<u64>,
    children: Vec<Future>,
}

impl CompoundBlob {
    pub fn new(total_len: u64, offsets: Vec<u64>, children: Vec<Future>) -> CodecResult<Self> {
        if offsets.is_empty() {
            return Err(CodecError::InvalidCompoundBlob(
                "compound blob must have at least one chunk".into(),
            ));
        }
        if offsets.len() != children.len() {
            return Err(CodecError::InvalidCompoundBlob(format!(
                "offset/child arity mismatch: {} offsets, {} children",
                offsets.len(),
                children.len()
            )));
        }
        if offsets[0] != 0 {
            return Err(CodecError::InvalidCompoundBlob(format!(
                "first offset must be 0, got {}",
                offsets[0]
            )));
        }
        for pair in offsets.windows(2) {
            if pair[1] <= pair[0] {
                return Err(CodecError::InvalidCompoundBlob(format!(
                    "offsets must be strictly ascending, got {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        Ok(Self {
            total_len,
            offsets,
            children,
        })
    }

    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn children(&self) -> &[Future] {
        &self.children
    }

    /// Read the clamped half-open range `[start, end)`.
    fn read_range(&self, start: u64, end: u64, store: &dyn ChunkStore) -> CodecResult<Vec<u8>> {
        // Index of the child containing `start`.
        let mut i = self.offsets.partition_point(|&o| o <= start) - 1;
        let mut out = Vec::with_capacity((end - start) as usize);
        let mut pos = start;
        while pos < end && i < self.children.len() {
            let child_start = self.offsets[i];
            let child_end = self
                .offsets
                .get(i + 1)
                .copied()
                .unwrap_or(self.total_len);
            let child = match self.children[i].resolve(store)? {
                Value::Blob(b) => b,
                other => {
                    return Err(CodecError::Decode(format!(
                        "compound blob child resolved to {:?}, expected a blob",
                        other.kind()
                    )))
                }
            };
            let sub_start = pos - child_start;
            let sub_len = end.min(child_end) - pos;
            out.extend(child.read_range(sub_start, sub_len, store)?);
            pos = child_end;
            i += 1;
        }
        Ok(out)
    }
}

/// Policy for splitting a byte source into blob chunks.
pub trait Chunker {
    /// Split `data` into contiguous, in-order chunks covering all of it.
    fn split<'a>(&self, data: &'a [u8]) -> Vec<&'a [u8]>;
}

/// Splits at fixed byte boundaries; the final chunk may be short.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizeChunker {
    size: usize,
}

impl FixedSizeChunker {
    /// `size` must be non-zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "chunk size must be non-zero");
        Self { size }
    }
}

impl Chunker for FixedSizeChunker {
    fn split<'a>(&self, data: &'a [u8]) -> Vec<&'a [u8]> {
        data.chunks(self.size).collect()
    }
}

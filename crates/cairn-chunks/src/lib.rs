//! Content-addressed chunk storage for Cairn.
//!
//! A chunk is an opaque byte sequence keyed by the [`Ref`](cairn_hash::Ref)
//! of its content. The store never interprets chunk contents — it is a pure
//! content-addressed key/value store. The value layer (`cairn-types`) writes
//! canonical encodings through [`ChunkStore::put`] and resolves refs through
//! [`ChunkStore::get`].
//!
//! # Modules
//!
//! - [`error`] — Error types for chunk operations
//! - [`traits`] — The [`ChunkStore`] trait defining the storage interface
//! - [`memory`] — In-memory [`MemoryChunkStore`] for tests and embedding

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{ChunkError, ChunkResult};
pub use memory::MemoryChunkStore;
pub use traits::ChunkStore;

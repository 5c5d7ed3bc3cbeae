//! The Cairn value model and its canonical wire encoding.
//!
//! Cairn values form a closed set of immutable kinds: booleans, numbers
//! (canonical and fixed-width), strings, blobs, lists, maps, sets, named
//! structs, typed refs, and types themselves. Every value has a canonical
//! chunk encoding; the SHA-1 digest of that encoding is its [`Ref`], which is
//! what makes equal values deduplicate in the chunk store.
//!
//! # Key pieces
//!
//! - [`Value`] — the closed, immutable value enum with structural equality
//!   and a total order
//! - [`Type`] — structural type descriptors, including named struct types
//!   with [`Type::Cycle`] back references for self-referential shapes
//! - [`Future`] — a memoizing handle to a value that may be resident or
//!   backed by a [`Ref`] in a chunk store
//! - [`Blob`] / [`CompoundBlob`] — flat or chunk-assembled byte sequences
//! - [`codec`] — the tagged wire grammar (`b <bytes>` and `j <json>` chunks)
//! - [`write_value`] / [`read_value`] — the store-aware encode/decode paths
//!
//! [`Ref`]: cairn_hash::Ref

pub mod blob;
pub mod codec;
pub mod collections;
pub mod error;
pub mod future;
pub mod kind;
pub mod typ;
pub mod value;
pub mod write;

pub use blob::{Blob, Chunker, CompoundBlob, FixedSizeChunker};
pub use codec::{decode, encode};
pub use collections::{Map, Set, Struct};
pub use error::{CodecError, CodecResult};
pub use future::Future;
pub use kind::Kind;
pub use typ::{StructType, Type, TypeBuilder};
pub use value::Value;
pub use write::{read_value, write_value};

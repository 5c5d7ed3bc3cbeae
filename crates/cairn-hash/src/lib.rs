//! Content-addressed references for Cairn.
//!
//! A [`Ref`] is the SHA-1 digest of a value's canonical chunk encoding.
//! Identical encodings always produce the same `Ref`, which is what makes
//! values deduplicatable and verifiable. Every other Cairn crate depends on
//! `cairn-hash`.

pub mod error;
pub mod reference;

pub use error::HashError;
pub use reference::Ref;

//! Store-aware encode/decode: values in, refs out, and back.

use cairn_chunks::ChunkStore;
use cairn_hash::Ref;
use tracing::debug;

use crate::blob::Blob;
use crate::codec;
use crate::collections::{Map, Set, Struct};
use crate::error::{CodecError, CodecResult};
use crate::future::Future;
use crate::value::Value;

/// Write a value's canonical encoding through the chunk store and return its
/// ref. Equal values share one chunk.
///
/// Flat blobs nested inside containers have no inline encoding; they are
/// first written as their own `b ` chunks and replaced by refs, bottom-up.
pub fn write_value(value: &Value, store: &dyn ChunkStore) -> CodecResult<Ref> {
    let prepared = chunk_nested_blobs(value, store, true)?;
    let bytes = codec::encode(&prepared)?;
    let r = store.put(&bytes)?;
    debug!(r = %r.short_hex(), len = bytes.len(), "wrote value");
    Ok(r)
}

/// Read and decode the value a ref addresses.
///
/// A store miss is [`CodecError::ChunkNotFound`].
pub fn read_value(r: &Ref, store: &dyn ChunkStore) -> CodecResult<Value> {
    let bytes = store.get(r)?.ok_or(CodecError::ChunkNotFound(*r))?;
    codec::decode(&bytes)
}

fn chunk_nested_blobs(
    value: &Value,
    store: &dyn ChunkStore,
    top_level: bool,
) -> CodecResult<Value> {
    Ok(match value {
        Value::Blob(Blob::Flat(_)) if !top_level => {
            let bytes = codec::encode(value)?;
            Value::Ref(Future::from_ref(store.put(&bytes)?))
        }
        Value::List(elems) => Value::List(
            elems
                .iter()
                .map(|e| chunk_nested_blobs(e, store, false))
                .collect::<CodecResult<_>>()?,
        ),
        Value::Map(m) => Value::Map(Map::from_entries(
            m.iter()
                .map(|(k, v)| {
                    Ok((
                        chunk_nested_blobs(k, store, false)?,
                        chunk_nested_blobs(v, store, false)?,
                    ))
                })
                .collect::<CodecResult<Vec<_>>>()?,
        )),
        Value::Set(s) => Value::Set(Set::from_elems(
            s.iter()
                .map(|e| chunk_nested_blobs(e, store, false))
                .collect::<CodecResult<Vec<_>>>()?,
        )),
        Value::Struct(st) => Value::Struct(Struct::new(
            st.name(),
            st.fields()
                .map(|(n, v)| Ok((n.to_string(), chunk_nested_blobs(v, store, false)?)))
                .collect::<CodecResult<Vec<_>>>()?,
        )),
        other => other.clone(),
    })
}

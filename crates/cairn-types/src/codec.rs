//! The canonical tagged wire codec.
//!
//! A chunk is either a flat blob, `b ` followed by the raw bytes, or a JSON
//! unit, `j ` followed by one JSON value and a newline. The JSON grammar maps
//! every value kind to exactly one shape, and encoding is canonical: struct
//! fields in name order, map entries in key order, set elements in element
//! order, numbers in their shortest round-trip form. Re-encoding a decoded
//! value reproduces the bytes it was decoded from.
//!
//! Decoding is atomic: any grammar or invariant violation fails the whole
//! decode and no partially-built value is returned.

use serde_json::{Number as JsonNumber, Value as Json};

use crate::blob::{Blob, CompoundBlob};
use crate::collections::{Map, Set, Struct};
use crate::error::{CodecError, CodecResult};
use crate::future::Future;
use crate::kind::Kind;
use crate::typ::{StructType, Type};
use crate::value::Value;

const BLOB_TAG: &[u8] = b"b ";
const JSON_TAG: &[u8] = b"j ";

/// Encode a value to its canonical chunk bytes.
///
/// A flat blob becomes a `b ` chunk; everything else becomes a `j ` unit.
/// Flat blobs nested inside other values have no inline shape and fail with
/// [`CodecError::NestedBlob`]; route such values through
/// [`write_value`](crate::write_value) instead.
pub fn encode(value: &Value) -> CodecResult<Vec<u8>> {
    if let Value::Blob(Blob::Flat(bytes)) = value {
        let mut out = Vec::with_capacity(BLOB_TAG.len() + bytes.len());
        out.extend_from_slice(BLOB_TAG);
        out.extend_from_slice(bytes);
        return Ok(out);
    }
    let json = to_json(value)?;
    let text = serde_json::to_string(&json).expect("serializing a JSON tree cannot fail");
    let mut out = Vec::with_capacity(JSON_TAG.len() + text.len() + 1);
    out.extend_from_slice(JSON_TAG);
    out.extend_from_slice(text.as_bytes());
    out.push(b'\n');
    Ok(out)
}

/// Decode chunk bytes into a value.
pub fn decode(bytes: &[u8]) -> CodecResult<Value> {
    if let Some(rest) = bytes.strip_prefix(BLOB_TAG) {
        return Ok(Value::Blob(Blob::Flat(rest.to_vec())));
    }
    if let Some(rest) = bytes.strip_prefix(JSON_TAG) {
        let json: Json = serde_json::from_slice(rest)
            .map_err(|e| CodecError::Decode(format!("invalid JSON unit: {e}")))?;
        return from_json(&json);
    }
    Err(CodecError::Decode(
        "chunk does not start with a known tag".into(),
    ))
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn tagged(tag: &str, inner: Json) -> Json {
    let mut obj = serde_json::Map::with_capacity(1);
    obj.insert(tag.to_string(), inner);
    Json::Object(obj)
}

fn to_json(value: &Value) -> CodecResult<Json> {
    Ok(match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(f) => Json::Number(
            JsonNumber::from_f64(*f).ok_or(CodecError::NonFiniteNumber(*f))?,
        ),
        Value::Int8(n) => tagged("int8", Json::from(*n)),
        Value::Int16(n) => tagged("int16", Json::from(*n)),
        Value::Int32(n) => tagged("int32", Json::from(*n)),
        Value::Int64(n) => tagged("int64", Json::from(*n)),
        Value::UInt8(n) => tagged("uint8", Json::from(*n)),
        Value::UInt16(n) => tagged("uint16", Json::from(*n)),
        Value::UInt32(n) => tagged("uint32", Json::from(*n)),
        Value::UInt64(n) => tagged("uint64", Json::from(*n)),
        Value::Float32(f) => tagged("float32", Json::Number(shortest_number(*f as f64, &f.to_string())?)),
        Value::Float64(f) => tagged("float64", Json::Number(shortest_number(*f, &f.to_string())?)),
        Value::String(s) => Json::String(s.clone()),
        Value::Blob(Blob::Flat(_)) => return Err(CodecError::NestedBlob),
        Value::Blob(Blob::Compound(cb)) => tagged("cb", compound_to_json(cb)),
        Value::List(elems) => tagged(
            "list",
            Json::Array(elems.iter().map(to_json).collect::<CodecResult<_>>()?),
        ),
        Value::Map(m) => {
            let mut flat = Vec::with_capacity(m.len() * 2);
            for (k, v) in m.iter() {
                flat.push(to_json(k)?);
                flat.push(to_json(v)?);
            }
            tagged("map", Json::Array(flat))
        }
        Value::Set(s) => tagged(
            "set",
            Json::Array(s.iter().map(to_json).collect::<CodecResult<_>>()?),
        ),
        Value::Struct(st) => {
            let mut parts = Vec::with_capacity(1 + st.len() * 2);
            parts.push(Json::String(st.name().to_string()));
            for (name, v) in st.fields() {
                parts.push(Json::String(name.to_string()));
                parts.push(to_json(v)?);
            }
            tagged("struct", Json::Array(parts))
        }
        Value::Ref(fut) => tagged("ref", Json::String(fut.digest().to_string())),
        Value::Type(t) => tagged("type", type_to_json(t)),
    })
}

/// Canonical number form: the shortest decimal that round-trips the source
/// float, as produced by its `Display` impl.
fn shortest_number(check_finite: f64, formatted: &str) -> CodecResult<JsonNumber> {
    if !check_finite.is_finite() {
        return Err(CodecError::NonFiniteNumber(check_finite));
    }
    formatted
        .parse()
        .map_err(|_| CodecError::NonFiniteNumber(check_finite))
}

fn compound_to_json(cb: &CompoundBlob) -> Json {
    let mut parts = Vec::with_capacity(1 + cb.offsets().len() * 2);
    parts.push(Json::from(cb.total_len()));
    for (offset, child) in cb.offsets().iter().zip(cb.children()) {
        parts.push(Json::from(*offset));
        parts.push(tagged("ref", Json::String(child.digest().to_string())));
    }
    Json::Array(parts)
}

fn type_to_json(t: &Type) -> Json {
    match t {
        Type::Primitive(k) => Json::String(k.name().to_string()),
        Type::Any => Json::String("any".to_string()),
        Type::List(e) => tagged("list", type_to_json(e)),
        Type::Map(k, v) => tagged("map", Json::Array(vec![type_to_json(k), type_to_json(v)])),
        Type::Set(e) => tagged("set", type_to_json(e)),
        Type::Ref(e) => tagged("ref", type_to_json(e)),
        Type::Struct(st) => {
            let mut parts = Vec::with_capacity(1 + st.fields().len() * 2);
            parts.push(Json::String(st.name().to_string()));
            for (name, ft) in st.fields() {
                parts.push(Json::String(name.clone()));
                parts.push(type_to_json(ft));
            }
            tagged("struct", Json::Array(parts))
        }
        Type::Cycle(name) => tagged("cycle", Json::String(name.clone())),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn from_json(json: &Json) -> CodecResult<Value> {
    match json {
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(Value::Number(n.as_f64().ok_or_else(|| {
            CodecError::Decode(format!("unrepresentable number: {n}"))
        })?)),
        Json::Object(obj) => {
            let (tag, inner) = single_entry(obj)?;
            from_tagged(tag, inner)
        }
        other => Err(CodecError::Decode(format!(
            "unexpected JSON shape: {other}"
        ))),
    }
}

fn single_entry(obj: &serde_json::Map<String, Json>) -> CodecResult<(&str, &Json)> {
    let mut entries = obj.iter();
    match (entries.next(), entries.next()) {
        (Some((k, v)), None) => Ok((k.as_str(), v)),
        _ => Err(CodecError::Decode(format!(
            "expected a single-key object, got {} keys",
            obj.len()
        ))),
    }
}

fn from_tagged(tag: &str, inner: &Json) -> CodecResult<Value> {
    match tag {
        "int8" => Ok(Value::Int8(narrow_int(tag, inner)?)),
        "int16" => Ok(Value::Int16(narrow_int(tag, inner)?)),
        "int32" => Ok(Value::Int32(narrow_int(tag, inner)?)),
        "int64" => Ok(Value::Int64(signed_int(tag, inner)?)),
        "uint8" => Ok(Value::UInt8(narrow_uint(tag, inner)?)),
        "uint16" => Ok(Value::UInt16(narrow_uint(tag, inner)?)),
        "uint32" => Ok(Value::UInt32(narrow_uint(tag, inner)?)),
        "uint64" => Ok(Value::UInt64(unsigned_int(tag, inner)?)),
        "float32" => Ok(Value::Float32(narrow_float(tag, inner)?)),
        "float64" => Ok(Value::Float64(float(tag, inner)?)),
        "list" => Ok(Value::List(
            elements(tag, inner)?
                .iter()
                .map(from_json)
                .collect::<CodecResult<_>>()?,
        )),
        "map" => {
            let elems = elements(tag, inner)?;
            if elems.len() % 2 != 0 {
                return Err(CodecError::Decode(format!(
                    "map requires an even number of elements, got {}",
                    elems.len()
                )));
            }
            let entries = elems
                .chunks(2)
                .map(|pair| Ok((from_json(&pair[0])?, from_json(&pair[1])?)))
                .collect::<CodecResult<Vec<_>>>()?;
            Ok(Value::Map(Map::from_entries(entries)))
        }
        "set" => Ok(Value::Set(Set::from_elems(
            elements(tag, inner)?
                .iter()
                .map(from_json)
                .collect::<CodecResult<Vec<_>>>()?,
        ))),
        "ref" => {
            let text = inner.as_str().ok_or_else(|| {
                CodecError::Decode(format!("ref requires a string, got {inner}"))
            })?;
            let r = cairn_hash::Ref::parse(text)?;
            Ok(Value::Ref(Future::from_ref(r)))
        }
        "cb" => compound_from_json(elements(tag, inner)?),
        "struct" => {
            let parts = elements(tag, inner)?;
            let name = parts
                .first()
                .and_then(Json::as_str)
                .ok_or_else(|| CodecError::Decode("struct requires a leading name".into()))?;
            if parts[1..].len() % 2 != 0 {
                return Err(CodecError::Decode(
                    "struct fields require name/value pairs".into(),
                ));
            }
            let fields = parts[1..]
                .chunks(2)
                .map(|pair| {
                    let field = pair[0].as_str().ok_or_else(|| {
                        CodecError::Decode(format!("struct field name must be a string, got {}", pair[0]))
                    })?;
                    Ok((field.to_string(), from_json(&pair[1])?))
                })
                .collect::<CodecResult<Vec<_>>>()?;
            Ok(Value::Struct(Struct::new(name, fields)))
        }
        "type" => Ok(Value::Type(type_from_json(inner)?)),
        other => Err(CodecError::Decode(format!("unknown tag {other:?}"))),
    }
}

fn elements<'a>(tag: &str, inner: &'a Json) -> CodecResult<&'a [Json]> {
    inner
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| CodecError::Decode(format!("{tag} requires an array, got {inner}")))
}

fn signed_int(tag: &str, inner: &Json) -> CodecResult<i64> {
    inner
        .as_i64()
        .ok_or_else(|| CodecError::Decode(format!("{tag} requires an integer, got {inner}")))
}

fn unsigned_int(tag: &str, inner: &Json) -> CodecResult<u64> {
    inner.as_u64().ok_or_else(|| {
        CodecError::Decode(format!(
            "{tag} requires a non-negative integer, got {inner}"
        ))
    })
}

fn narrow_int<T: TryFrom<i64>>(tag: &str, inner: &Json) -> CodecResult<T> {
    let wide = signed_int(tag, inner)?;
    T::try_from(wide).map_err(|_| CodecError::Decode(format!("{tag} out of range: {wide}")))
}

fn narrow_uint<T: TryFrom<u64>>(tag: &str, inner: &Json) -> CodecResult<T> {
    let wide = unsigned_int(tag, inner)?;
    T::try_from(wide).map_err(|_| CodecError::Decode(format!("{tag} out of range: {wide}")))
}

fn float(tag: &str, inner: &Json) -> CodecResult<f64> {
    inner
        .as_f64()
        .ok_or_else(|| CodecError::Decode(format!("{tag} requires a number, got {inner}")))
}

/// Narrow to f32, rejecting values outside its finite domain. An overflow
/// would otherwise produce an infinity with no canonical encoding.
fn narrow_float(tag: &str, inner: &Json) -> CodecResult<f32> {
    let wide = float(tag, inner)?;
    let narrow = wide as f32;
    if !narrow.is_finite() {
        return Err(CodecError::Decode(format!("{tag} out of range: {wide}")));
    }
    Ok(narrow)
}

/// Decode the compound-blob array `[total, off0, ref0, off1, ref1, ...]`.
///
/// Enforces, in order: odd length with at least one pair; a non-negative
/// integer total; non-negative integer offsets that start at 0 and strictly
/// ascend; `{"ref": ...}` wrappers with well-formed ref text. Any violation
/// aborts the whole decode.
fn compound_from_json(parts: &[Json]) -> CodecResult<Value> {
    if parts.len() < 3 || parts.len() % 2 == 0 {
        return Err(CodecError::InvalidCompoundBlob(format!(
            "expected 1 + 2N elements with N >= 1, got {}",
            parts.len()
        )));
    }
    let total = parts[0].as_u64().ok_or_else(|| {
        CodecError::InvalidCompoundBlob(format!(
            "total length must be a non-negative integer, got {}",
            parts[0]
        ))
    })?;

    let mut offsets = Vec::with_capacity(parts.len() / 2);
    let mut children = Vec::with_capacity(parts.len() / 2);
    for pair in parts[1..].chunks(2) {
        let offset = pair[0].as_u64().ok_or_else(|| {
            CodecError::InvalidCompoundBlob(format!(
                "offset must be a non-negative integer, got {}",
                pair[0]
            ))
        })?;
        match offsets.last() {
            None if offset != 0 => {
                return Err(CodecError::InvalidCompoundBlob(format!(
                    "first offset must be 0, got {offset}"
                )))
            }
            Some(&prev) if offset <= prev => {
                return Err(CodecError::InvalidCompoundBlob(format!(
                    "offsets must be strictly ascending, got {offset} after {prev}"
                )))
            }
            _ => {}
        }

        let obj = pair[1].as_object().ok_or_else(|| {
            CodecError::InvalidCompoundBlob(format!("expected a ref object, got {}", pair[1]))
        })?;
        let (tag, inner) = single_entry(obj)?;
        if tag != "ref" {
            return Err(CodecError::InvalidCompoundBlob(format!(
                "expected a ref object, got tag {tag:?}"
            )));
        }
        let text = inner.as_str().ok_or_else(|| {
            CodecError::InvalidCompoundBlob(format!("ref requires a string, got {inner}"))
        })?;
        let r = cairn_hash::Ref::parse(text)?;

        offsets.push(offset);
        children.push(Future::from_ref(r));
    }

    let cb = CompoundBlob::new(total, offsets, children)?;
    Ok(Value::Blob(Blob::Compound(cb)))
}

fn type_from_json(json: &Json) -> CodecResult<Type> {
    match json {
        Json::String(s) if s == "any" => Ok(Type::Any),
        Json::String(s) => Kind::primitive_from_name(s)
            .map(Type::Primitive)
            .ok_or_else(|| CodecError::Decode(format!("unknown primitive kind {s:?}"))),
        Json::Object(obj) => {
            let (tag, inner) = single_entry(obj)?;
            match tag {
                "list" => Ok(Type::list(type_from_json(inner)?)),
                "set" => Ok(Type::set(type_from_json(inner)?)),
                "ref" => Ok(Type::reference(type_from_json(inner)?)),
                "map" => {
                    let parts = elements(tag, inner)?;
                    if parts.len() != 2 {
                        return Err(CodecError::Decode(format!(
                            "map type requires [key, value], got {} elements",
                            parts.len()
                        )));
                    }
                    Ok(Type::map(type_from_json(&parts[0])?, type_from_json(&parts[1])?))
                }
                "struct" => {
                    let parts = elements(tag, inner)?;
                    let name = parts
                        .first()
                        .and_then(Json::as_str)
                        .ok_or_else(|| CodecError::Decode("struct type requires a leading name".into()))?;
                    if parts[1..].len() % 2 != 0 {
                        return Err(CodecError::Decode(
                            "struct type fields require name/type pairs".into(),
                        ));
                    }
                    let fields = parts[1..]
                        .chunks(2)
                        .map(|pair| {
                            let field = pair[0].as_str().ok_or_else(|| {
                                CodecError::Decode(format!(
                                    "struct type field name must be a string, got {}",
                                    pair[0]
                                ))
                            })?;
                            Ok((field.to_string(), type_from_json(&pair[1])?))
                        })
                        .collect::<CodecResult<Vec<_>>>()?;
                    Ok(Type::Struct(StructType::new(name, fields)))
                }
                "cycle" => {
                    let name = inner.as_str().ok_or_else(|| {
                        CodecError::Decode(format!("cycle requires a string, got {inner}"))
                    })?;
                    Ok(Type::Cycle(name.to_string()))
                }
                other => Err(CodecError::Decode(format!("unknown type tag {other:?}"))),
            }
        }
        other => Err(CodecError::Decode(format!(
            "unexpected type shape: {other}"
        ))),
    }
}

//! Conversions from model values back into native Rust shapes.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use cairn_types::{Blob, Map, Set, Struct, Type, Value};

use crate::error::{MarshalError, MarshalResult};

/// Conversion from a model value into a native Rust shape; the read half of
/// [`ToNative`](crate::ToNative).
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> MarshalResult<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> MarshalError {
    MarshalError::TypeMismatch {
        expected,
        actual: value.kind(),
    }
}

/// Any numeric kind, widened to `f64`.
fn numeric(value: &Value) -> Option<f64> {
    Some(match value {
        Value::Number(n) | Value::Float64(n) => *n,
        Value::Float32(n) => f64::from(*n),
        Value::Int8(n) => f64::from(*n),
        Value::Int16(n) => f64::from(*n),
        Value::Int32(n) => f64::from(*n),
        Value::Int64(n) => *n as f64,
        Value::UInt8(n) => f64::from(*n),
        Value::UInt16(n) => f64::from(*n),
        Value::UInt32(n) => f64::from(*n),
        Value::UInt64(n) => *n as f64,
        _ => return None,
    })
}

impl FromValue for bool {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }
}

// Numeric targets convert with `as`, the read-side half of the lossy f64
// contract: fractional values truncate toward zero and out-of-range values
// saturate at the target's bounds. Callers that need exactness should target
// f64 and narrow themselves.
macro_rules! numeric_from_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl FromValue for $ty {
            fn from_value(value: &Value) -> MarshalResult<Self> {
                numeric(value)
                    .map(|n| n as $ty)
                    .ok_or_else(|| mismatch("number", value))
            }
        }
    )+};
}

numeric_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl FromValue for String {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl FromValue for () {
    fn from_value(_: &Value) -> MarshalResult<Self> {
        Ok(())
    }
}

/// The value a set element stands for on the map side of a set round-trip:
/// what the unit type marshals to.
fn unit_value() -> Value {
    Value::Struct(Struct::new("", Vec::<(String, Value)>::new()))
}

/// Sequences accept both lists and sets, so a `set`-tagged field unmarshals
/// from its own marshaled form.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::List(elems) => elems.iter().map(T::from_value).collect(),
            Value::Set(s) => s.iter().map(T::from_value).collect(),
            other => Err(mismatch("list", other)),
        }
    }
}

/// Mappings also accept sets, read as keys with unit values; a data-carrying
/// value type then reports the mismatch element-wise.
impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Map(m) => m
                .iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Set(s) => s
                .iter()
                .map(|k| Ok((K::from_value(k)?, V::from_value(&unit_value())?)))
                .collect(),
            other => Err(mismatch("map", other)),
        }
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Map(m) => m
                .iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Set(s) => s
                .iter()
                .map(|k| Ok((K::from_value(k)?, V::from_value(&unit_value())?)))
                .collect(),
            other => Err(mismatch("map", other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for Blob {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(mismatch("blob", other)),
        }
    }
}

impl FromValue for Map {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Map(m) => Ok(m.clone()),
            other => Err(mismatch("map", other)),
        }
    }
}

impl FromValue for Set {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Set(s) => Ok(s.clone()),
            other => Err(mismatch("set", other)),
        }
    }
}

impl FromValue for Struct {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Struct(s) => Ok(s.clone()),
            other => Err(mismatch("struct", other)),
        }
    }
}

impl FromValue for Type {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Type(t) => Ok(t.clone()),
            other => Err(mismatch("type", other)),
        }
    }
}

impl FromValue for Option<Type> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        Type::from_value(value).map(Some)
    }
}

impl FromValue for Option<Struct> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        Struct::from_value(value).map(Some)
    }
}

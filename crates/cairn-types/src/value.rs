use std::cmp::Ordering;

use crate::blob::Blob;
use crate::collections::{Map, Set, Struct};
use crate::future::Future;
use crate::kind::Kind;
use crate::typ::{StructType, Type};

/// An immutable, kind-tagged node in the closed value model.
///
/// `Number` is the canonical numeric kind used by the marshal layer; the
/// fixed-width kinds are retained for wire compatibility. Containers compare
/// structurally: lists are order-dependent, maps and sets are not. Refs
/// compare by digest, never by resolved target.
///
/// Values are totally ordered (kind rank, then content, floats by
/// `total_cmp`), which is what backs the sorted storage of [`Map`] and
/// [`Set`].
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Blob(Blob),
    List(Vec<Value>),
    Map(Map),
    Set(Set),
    Struct(Struct),
    Ref(Future),
    Type(Type),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::Int8(_) => Kind::Int8,
            Value::Int16(_) => Kind::Int16,
            Value::Int32(_) => Kind::Int32,
            Value::Int64(_) => Kind::Int64,
            Value::UInt8(_) => Kind::UInt8,
            Value::UInt16(_) => Kind::UInt16,
            Value::UInt32(_) => Kind::UInt32,
            Value::UInt64(_) => Kind::UInt64,
            Value::Float32(_) => Kind::Float32,
            Value::Float64(_) => Kind::Float64,
            Value::String(_) => Kind::String,
            Value::Blob(_) => Kind::Blob,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Set(_) => Kind::Set,
            Value::Struct(_) => Kind::Struct,
            Value::Ref(_) => Kind::Ref,
            Value::Type(_) => Kind::Type,
        }
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn list(elems: impl IntoIterator<Item = Value>) -> Value {
        Value::List(elems.into_iter().collect())
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        Value::Map(Map::from_entries(entries))
    }

    pub fn set(elems: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(Set::from_elems(elems))
    }

    /// The canonical structural type of this value.
    ///
    /// Element types of containers are joined across elements; empty
    /// containers yield [`Type::Any`] elements. Ref targets are typed `Any`
    /// without resolving.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Bool(_) => Type::BOOL,
            Value::Number(_) => Type::NUMBER,
            Value::Int8(_) => Type::Primitive(Kind::Int8),
            Value::Int16(_) => Type::Primitive(Kind::Int16),
            Value::Int32(_) => Type::Primitive(Kind::Int32),
            Value::Int64(_) => Type::Primitive(Kind::Int64),
            Value::UInt8(_) => Type::Primitive(Kind::UInt8),
            Value::UInt16(_) => Type::Primitive(Kind::UInt16),
            Value::UInt32(_) => Type::Primitive(Kind::UInt32),
            Value::UInt64(_) => Type::Primitive(Kind::UInt64),
            Value::Float32(_) => Type::Primitive(Kind::Float32),
            Value::Float64(_) => Type::Primitive(Kind::Float64),
            Value::String(_) => Type::STRING,
            Value::Blob(_) => Type::BLOB,
            Value::List(elems) => Type::list(join_types(elems.iter())),
            Value::Map(m) => Type::map(
                join_types(m.iter().map(|(k, _)| k)),
                join_types(m.iter().map(|(_, v)| v)),
            ),
            Value::Set(s) => Type::set(join_types(s.iter())),
            Value::Struct(st) => Type::Struct(StructType::new(
                st.name(),
                st.fields().map(|(n, v)| (n.to_string(), v.type_of())),
            )),
            Value::Ref(_) => Type::reference(Type::Any),
            Value::Type(_) => Type::TYPE,
        }
    }
}

fn join_types<'a>(values: impl Iterator<Item = &'a Value>) -> Type {
    values
        .map(Value::type_of)
        .reduce(Type::join)
        .unwrap_or(Type::Any)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Int8(a), Value::Int8(b)) => a.cmp(b),
            (Value::Int16(a), Value::Int16(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::UInt8(a), Value::UInt8(b)) => a.cmp(b),
            (Value::UInt16(a), Value::UInt16(b)) => a.cmp(b),
            (Value::UInt32(a), Value::UInt32(b)) => a.cmp(b),
            (Value::UInt64(a), Value::UInt64(b)) => a.cmp(b),
            (Value::Float32(a), Value::Float32(b)) => a.total_cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Struct(a), Value::Struct(b)) => a.cmp(b),
            (Value::Ref(a), Value::Ref(b)) => a.cmp(b),
            (Value::Type(a), Value::Type(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

//! The intermediate form between native Rust shapes and model values.

use cairn_types::{Blob, Map, Set, Struct, Type, TypeBuilder, Value};

use crate::error::{MarshalError, MarshalResult};

/// What a native Rust value looks like before it is committed to a model
/// value.
///
/// The indirection exists so field directives can still act on the shape:
/// `omitempty` needs to ask "is this empty?" and `set` needs to re-target a
/// sequence or a unit-valued mapping before either becomes a [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    Bool(bool),
    Number(f64),
    Text(String),
    /// The unit type; data-free map values collapse to this.
    Unit,
    Seq(Vec<Native>),
    Assoc {
        /// True when the value side of every entry is data-free, which is
        /// what lets the `set` directive keep only the keys.
        unit_values: bool,
        entries: Vec<(Native, Native)>,
    },
    /// Already a model value; passed through untouched.
    Value(Value),
    /// An absent optional model value. Empty for `omitempty`, an error to
    /// commit anywhere else.
    Absent,
    /// Carrier for an `original` field: the struct this record was
    /// unmarshaled from, if any.
    Original(Option<Struct>),
    /// A shape with no model representation. Escape hatch for hand-written
    /// [`ToNative`] impls whose shapes are only partially representable;
    /// committing it reports [`MarshalError::UnsupportedType`].
    Unsupported(&'static str),
}

impl Native {
    /// Emptiness as `omitempty` sees it: zero numbers, `false`, empty text
    /// and containers. A model value is never empty; it was built on
    /// purpose.
    pub fn is_empty(&self) -> bool {
        match self {
            Native::Bool(b) => !b,
            Native::Number(n) => *n == 0.0,
            Native::Text(s) => s.is_empty(),
            Native::Unit => true,
            Native::Seq(elems) => elems.is_empty(),
            Native::Assoc { entries, .. } => entries.is_empty(),
            Native::Value(_) => false,
            Native::Absent => true,
            Native::Original(_) => true,
            Native::Unsupported(_) => false,
        }
    }

    /// Commit to a model value. Sequences become lists, associations become
    /// maps; the `set` disposition goes through [`Native::into_set_value`]
    /// instead.
    pub fn into_value(self) -> MarshalResult<Value> {
        Ok(match self {
            Native::Bool(b) => Value::Bool(b),
            Native::Number(n) => Value::Number(n),
            Native::Text(s) => Value::String(s),
            // The unit type carries no data: an anonymous empty struct.
            Native::Unit => Value::Struct(Struct::new("", Vec::new())),
            Native::Seq(elems) => Value::List(
                elems
                    .into_iter()
                    .map(Native::into_value)
                    .collect::<MarshalResult<_>>()?,
            ),
            Native::Assoc { entries, .. } => Value::Map(Map::from_entries(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((k.into_value()?, v.into_value()?)))
                    .collect::<MarshalResult<Vec<_>>>()?,
            )),
            Native::Value(v) => v,
            Native::Absent => {
                return Err(MarshalError::UnsupportedType(
                    "absent optional value outside an omitempty field",
                ))
            }
            Native::Original(_) => {
                return Err(MarshalError::UnsupportedType(
                    "original struct carrier outside an original field",
                ))
            }
            Native::Unsupported(shape) => return Err(MarshalError::UnsupportedType(shape)),
        })
    }

    /// Commit under the `set` directive: a sequence becomes a set of its
    /// elements, a unit-valued association becomes a set of its keys. Any
    /// other shape ignores the directive.
    pub fn into_set_value(self) -> MarshalResult<Value> {
        match self {
            Native::Seq(elems) => Ok(Value::Set(Set::from_elems(
                elems
                    .into_iter()
                    .map(Native::into_value)
                    .collect::<MarshalResult<Vec<_>>>()?,
            ))),
            Native::Assoc {
                unit_values: true,
                entries,
            } => Ok(Value::Set(Set::from_elems(
                entries
                    .into_iter()
                    .map(|(k, _)| k.into_value())
                    .collect::<MarshalResult<Vec<_>>>()?,
            ))),
            other => other.into_value(),
        }
    }
}

/// Conversion from a native Rust shape into [`Native`], together with the
/// structural type the shape maps to.
///
/// `native_type` takes no receiver: the type is a property of the shape, not
/// of any particular value, which is what lets struct types be built before
/// any value exists (and lets recursive shapes close themselves off through
/// the [`TypeBuilder`]).
pub trait ToNative {
    /// True only for shapes that carry no data at all. Unit-valued maps use
    /// this to qualify for the `set` directive.
    const IS_UNIT: bool = false;

    fn to_native(&self) -> MarshalResult<Native>;

    fn native_type(builder: &mut TypeBuilder) -> MarshalResult<Type>;
}

impl ToNative for bool {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Bool(*self))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::BOOL)
    }
}

macro_rules! numeric_to_native {
    ($($ty:ty),+ $(,)?) => {$(
        impl ToNative for $ty {
            fn to_native(&self) -> MarshalResult<Native> {
                Ok(Native::Number(*self as f64))
            }

            fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
                Ok(Type::NUMBER)
            }
        }
    )+};
}

numeric_to_native!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl ToNative for String {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Text(self.clone()))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::STRING)
    }
}

impl ToNative for &str {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Text((*self).to_string()))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::STRING)
    }
}

impl ToNative for () {
    const IS_UNIT: bool = true;

    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Unit)
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::Any)
    }
}

impl<T: ToNative> ToNative for Vec<T> {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Seq(
            self.iter().map(T::to_native).collect::<MarshalResult<_>>()?,
        ))
    }

    fn native_type(builder: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::list(T::native_type(builder)?))
    }
}

impl<T: ToNative, const N: usize> ToNative for [T; N] {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Seq(
            self.iter().map(T::to_native).collect::<MarshalResult<_>>()?,
        ))
    }

    fn native_type(builder: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::list(T::native_type(builder)?))
    }
}

impl<K: ToNative, V: ToNative, S> ToNative for std::collections::HashMap<K, V, S> {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Assoc {
            unit_values: V::IS_UNIT,
            entries: self
                .iter()
                .map(|(k, v)| Ok((k.to_native()?, v.to_native()?)))
                .collect::<MarshalResult<_>>()?,
        })
    }

    fn native_type(builder: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::map(K::native_type(builder)?, V::native_type(builder)?))
    }
}

impl<K: ToNative, V: ToNative> ToNative for std::collections::BTreeMap<K, V> {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Assoc {
            unit_values: V::IS_UNIT,
            entries: self
                .iter()
                .map(|(k, v)| Ok((k.to_native()?, v.to_native()?)))
                .collect::<MarshalResult<_>>()?,
        })
    }

    fn native_type(builder: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::map(K::native_type(builder)?, V::native_type(builder)?))
    }
}

impl ToNative for Value {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Value(self.clone()))
    }

    // A dynamically typed slot; its static type is the top.
    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::Any)
    }
}

impl ToNative for Blob {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Value(Value::Blob(self.clone())))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::BLOB)
    }
}

impl ToNative for Map {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Value(Value::Map(self.clone())))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::map(Type::Any, Type::Any))
    }
}

impl ToNative for Set {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Value(Value::Set(self.clone())))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::set(Type::Any))
    }
}

impl ToNative for Struct {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Value(Value::Struct(self.clone())))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::Any)
    }
}

impl ToNative for Type {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Value(Value::Type(self.clone())))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::TYPE)
    }
}

/// An optional type value; `None` is absent rather than a zero value, so it
/// only survives under `omitempty`.
impl ToNative for Option<Type> {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(match self {
            Some(t) => Native::Value(Value::Type(t.clone())),
            None => Native::Absent,
        })
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::TYPE)
    }
}

/// The carrier type for `original` fields: holds the struct the record was
/// unmarshaled from, or `None` for a record built natively.
impl ToNative for Option<Struct> {
    fn to_native(&self) -> MarshalResult<Native> {
        Ok(Native::Original(self.clone()))
    }

    fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
        Ok(Type::Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn scalars_convert_directly() {
        assert_eq!(true.to_native().unwrap(), Native::Bool(true));
        assert_eq!(42i32.to_native().unwrap(), Native::Number(42.0));
        assert_eq!(1.5f64.to_native().unwrap(), Native::Number(1.5));
        assert_eq!(
            "hi".to_native().unwrap(),
            Native::Text("hi".to_string())
        );
    }

    #[test]
    fn unit_valued_maps_are_flagged() {
        let mut m: HashMap<String, ()> = HashMap::new();
        m.insert("a".to_string(), ());
        match m.to_native().unwrap() {
            Native::Assoc { unit_values, .. } => assert!(unit_values),
            other => panic!("expected assoc, got {other:?}"),
        }

        let mut d: HashMap<String, i32> = HashMap::new();
        d.insert("a".to_string(), 1);
        match d.to_native().unwrap() {
            Native::Assoc { unit_values, .. } => assert!(!unit_values),
            other => panic!("expected assoc, got {other:?}"),
        }
    }

    #[test]
    fn emptiness_follows_zero_values() {
        assert!(Native::Bool(false).is_empty());
        assert!(!Native::Bool(true).is_empty());
        assert!(Native::Number(0.0).is_empty());
        assert!(!Native::Number(0.5).is_empty());
        assert!(Native::Text(String::new()).is_empty());
        assert!(Native::Seq(vec![]).is_empty());
        assert!(Native::Absent.is_empty());
        // A model value was built on purpose, even when structurally empty.
        assert!(!Native::Value(Value::list(vec![])).is_empty());
    }

    #[test]
    fn set_disposition_retargets_sequences_and_unit_maps() {
        let seq = Native::Seq(vec![
            Native::Number(1.0),
            Native::Number(2.0),
            Native::Number(2.0),
        ]);
        assert_eq!(
            seq.into_set_value().unwrap(),
            Value::set(vec![Value::Number(1.0), Value::Number(2.0)])
        );

        let assoc = Native::Assoc {
            unit_values: true,
            entries: vec![(Native::Number(0.0), Native::Unit)],
        };
        assert_eq!(
            assoc.into_set_value().unwrap(),
            Value::set(vec![Value::Number(0.0)])
        );

        // Data-carrying maps ignore the directive.
        let data = Native::Assoc {
            unit_values: false,
            entries: vec![(Native::Text("k".into()), Native::Number(1.0))],
        };
        assert_eq!(
            data.into_set_value().unwrap(),
            Value::map(vec![(Value::string("k"), Value::Number(1.0))])
        );
    }

    #[test]
    fn absent_value_cannot_be_committed() {
        assert!(matches!(
            Native::Absent.into_value(),
            Err(MarshalError::UnsupportedType(_))
        ));
    }
}

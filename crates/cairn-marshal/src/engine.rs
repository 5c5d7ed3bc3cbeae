//! The marshal/unmarshal engine.

use std::any::TypeId;

use cairn_types::{Struct, Type, TypeBuilder, Value};

use crate::error::{MarshalError, MarshalResult};
use crate::native::{Native, ToNative};
use crate::record::Record;
use crate::shape::shape_of;

/// Marshal any native shape into a model value.
///
/// Model values pass through unchanged, so marshaling is idempotent.
pub fn marshal<T: ToNative>(value: &T) -> MarshalResult<Value> {
    value.to_native()?.into_value()
}

/// Marshal a record into a struct value, applying its field layout.
///
/// When the record carries an `original` field holding a source struct, the
/// output starts from that struct (keeping its name and unknown fields) and
/// the record's own fields overlay it.
pub fn marshal_record<T: Record>(record: &T) -> MarshalResult<Value> {
    let shape = shape_of::<T>()?;

    let mut original: Option<Struct> = None;
    let mut fields: Vec<(String, Value)> = Vec::with_capacity(shape.fields.len());
    for layout in &shape.fields {
        let native = record.field_native(layout.index)?;
        if layout.original {
            match native {
                Native::Original(source) => original = source,
                _ => {
                    return Err(MarshalError::UnsupportedType(
                        "original field must be Option<Struct>",
                    ))
                }
            }
            continue;
        }
        if layout.omit_empty && native.is_empty() {
            continue;
        }
        let value = if layout.as_set {
            native.into_set_value()?
        } else {
            native.into_value()?
        };
        fields.push((layout.name.clone(), value));
    }

    Ok(Value::Struct(match original {
        Some(source) => fields
            .into_iter()
            .fold(source, |st, (name, value)| st.with_field(name, value)),
        None => Struct::new(shape.name, fields),
    }))
}

/// Populate a record's fields from a struct value.
///
/// A field absent from the source is an error unless the layout marks it
/// `omitempty`, in which case the record keeps what it already holds. An
/// `original` field receives the source struct itself.
pub fn unmarshal<T: Record>(source: &Struct, target: &mut T) -> MarshalResult<()> {
    let shape = shape_of::<T>()?;
    for layout in &shape.fields {
        if layout.original {
            target.set_field(layout.index, &Value::Struct(source.clone()))?;
            continue;
        }
        match source.get(&layout.name) {
            Some(value) => target.set_field(layout.index, value)?,
            None if layout.omit_empty => {}
            None => return Err(MarshalError::MissingField(layout.name.clone())),
        }
    }
    Ok(())
}

/// The struct type of a record's shape, built inside an enclosing
/// [`TypeBuilder`] so recursive shapes close into cycle markers.
pub fn record_type<T: Record>(builder: &mut TypeBuilder) -> MarshalResult<Type> {
    let shape = shape_of::<T>()?;
    builder.named_struct(TypeId::of::<T>(), shape.name, |b| {
        shape
            .fields
            .iter()
            .filter(|layout| !layout.original)
            .map(|layout| {
                let ty = T::field_type(b, layout.index)?;
                let ty = if layout.as_set { set_directed(ty) } else { ty };
                Ok((layout.name.clone(), ty))
            })
            .collect()
    })
}

/// The struct type of a record's shape.
pub fn shape_type<T: Record>() -> MarshalResult<Type> {
    let mut builder = TypeBuilder::new();
    record_type::<T>(&mut builder)
}

// The type-level mirror of the `set` disposition: sequences become sets of
// their element type, unit-valued mappings become sets of their key type.
fn set_directed(ty: Type) -> Type {
    match ty {
        Type::List(elem) => Type::Set(elem),
        Type::Map(key, value) if *value == Type::Any => Type::Set(key),
        other => other,
    }
}

/// Override hook for shapes that marshal themselves.
///
/// Implementors return either a value or an error; there is no way to
/// produce neither. Wire it into [`ToNative`] with [`custom`].
pub trait Marshaler {
    fn marshal_value(&self) -> MarshalResult<Value>;
}

/// Adapt a [`Marshaler`] result into a [`Native`] for a hand-written
/// [`ToNative`] impl.
pub fn custom<T: Marshaler>(value: &T) -> MarshalResult<Native> {
    Ok(Native::Value(value.marshal_value()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_record;
    use crate::FromValue;
    use cairn_types::Kind;
    use std::collections::HashMap;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn field(name: &str, value: Value) -> (String, Value) {
        (name.to_string(), value)
    }

    // --- Plain records -----------------------------------------------------

    #[derive(Default)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl_record!(Point("Point") {
        x: i64 => "",
        y: i64 => "",
    });

    #[test]
    fn record_marshals_to_named_struct() {
        let v = marshal(&Point { x: 3, y: -4 }).unwrap();
        assert_eq!(
            v,
            Value::Struct(Struct::new(
                "Point",
                vec![field("x", num(3.0)), field("y", num(-4.0))],
            ))
        );
    }

    #[test]
    fn marshal_is_idempotent_on_model_values() {
        let v = Value::map(vec![(Value::string("k"), num(1.0))]);
        assert_eq!(marshal(&v).unwrap(), v);
        assert_eq!(marshal(&marshal(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn unmarshal_roundtrips_a_record() {
        let v = marshal(&Point { x: 1, y: 2 }).unwrap();
        let source = match &v {
            Value::Struct(s) => s,
            other => panic!("expected struct, got {other:?}"),
        };
        let mut back = Point::default();
        unmarshal(source, &mut back).unwrap();
        assert_eq!((back.x, back.y), (1, 2));
    }

    #[test]
    fn unmarshal_requires_fields_without_omitempty() {
        let source = Struct::new("Point", vec![field("x", num(9.0))]);
        let mut p = Point::default();
        assert!(matches!(
            unmarshal(&source, &mut p),
            Err(MarshalError::MissingField(name)) if name == "y"
        ));
    }

    #[test]
    fn unmarshal_skips_absent_omitempty_fields() {
        let source = Struct::new("Sparse", vec![field("count", num(5.0))]);
        let mut s = Sparse {
            label: "stays".to_string(),
            ..Sparse::default()
        };
        unmarshal(&source, &mut s).unwrap();
        assert_eq!(s.count, 5);
        assert_eq!(s.label, "stays");
        assert_eq!(s.attached, None);
    }

    // --- Tag handling ------------------------------------------------------

    #[derive(Default)]
    struct Tagged {
        renamed: String,
        hidden: i64,
        kept: bool,
    }

    impl_record!(Tagged("Tagged") {
        renamed: String => "foo",
        hidden: i64 => "-",
        kept: bool => "",
    });

    #[test]
    fn tags_rename_and_skip_fields() {
        let v = marshal(&Tagged {
            renamed: "hello".to_string(),
            hidden: 99,
            kept: true,
        })
        .unwrap();
        assert_eq!(
            v,
            Value::Struct(Struct::new(
                "Tagged",
                vec![field("foo", Value::string("hello")), field("kept", Value::Bool(true))],
            ))
        );
    }

    #[derive(Default)]
    struct BadName {
        f: i64,
    }

    impl_record!(BadName("BadName") {
        f: i64 => "1a",
    });

    #[test]
    fn digit_leading_rename_fails_to_marshal() {
        assert!(matches!(
            marshal(&BadName::default()),
            Err(MarshalError::InvalidFieldName(name)) if name == "1a"
        ));
    }

    #[derive(Default)]
    struct BadTag {
        f: i64,
    }

    impl_record!(BadTag("BadTag") {
        f: i64 => "field,notago",
    });

    #[test]
    fn unknown_directive_fails_to_marshal() {
        assert!(matches!(
            marshal(&BadTag::default()),
            Err(MarshalError::UnrecognizedTag(tag)) if tag == "notago"
        ));
    }

    // --- omitempty ---------------------------------------------------------

    #[derive(Default)]
    struct Sparse {
        count: i64,
        label: String,
        flag: bool,
        items: Vec<i64>,
        attached: Option<Type>,
    }

    impl_record!(Sparse("Sparse") {
        count: i64 => ",omitempty",
        label: String => ",omitempty",
        flag: bool => ",omitempty",
        items: Vec<i64> => ",omitempty",
        attached: Option<Type> => ",omitempty",
    });

    #[test]
    fn omitempty_drops_zero_values() {
        let v = marshal(&Sparse::default()).unwrap();
        assert_eq!(v, Value::Struct(Struct::new("Sparse", Vec::new())));
    }

    #[test]
    fn omitempty_keeps_nonzero_values() {
        let v = marshal(&Sparse {
            count: 1,
            label: String::new(),
            flag: true,
            items: vec![2],
            attached: Some(Type::NUMBER),
        })
        .unwrap();
        assert_eq!(
            v,
            Value::Struct(Struct::new(
                "Sparse",
                vec![
                    field("count", num(1.0)),
                    field("flag", Value::Bool(true)),
                    field("items", Value::list(vec![num(2.0)])),
                    field("attached", Value::Type(Type::NUMBER)),
                ],
            ))
        );
    }

    // --- set disposition ---------------------------------------------------

    #[derive(Default)]
    struct Sets {
        seq: Vec<i64>,
        members: HashMap<i64, ()>,
        lookup: HashMap<String, i64>,
    }

    impl_record!(Sets("Sets") {
        seq: Vec<i64> => ",set",
        members: HashMap<i64, ()> => ",set",
        lookup: HashMap<String, i64> => ",set",
    });

    #[test]
    fn set_directive_builds_sets_from_sequences_and_unit_maps() {
        let mut members = HashMap::new();
        members.insert(1i64, ());
        members.insert(2i64, ());
        let mut lookup = HashMap::new();
        lookup.insert("a".to_string(), 1i64);

        let v = marshal(&Sets {
            seq: vec![1, 2, 2, 3],
            members,
            lookup,
        })
        .unwrap();
        assert_eq!(
            v,
            Value::Struct(Struct::new(
                "Sets",
                vec![
                    field("seq", Value::set(vec![num(1.0), num(2.0), num(3.0)])),
                    field("members", Value::set(vec![num(1.0), num(2.0)])),
                    // Data-carrying maps ignore the directive.
                    field(
                        "lookup",
                        Value::map(vec![(Value::string("a"), num(1.0))]),
                    ),
                ],
            ))
        );
    }

    #[test]
    fn set_tagged_fields_unmarshal_from_their_own_output() {
        let mut members = HashMap::new();
        members.insert(1i64, ());
        members.insert(2i64, ());
        let mut lookup = HashMap::new();
        lookup.insert("a".to_string(), 1i64);

        let v = marshal(&Sets {
            seq: vec![1, 2, 2, 3],
            members,
            lookup,
        })
        .unwrap();
        let source = match &v {
            Value::Struct(s) => s.clone(),
            other => panic!("expected struct, got {other:?}"),
        };

        let mut back = Sets::default();
        unmarshal(&source, &mut back).unwrap();
        // The set collapsed the duplicate on the way out.
        assert_eq!(back.seq, vec![1, 2, 3]);
        assert_eq!(back.members.len(), 2);
        assert!(back.members.contains_key(&1) && back.members.contains_key(&2));
        assert_eq!(back.lookup.get("a"), Some(&1));
    }

    #[test]
    fn set_directive_is_reflected_in_the_shape_type() {
        let ty = shape_type::<Sets>().unwrap();
        let st = match ty {
            Type::Struct(st) => st,
            other => panic!("expected struct type, got {other:?}"),
        };
        assert_eq!(st.field("seq"), Some(&Type::set(Type::NUMBER)));
        assert_eq!(st.field("members"), Some(&Type::set(Type::NUMBER)));
        assert_eq!(
            st.field("lookup"),
            Some(&Type::map(Type::STRING, Type::NUMBER))
        );
    }

    // --- Recursive shapes --------------------------------------------------

    #[derive(Default)]
    struct Node {
        value: f64,
        children: Vec<Node>,
    }

    impl_record!(Node("Node") {
        value: f64 => "",
        children: Vec<Node> => "",
    });

    #[test]
    fn recursive_shape_type_closes_with_a_cycle() {
        let ty = shape_type::<Node>().unwrap();
        let st = match ty {
            Type::Struct(st) => st,
            other => panic!("expected struct type, got {other:?}"),
        };
        assert_eq!(st.name(), "Node");
        assert_eq!(st.field("value"), Some(&Type::NUMBER));
        assert_eq!(
            st.field("children"),
            Some(&Type::list(Type::Cycle("Node".to_string())))
        );
    }

    #[test]
    fn recursive_values_marshal_by_recursion() {
        let tree = Node {
            value: 1.0,
            children: vec![
                Node {
                    value: 2.0,
                    children: vec![],
                },
                Node {
                    value: 3.0,
                    children: vec![],
                },
            ],
        };
        let leaf = |n: f64| {
            Value::Struct(Struct::new(
                "Node",
                vec![field("value", num(n)), field("children", Value::list(vec![]))],
            ))
        };
        assert_eq!(
            marshal(&tree).unwrap(),
            Value::Struct(Struct::new(
                "Node",
                vec![
                    field("value", num(1.0)),
                    field("children", Value::list(vec![leaf(2.0), leaf(3.0)])),
                ],
            ))
        );
    }

    // --- Nested records ----------------------------------------------------

    #[derive(Default)]
    struct Inner {
        a: i64,
    }

    impl_record!(Inner("Inner") {
        a: i64 => "",
    });

    #[derive(Default)]
    struct Outer {
        inner: Inner,
        label: String,
    }

    impl_record!(Outer("Outer") {
        inner: Inner => "",
        label: String => "",
    });

    #[test]
    fn nested_records_marshal_and_unmarshal() {
        let v = marshal(&Outer {
            inner: Inner { a: 7 },
            label: "x".to_string(),
        })
        .unwrap();
        assert_eq!(
            v,
            Value::Struct(Struct::new(
                "Outer",
                vec![
                    field(
                        "inner",
                        Value::Struct(Struct::new("Inner", vec![field("a", num(7.0))])),
                    ),
                    field("label", Value::string("x")),
                ],
            ))
        );

        let source = match &v {
            Value::Struct(s) => s.clone(),
            _ => unreachable!(),
        };
        let mut back = Outer::default();
        unmarshal(&source, &mut back).unwrap();
        assert_eq!(back.inner.a, 7);
        assert_eq!(back.label, "x");
    }

    // --- Original carry-through --------------------------------------------

    #[derive(Default)]
    struct Versioned {
        foo: i64,
        original: Option<Struct>,
    }

    impl_record!(Versioned("S") {
        foo: i64 => "",
        original: Option<Struct> => ",original",
    });

    #[test]
    fn without_an_original_the_record_name_is_used() {
        let v = marshal(&Versioned {
            foo: 42,
            original: None,
        })
        .unwrap();
        assert_eq!(
            v,
            Value::Struct(Struct::new("S", vec![field("foo", num(42.0))]))
        );
    }

    #[test]
    fn original_preserves_unknown_fields_and_source_name() {
        let source = Struct::new(
            "Q",
            vec![field("foo", num(42.0)), field("extra", Value::string("keep"))],
        );
        let mut record = Versioned::default();
        unmarshal(&source, &mut record).unwrap();
        assert_eq!(record.foo, 42);

        record.foo = 43;
        let v = marshal(&record).unwrap();
        assert_eq!(
            v,
            Value::Struct(Struct::new(
                "Q",
                vec![field("foo", num(43.0)), field("extra", Value::string("keep"))],
            ))
        );
    }

    // --- Anonymous records -------------------------------------------------

    #[derive(Default)]
    struct Anon {
        n: i64,
    }

    impl_record!(Anon("") {
        n: i64 => "",
    });

    #[test]
    fn anonymous_records_marshal_with_an_empty_name() {
        let v = marshal(&Anon { n: 5 }).unwrap();
        assert_eq!(
            v,
            Value::Struct(Struct::new("", vec![field("n", num(5.0))]))
        );
    }

    // --- Custom marshalers -------------------------------------------------

    struct Celsius(f64);

    impl Marshaler for Celsius {
        fn marshal_value(&self) -> MarshalResult<Value> {
            if !self.0.is_finite() {
                return Err(MarshalError::Marshaler(
                    "temperature must be finite".to_string(),
                ));
            }
            Ok(Value::Number(self.0 + 273.15))
        }
    }

    impl ToNative for Celsius {
        fn to_native(&self) -> MarshalResult<Native> {
            custom(self)
        }

        fn native_type(_: &mut TypeBuilder) -> MarshalResult<Type> {
            Ok(Type::NUMBER)
        }
    }

    #[test]
    fn custom_marshaler_produces_a_value_or_an_error() {
        assert_eq!(marshal(&Celsius(0.0)).unwrap(), num(273.15));
        assert!(matches!(
            marshal(&Celsius(f64::NAN)),
            Err(MarshalError::Marshaler(_))
        ));
    }

    // --- Kind mismatch on unmarshal ----------------------------------------

    #[test]
    fn unmarshal_reports_kind_mismatches() {
        let source = Struct::new("Point", vec![field("x", Value::string("no"))]);
        let mut p = Point::default();
        assert!(matches!(
            unmarshal(&source, &mut p),
            Err(MarshalError::TypeMismatch {
                expected: "number",
                actual: Kind::String,
            })
        ));
    }

    // --- Shape cache -------------------------------------------------------

    #[test]
    fn concurrent_shape_lookups_converge() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    let shape = shape_of::<Point>().unwrap();
                    assert_eq!(shape.name, "Point");
                    shape.fields.len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
    }

    #[test]
    fn from_value_on_records_requires_a_struct() {
        assert!(matches!(
            Point::from_value(&num(1.0)),
            Err(MarshalError::TypeMismatch {
                expected: "struct",
                ..
            })
        ));
    }
}

use std::any::TypeId;

use crate::kind::Kind;

/// Structural descriptor of a value's shape.
///
/// Primitive kinds are carried directly; containers are parameterized; named
/// struct types hold an ordered field list. A struct type that recurses into
/// itself (directly or through a container) is closed off by a
/// [`Type::Cycle`] back reference carrying the struct's name — the cycle is
/// detected while the type is built, never by a runtime recursion limit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    /// A primitive kind (`bool`, `number`, the fixed widths, `string`,
    /// `blob`, `type`).
    Primitive(Kind),
    /// The join of unequal element types; also the element type of empty
    /// containers. The model has no union types, so `Any` is the top.
    Any,
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Set(Box<Type>),
    Ref(Box<Type>),
    Struct(StructType),
    /// Back reference to an enclosing struct type, by name.
    Cycle(String),
}

impl Type {
    pub const BOOL: Type = Type::Primitive(Kind::Bool);
    pub const NUMBER: Type = Type::Primitive(Kind::Number);
    pub const STRING: Type = Type::Primitive(Kind::String);
    pub const BLOB: Type = Type::Primitive(Kind::Blob);
    pub const TYPE: Type = Type::Primitive(Kind::Type);

    pub fn list(elem: Type) -> Type {
        Type::List(Box::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn set(elem: Type) -> Type {
        Type::Set(Box::new(elem))
    }

    pub fn reference(target: Type) -> Type {
        Type::Ref(Box::new(target))
    }

    /// Join two types: equal types join to themselves, unequal to [`Type::Any`].
    pub fn join(self, other: Type) -> Type {
        if self == other {
            self
        } else {
            Type::Any
        }
    }
}

/// A named struct type: an ordered `(field name, field type)` list.
///
/// Fields are kept sorted by name, which is the canonical field order
/// everywhere in the model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructType {
    name: String,
    fields: Vec<(String, Type)>,
}

impl StructType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = (String, Type)>) -> Self {
        let mut fields: Vec<_> = fields.into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        fields.dedup_by(|a, b| a.0 == b.0);
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, Type)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|i| &self.fields[i].1)
    }
}

/// Two-pass builder for struct types over native shapes.
///
/// Entering a named shape registers it as in progress; re-entering the same
/// shape (by `TypeId`) while its fields are still being described yields a
/// [`Type::Cycle`] back reference instead of recursing. This is the only
/// mechanism for self-referential shapes.
#[derive(Debug, Default)]
pub struct TypeBuilder {
    in_progress: Vec<(TypeId, String)>,
}

impl TypeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the struct type named `name` for the native shape identified by
    /// `id`, calling `fields` to describe the field types.
    pub fn named_struct<E>(
        &mut self,
        id: TypeId,
        name: &str,
        fields: impl FnOnce(&mut Self) -> Result<Vec<(String, Type)>, E>,
    ) -> Result<Type, E> {
        if let Some((_, enclosing)) = self.in_progress.iter().find(|(open, _)| *open == id) {
            return Ok(Type::Cycle(enclosing.clone()));
        }
        self.in_progress.push((id, name.to_string()));
        let result = fields(self);
        self.in_progress.pop();
        Ok(Type::Struct(StructType::new(name, result?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn join_of_equal_types() {
        assert_eq!(Type::NUMBER.join(Type::NUMBER), Type::NUMBER);
        assert_eq!(
            Type::list(Type::STRING).join(Type::list(Type::STRING)),
            Type::list(Type::STRING)
        );
    }

    #[test]
    fn join_of_unequal_types_is_any() {
        assert_eq!(Type::NUMBER.join(Type::STRING), Type::Any);
    }

    #[test]
    fn struct_type_sorts_fields_by_name() {
        let st = StructType::new(
            "Node",
            vec![
                ("value".to_string(), Type::NUMBER),
                ("children".to_string(), Type::list(Type::Any)),
            ],
        );
        let names: Vec<_> = st.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["children", "value"]);
        assert_eq!(st.field("value"), Some(&Type::NUMBER));
        assert_eq!(st.field("missing"), None);
    }

    #[test]
    fn builder_emits_cycle_marker_for_self_reference() {
        struct Node;

        let mut b = TypeBuilder::new();
        let ty = b
            .named_struct::<Infallible>(TypeId::of::<Node>(), "Node", |b| {
                let children = b.named_struct::<Infallible>(TypeId::of::<Node>(), "Node", |_| {
                    unreachable!("re-entry must short-circuit")
                })?;
                Ok(vec![
                    ("value".to_string(), Type::NUMBER),
                    ("children".to_string(), Type::list(children)),
                ])
            })
            .unwrap();

        let expected = Type::Struct(StructType::new(
            "Node",
            vec![
                ("children".to_string(), Type::list(Type::Cycle("Node".into()))),
                ("value".to_string(), Type::NUMBER),
            ],
        ));
        assert_eq!(ty, expected);
    }

    #[test]
    fn builder_distinguishes_shapes_by_type_id() {
        struct A;
        struct B;

        let mut b = TypeBuilder::new();
        let ty = b
            .named_struct::<Infallible>(TypeId::of::<A>(), "A", |b| {
                let inner = b.named_struct::<Infallible>(TypeId::of::<B>(), "B", |_| {
                    Ok(vec![("x".to_string(), Type::BOOL)])
                })?;
                Ok(vec![("b".to_string(), inner)])
            })
            .unwrap();

        match ty {
            Type::Struct(st) => {
                assert_eq!(st.name(), "A");
                assert!(matches!(st.field("b"), Some(Type::Struct(_))));
            }
            other => panic!("expected struct type, got {other:?}"),
        }
    }
}

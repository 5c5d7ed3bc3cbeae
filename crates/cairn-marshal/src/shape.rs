//! Record shapes: parsed field tags, cached per native type.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use crate::error::{MarshalError, MarshalResult};

/// One declared field of a record: the Rust field name plus its raw tag
/// string. Produced by the record declaration macro.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub tag: &'static str,
}

/// A field after tag parsing: where it lives in the record and how it
/// behaves when marshaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    /// Declaration index into the record's field list.
    pub index: usize,
    /// Effective model field name. Lowercased Rust name unless the tag
    /// overrides it.
    pub name: String,
    /// Skip when the value is its shape's zero.
    pub omit_empty: bool,
    /// Marshal a sequence or unit-valued mapping as a set.
    pub as_set: bool,
    /// This field carries the struct the record was unmarshaled from; it
    /// never appears in output by name.
    pub original: bool,
}

/// The parsed shape of a record type. Skipped fields (`-` tags) are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: Vec<FieldLayout>,
}

/// Tag grammar: `name[,directive]*`. An empty leading token keeps the
/// declared name; `-` alone drops the field.
fn parse_field(index: usize, spec: &FieldSpec) -> MarshalResult<Option<FieldLayout>> {
    let mut tokens = spec.tag.split(',');
    let override_name = tokens.next().unwrap_or("");

    let mut layout = FieldLayout {
        index,
        name: String::new(),
        omit_empty: false,
        as_set: false,
        original: false,
    };

    for directive in tokens {
        match directive {
            "omitempty" => layout.omit_empty = true,
            "set" => layout.as_set = true,
            "original" => layout.original = true,
            "" => {}
            other => return Err(MarshalError::UnrecognizedTag(other.to_string())),
        }
    }

    layout.name = match override_name {
        "" => spec.name.to_lowercase(),
        "-" => return Ok(None),
        name => {
            if name.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(MarshalError::InvalidFieldName(name.to_string()));
            }
            name.to_string()
        }
    };

    Ok(Some(layout))
}

fn compute_shape(name: &'static str, specs: &[FieldSpec]) -> MarshalResult<RecordShape> {
    let mut fields = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        if let Some(layout) = parse_field(index, spec)? {
            fields.push(layout);
        }
    }
    Ok(RecordShape { name, fields })
}

static SHAPES: LazyLock<RwLock<HashMap<TypeId, Arc<RecordShape>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// The parsed shape for `T`, computed once per process and shared after.
///
/// Tag errors are not cached: a record with a bad tag fails every call.
pub fn shape_of<T: crate::Record>() -> MarshalResult<Arc<RecordShape>> {
    let id = TypeId::of::<T>();
    if let Some(shape) = SHAPES.read().expect("shape cache lock poisoned").get(&id) {
        return Ok(Arc::clone(shape));
    }

    let shape = Arc::new(compute_shape(T::NAME, T::FIELDS)?);
    let mut cache = SHAPES.write().expect("shape cache lock poisoned");
    // Two threads may have computed concurrently; they converge on one copy.
    Ok(Arc::clone(cache.entry(id).or_insert(shape)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(spec: FieldSpec) -> MarshalResult<Option<FieldLayout>> {
        parse_field(0, &spec)
    }

    #[test]
    fn empty_tag_lowercases_the_declared_name() {
        let l = layout(FieldSpec { name: "Xyz", tag: "" }).unwrap().unwrap();
        assert_eq!(l.name, "xyz");
        assert!(!l.omit_empty && !l.as_set && !l.original);
    }

    #[test]
    fn name_override_and_directives() {
        let l = layout(FieldSpec {
            name: "Abc",
            tag: "foo,omitempty,set",
        })
        .unwrap()
        .unwrap();
        assert_eq!(l.name, "foo");
        assert!(l.omit_empty);
        assert!(l.as_set);
    }

    #[test]
    fn directives_without_override_keep_declared_name() {
        let l = layout(FieldSpec {
            name: "Count",
            tag: ",omitempty",
        })
        .unwrap()
        .unwrap();
        assert_eq!(l.name, "count");
        assert!(l.omit_empty);
    }

    #[test]
    fn dash_drops_the_field() {
        assert_eq!(layout(FieldSpec { name: "X", tag: "-" }).unwrap(), None);
    }

    #[test]
    fn digit_leading_override_is_rejected() {
        assert!(matches!(
            layout(FieldSpec { name: "A", tag: "1a" }),
            Err(MarshalError::InvalidFieldName(name)) if name == "1a"
        ));
    }

    #[test]
    fn unknown_directive_is_rejected() {
        assert!(matches!(
            layout(FieldSpec { name: "A", tag: "a,notago" }),
            Err(MarshalError::UnrecognizedTag(tag)) if tag == "notago"
        ));
    }

    #[test]
    fn original_directive_marks_the_carrier() {
        let l = layout(FieldSpec {
            name: "Orig",
            tag: ",original",
        })
        .unwrap()
        .unwrap();
        assert!(l.original);
    }
}

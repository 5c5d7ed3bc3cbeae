use std::collections::BTreeMap;

use crate::value::Value;

/// An unordered mapping with unique keys and content equality.
///
/// Entries are stored sorted by the total order over keys, so equality is
/// order-independent by construction and lookups are binary searches.
/// Inserting an existing key replaces its value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Map {
    entries: Vec<(Value, Value)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut map = Self::new();
        for (k, v) in entries {
            map.insert(k, v);
        }
        map
    }

    fn insert(&mut self, key: Value, value: Value) {
        match self.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(i) => self.entries[i].1 = value,
            Err(i) => self.entries.insert(i, (key, value)),
        }
    }

    /// A copy of this map with `key` bound to `value`.
    pub fn with(&self, key: Value, value: Value) -> Self {
        let mut next = self.clone();
        next.insert(key, value);
        next
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    pub fn has(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// A collection of unique values with content equality.
///
/// Elements are stored sorted by the total order; duplicates collapse on
/// construction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Set {
    elems: Vec<Value>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elems(elems: impl IntoIterator<Item = Value>) -> Self {
        let mut set = Self::new();
        for elem in elems {
            set.insert(elem);
        }
        set
    }

    fn insert(&mut self, elem: Value) {
        if let Err(i) = self.elems.binary_search(&elem) {
            self.elems.insert(i, elem);
        }
    }

    /// A copy of this set containing `elem`.
    pub fn with(&self, elem: Value) -> Self {
        let mut next = self.clone();
        next.insert(elem);
        next
    }

    pub fn has(&self, elem: &Value) -> bool {
        self.elems.binary_search(elem).is_ok()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Elements in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.elems.iter()
    }
}

/// A named struct value: a type name plus a field-name → value mapping.
///
/// Fields are kept in name order. Equality compares the name and the full
/// field mapping.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Struct {
    name: String,
    fields: BTreeMap<String, Value>,
}

impl Struct {
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().collect(),
        }
    }

    /// The struct's type name. Anonymous structs have an empty name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// A copy of this struct with `field` set to `value`.
    pub fn with_field(&self, field: impl Into<String>, value: Value) -> Self {
        let mut next = self.clone();
        next.fields.insert(field.into(), value);
        next
    }
}

//! Marshaling between native Rust values and the Cairn value model.
//!
//! [`marshal`] turns any [`ToNative`] shape into a [`Value`]; records
//! declared with [`impl_record!`] marshal to named structs with tag-driven
//! field layouts (`rename`, `-`, `omitempty`, `set`, `original`) and come
//! back via [`unmarshal`]. Shapes are parsed once per record type and cached
//! process-wide; [`shape_type`] reports the structural type a record maps
//! to, with recursive shapes closed off by cycle markers.

mod engine;
mod error;
mod from_value;
mod native;
mod record;
mod shape;

pub use engine::{custom, marshal, marshal_record, record_type, shape_type, unmarshal, Marshaler};
pub use error::{MarshalError, MarshalResult};
pub use from_value::FromValue;
pub use native::{Native, ToNative};
pub use record::Record;
pub use shape::{shape_of, FieldLayout, FieldSpec, RecordShape};

// Model types the record macro expands against.
pub use cairn_types::{Struct, Type, TypeBuilder, Value};

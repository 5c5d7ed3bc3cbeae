//! The record abstraction and the macro that derives it.

use cairn_types::{Type, TypeBuilder};

use crate::error::MarshalResult;
use crate::native::Native;
use crate::shape::FieldSpec;
use crate::Value;

/// A native struct the engine can marshal field by field.
///
/// Implementations come from [`impl_record!`]; the trait exists so the
/// engine can walk fields by declaration index without knowing the concrete
/// type. The `'static` bound keys the shape cache by [`TypeId`](std::any::TypeId).
pub trait Record: Sized + 'static {
    /// Model struct name. Empty for anonymous records.
    const NAME: &'static str;

    /// Declared fields, in declaration order. Indices into this slice are
    /// the `index` values the other methods receive.
    const FIELDS: &'static [FieldSpec];

    /// The native form of the field at `index`.
    fn field_native(&self, index: usize) -> MarshalResult<Native>;

    /// The structural type of the field at `index`.
    fn field_type(builder: &mut TypeBuilder, index: usize) -> MarshalResult<Type>;

    /// Populate the field at `index` from a model value.
    fn set_field(&mut self, index: usize, value: &Value) -> MarshalResult<()>;
}

/// Declare a struct as a [`Record`], deriving [`Record`],
/// [`ToNative`](crate::ToNative) and [`FromValue`](crate::FromValue) for it.
///
/// Each field repeats its Rust type and gives a tag in the
/// `name[,directive]*` grammar; an empty tag keeps the lowercased field
/// name. Unmarshaling requires `Default`.
///
/// ```ignore
/// #[derive(Default)]
/// struct Person {
///     given: String,
///     age: u32,
/// }
///
/// impl_record!(Person("Person") {
///     given: String => "",
///     age: u32 => ",omitempty",
/// });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ident($name:expr) { $($field:ident: $fty:ty => $tag:expr),+ $(,)? }) => {
        impl $crate::Record for $ty {
            const NAME: &'static str = $name;
            const FIELDS: &'static [$crate::FieldSpec] = &[
                $($crate::FieldSpec { name: stringify!($field), tag: $tag }),+
            ];

            fn field_native(&self, index: usize) -> $crate::MarshalResult<$crate::Native> {
                let mut current = 0usize;
                $(
                    if index == current {
                        return $crate::ToNative::to_native(&self.$field);
                    }
                    current += 1;
                )+
                let _ = current;
                Err($crate::MarshalError::UnsupportedType("field index out of range"))
            }

            fn field_type(
                builder: &mut $crate::TypeBuilder,
                index: usize,
            ) -> $crate::MarshalResult<$crate::Type> {
                let mut current = 0usize;
                $(
                    if index == current {
                        return <$fty as $crate::ToNative>::native_type(builder);
                    }
                    current += 1;
                )+
                let _ = current;
                Err($crate::MarshalError::UnsupportedType("field index out of range"))
            }

            fn set_field(
                &mut self,
                index: usize,
                value: &$crate::Value,
            ) -> $crate::MarshalResult<()> {
                let mut current = 0usize;
                $(
                    if index == current {
                        self.$field = <$fty as $crate::FromValue>::from_value(value)?;
                        return Ok(());
                    }
                    current += 1;
                )+
                let _ = current;
                Err($crate::MarshalError::UnsupportedType("field index out of range"))
            }
        }

        impl $crate::ToNative for $ty {
            fn to_native(&self) -> $crate::MarshalResult<$crate::Native> {
                Ok($crate::Native::Value($crate::marshal_record(self)?))
            }

            fn native_type(
                builder: &mut $crate::TypeBuilder,
            ) -> $crate::MarshalResult<$crate::Type> {
                $crate::record_type::<Self>(builder)
            }
        }

        impl $crate::FromValue for $ty {
            fn from_value(value: &$crate::Value) -> $crate::MarshalResult<Self> {
                match value {
                    $crate::Value::Struct(source) => {
                        let mut record = <$ty as ::std::default::Default>::default();
                        $crate::unmarshal(source, &mut record)?;
                        Ok(record)
                    }
                    other => Err($crate::MarshalError::TypeMismatch {
                        expected: "struct",
                        actual: other.kind(),
                    }),
                }
            }
        }
    };
}

use cairn_types::{CodecError, Kind};
use thiserror::Error;

/// Errors surfaced while marshaling native values to the value model or
/// populating native values back from it.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// The native shape has no representation in the value model.
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    /// A field tag renamed a field to something the model rejects.
    #[error("invalid struct field name: {0:?}")]
    InvalidFieldName(String),

    /// A field tag carried a directive this engine does not know.
    #[error("unrecognized tag: {0:?}")]
    UnrecognizedTag(String),

    /// A custom [`Marshaler`](crate::Marshaler) reported failure.
    #[error("marshaler failed: {0}")]
    Marshaler(String),

    /// Unmarshal did not find a required field in the source struct.
    #[error("missing struct field: {0:?}")]
    MissingField(String),

    /// Unmarshal found a value of the wrong kind for the target field.
    #[error("type mismatch: expected {expected}, got {actual:?}")]
    TypeMismatch {
        expected: &'static str,
        actual: Kind,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type MarshalResult<T> = Result<T, MarshalError>;

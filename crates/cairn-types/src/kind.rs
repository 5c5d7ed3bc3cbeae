/// The closed set of value kinds.
///
/// The discriminant order is the kind rank used by the total order over
/// values; it is stable and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Bool,
    Number,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Blob,
    List,
    Map,
    Set,
    Struct,
    Ref,
    Type,
}

impl Kind {
    /// Wire name of the kind, as used by the type grammar.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::UInt8 => "uint8",
            Kind::UInt16 => "uint16",
            Kind::UInt32 => "uint32",
            Kind::UInt64 => "uint64",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::String => "string",
            Kind::Blob => "blob",
            Kind::List => "list",
            Kind::Map => "map",
            Kind::Set => "set",
            Kind::Struct => "struct",
            Kind::Ref => "ref",
            Kind::Type => "type",
        }
    }

    /// Inverse of [`Kind::name`] for the primitive kinds that appear by name
    /// in the type grammar. Compound kinds have structural forms instead.
    pub fn primitive_from_name(name: &str) -> Option<Kind> {
        let kind = match name {
            "bool" => Kind::Bool,
            "number" => Kind::Number,
            "int8" => Kind::Int8,
            "int16" => Kind::Int16,
            "int32" => Kind::Int32,
            "int64" => Kind::Int64,
            "uint8" => Kind::UInt8,
            "uint16" => Kind::UInt16,
            "uint32" => Kind::UInt32,
            "uint64" => Kind::UInt64,
            "float32" => Kind::Float32,
            "float64" => Kind::Float64,
            "string" => Kind::String,
            "blob" => Kind::Blob,
            "type" => Kind::Type,
            _ => return None,
        };
        Some(kind)
    }
}

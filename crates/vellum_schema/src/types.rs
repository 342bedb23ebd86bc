//! # Field Type Model
//!
//! Semantic types a field slot can carry on the wire.
//!
//! ## Design
//!
//! - Scalars are fixed-width and stored inline in a record
//! - Text, records and sequences are stored out-of-line behind an offset
//! - Defaults exist for scalars only; reference types default to "absent"

use serde::{Deserialize, Serialize};

/// Fixed-width scalar types supported inline in a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// 32-bit IEEE 754 float.
    F32,
    /// 64-bit IEEE 754 float.
    F64,
    /// Boolean, stored as a single byte (0 or 1).
    Bool,
}

impl ScalarType {
    /// Width of the scalar in bytes on the wire.
    #[inline]
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 | Self::Bool => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }
}

/// The semantic type of a field slot.
///
/// Record references are by name so schemas stay plain data; the registry
/// resolves the name when a consumer actually needs the nested layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// A fixed-width scalar stored inline.
    Scalar(ScalarType),
    /// UTF-8 text stored out-of-line.
    Text,
    /// A nested record of the named type, stored out-of-line.
    Record(String),
    /// A sequence of elements of the inner type, stored out-of-line.
    Sequence(Box<FieldType>),
}

impl FieldType {
    /// Returns true for types stored behind an offset rather than inline.
    #[inline]
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }
}

/// Declared default for a scalar slot.
///
/// A record built with a field equal to its default stores nothing for that
/// slot; the accessor re-materializes the default on read.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// No default - used by reference-typed slots, which default to absent.
    None,
    /// Default for signed and unsigned integer slots.
    Int(i64),
    /// Default for float slots.
    Float(f64),
    /// Default for boolean slots.
    Bool(bool),
}

impl DefaultValue {
    /// Checks that this default is representable in the given slot type.
    #[must_use]
    pub const fn fits(&self, field_type: &FieldType) -> bool {
        match (self, field_type) {
            (Self::None, _) => true,
            (Self::Int(_), FieldType::Scalar(s)) => {
                !matches!(s, ScalarType::F32 | ScalarType::F64 | ScalarType::Bool)
            }
            (Self::Float(_), FieldType::Scalar(ScalarType::F32 | ScalarType::F64)) => true,
            (Self::Bool(_), FieldType::Scalar(ScalarType::Bool)) => true,
            _ => false,
        }
    }
}

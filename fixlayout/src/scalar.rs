//! Scalar field kinds and dynamically typed field values

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::PlainRecord;

/// Fixed-size scalar kinds a struct field may hold.
///
/// Every kind is aligned to its own size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "i8")]
    Int8,
    #[serde(rename = "u8")]
    UInt8,
    #[serde(rename = "i16")]
    Int16,
    #[serde(rename = "u16")]
    UInt16,
    #[serde(rename = "i32")]
    Int32,
    #[serde(rename = "u32")]
    UInt32,
    #[serde(rename = "i64")]
    Int64,
    #[serde(rename = "u64")]
    UInt64,
    #[serde(rename = "f32")]
    Float32,
    #[serde(rename = "f64")]
    Float64,
}

impl ScalarType {
    /// Encoded size in bytes
    pub const fn size(self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::Int8 | ScalarType::UInt8 => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => 8,
        }
    }

    pub const fn alignment(self) -> usize {
        self.size()
    }

    pub const fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int8 => "i8",
            ScalarType::UInt8 => "u8",
            ScalarType::Int16 => "i16",
            ScalarType::UInt16 => "u16",
            ScalarType::Int32 => "i32",
            ScalarType::UInt32 => "u32",
            ScalarType::Int64 => "i64",
            ScalarType::UInt64 => "u64",
            ScalarType::Float32 => "f32",
            ScalarType::Float64 => "f64",
        }
    }

    /// The zero value of this kind (`false` for bool)
    pub fn zero(self) -> Value {
        match self {
            ScalarType::Bool => Value::Bool(false),
            ScalarType::Int8 => Value::Int8(0),
            ScalarType::UInt8 => Value::UInt8(0),
            ScalarType::Int16 => Value::Int16(0),
            ScalarType::UInt16 => Value::UInt16(0),
            ScalarType::Int32 => Value::Int32(0),
            ScalarType::UInt32 => Value::UInt32(0),
            ScalarType::Int64 => Value::Int64(0),
            ScalarType::UInt64 => Value::UInt64(0),
            ScalarType::Float32 => Value::Float32(0.0),
            ScalarType::Float64 => Value::Float64(0.0),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value in native form, independent of any buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// Inline nested struct
    Struct(PlainRecord),
}

impl Value {
    /// Scalar kind of this value, `None` for nested structs
    pub fn scalar_type(&self) -> Option<ScalarType> {
        Some(match self {
            Value::Bool(_) => ScalarType::Bool,
            Value::Int8(_) => ScalarType::Int8,
            Value::UInt8(_) => ScalarType::UInt8,
            Value::Int16(_) => ScalarType::Int16,
            Value::UInt16(_) => ScalarType::UInt16,
            Value::Int32(_) => ScalarType::Int32,
            Value::UInt32(_) => ScalarType::UInt32,
            Value::Int64(_) => ScalarType::Int64,
            Value::UInt64(_) => ScalarType::UInt64,
            Value::Float32(_) => ScalarType::Float32,
            Value::Float64(_) => ScalarType::Float64,
            Value::Struct(_) => return None,
        })
    }

    /// Type name used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Struct(record) => record.layout().fully_qualified_name(),
            other => other
                .scalar_type()
                .map(|ty| ty.name().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Rust primitives that map onto a [`ScalarType`].
///
/// Used for typed field access, e.g. `view.get_as::<i16>("a")`.
pub trait Scalar: Copy + Into<Value> {
    const TYPE: ScalarType;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE: ScalarType = ScalarType::$variant;

                #[inline]
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

impl From<PlainRecord> for Value {
    fn from(record: PlainRecord) -> Self {
        Value::Struct(record)
    }
}

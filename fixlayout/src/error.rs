//! Codec error types

/// Result alias used throughout the codec
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised by buffer access, layout validation and struct placement.
///
/// None of these are transient: each aborts the operation in progress and
/// retrying with the same input fails the same way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// A read or write would touch bytes outside the buffer
    #[error("access of {size} bytes at offset {offset} exceeds buffer length {len}")]
    OutOfRange {
        offset: usize,
        size: usize,
        len: usize,
    },

    /// The struct schema cannot describe a fixed layout
    #[error("invalid layout `{layout}`: {reason}")]
    InvalidLayout { layout: String, reason: String },

    /// A placement emitted a different number of bytes than the layout size
    #[error("placement of `{layout}` wrote {written} bytes, layout requires {expected}")]
    OrderViolation {
        layout: String,
        expected: usize,
        written: usize,
    },

    /// A value's type does not match the field it is stored in
    #[error("field `{field}` holds {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("layout `{layout}` has no field named `{field}`")]
    UnknownField { layout: String, field: String },

    #[error("layout `{layout}` declares {expected} fields, got {actual} values")]
    FieldCountMismatch {
        layout: String,
        expected: usize,
        actual: usize,
    },

    /// A record was unpacked into or packed against a different layout
    #[error("expected a record of `{expected}`, got `{actual}`")]
    LayoutMismatch { expected: String, actual: String },

    #[error("builder cannot grow to {requested} bytes (max {max})")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("invalid config: {0}")]
    Config(String),
}

impl CodecError {
    pub(crate) fn invalid_layout(layout: &str, reason: impl Into<String>) -> Self {
        CodecError::InvalidLayout {
            layout: layout.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for CodecError {
    fn from(e: toml::de::Error) -> Self {
        CodecError::Config(e.to_string())
    }
}

//! Fixlayout: fixed-layout binary struct codec
//!
//! Reads, writes and mutates compact binary records whose field offsets and
//! sizes are decided when the layout is defined, not by the data.
//!
//! # Key Features
//!
//! - **Data-driven**: one generic view/builder pair interprets any
//!   [`StructLayout`]; no per-struct generated code
//! - **Zero-copy reads**: [`StructView`] reads fields straight from the buffer
//! - **In-place mutation**: [`StructViewMut::mutate`] rewrites exactly one
//!   field's bytes
//! - **Backward-growing builder**: [`Builder`] places structs back to front
//!   and never leaves a half-written struct behind
//!
//! # Wire Format
//!
//! A struct occupies exactly `total_size` contiguous bytes. Each field sits
//! at its layout offset from the struct base, little-endian, signed integers
//! in two's complement. Padding is zero when written by the builder and is
//! never read.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use fixlayout::{Builder, FieldDef, PlainRecord, ScalarType, StructLayout, StructView};
//!
//! let layout = Arc::new(
//!     StructLayout::new(
//!         "Test",
//!         [
//!             FieldDef::new("a", ScalarType::Int16),
//!             FieldDef::new("b", ScalarType::Int8),
//!         ],
//!     )
//!     .unwrap(),
//! );
//!
//! let mut record = PlainRecord::zeroed(layout.clone());
//! record.set("a", -1000i16).unwrap();
//! record.set("b", 42i8).unwrap();
//!
//! let mut builder = Builder::new();
//! let offset = record.pack(&mut builder).unwrap();
//! builder.finish().unwrap();
//! assert_eq!(builder.as_bytes(), &[0x18, 0xFC, 0x2A, 0x00]);
//!
//! let buf = builder.to_byte_buffer();
//! let view = StructView::new(&buf, &layout, builder.position(offset).unwrap()).unwrap();
//! assert_eq!(view.get_as::<i16>("a").unwrap(), -1000);
//! assert_eq!(view.unpack().unwrap(), record);
//! ```

mod buffer;
mod builder;
pub mod config;
mod error;
mod layout;
mod record;
mod scalar;
mod view;

pub use buffer::ByteBuffer;
pub use builder::Builder;
pub use config::{BuilderConfig, CodecConfig};
pub use error::{CodecError, Result};
pub use layout::{FieldDef, FieldDescriptor, FieldType, StructLayout};
pub use record::PlainRecord;
pub use scalar::{Scalar, ScalarType, Value};
pub use view::{StructView, StructViewMut};

// =============================================================================
// Constants
// =============================================================================

/// Builder allocation when no capacity is given
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Largest buffer a builder may grow to (2 GiB - 1)
pub const MAX_BUFFER_SIZE: usize = (1 << 31) - 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_INITIAL_CAPACITY, 1024);
        assert_eq!(MAX_BUFFER_SIZE, 0x7FFF_FFFF);
        assert!(DEFAULT_INITIAL_CAPACITY < MAX_BUFFER_SIZE);
    }
}

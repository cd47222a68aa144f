//! Backward-growing struct builder
//!
//! The builder fills its buffer from the high end toward the low end. Data
//! occupies `bytes[space..]`; every write moves `space` down by the size
//! written. When the front runs out, the buffer doubles and existing data
//! is copied to the end of the new allocation, so offsets measured from the
//! end stay valid across growth.
//!
//! Serializing a struct therefore emits its bytes last to first:
//!
//! ```text
//! prep(alignment, total_size)
//! pad(trailing padding)
//! write(last field)
//! pad(gap before last field)
//! ...
//! write(first field)
//! ```
//!
//! [`Builder::create_struct`] is the only routine that emits this sequence.
//! It checks the placement size afterwards and rewinds the builder if
//! anything fails, so a struct is either fully placed or not placed at all.
//!
//! Alignment is relative to the end of the buffer until
//! [`Builder::finish`] pads the front to the largest alignment seen. Only
//! then are forward positions aligned for every placed struct.


use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};

use crate::buffer::ByteBuffer;
use crate::config::BuilderConfig;
use crate::error::{CodecError, Result};
use crate::layout::StructLayout;
use crate::record::check_values;
use crate::scalar::Value;

/// Growable back-to-front buffer for struct serialization
#[derive(Debug, Clone)]
pub struct Builder {
    bytes: Vec<u8>,
    /// Index of the first written byte
    space: usize,
    /// Largest alignment requested so far
    min_align: usize,
    max_capacity: usize,
    verify_placement: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! write_le {
    ($($name:ident($ty:ty), $size:expr, $put:path;)*) => {
        $(
            #[inline]
            pub fn $name(&mut self, value: $ty) -> Result<()> {
                let range = self.claim($size)?;
                $put(&mut self.bytes[range], value);
                Ok(())
            }
        )*
    };
}

impl Builder {
    pub fn new() -> Self {
        Self::with_config(&BuilderConfig::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(&BuilderConfig {
            initial_capacity: capacity,
            ..BuilderConfig::default()
        })
    }

    pub fn with_config(config: &BuilderConfig) -> Self {
        let capacity = config.initial_capacity.min(config.max_capacity);
        Self {
            bytes: vec![0u8; capacity],
            space: capacity,
            min_align: 1,
            max_capacity: config.max_capacity,
            verify_placement: config.verify_placement,
        }
    }

    /// Current size of the backing allocation
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes written so far, measured from the end of the buffer.
    ///
    /// Right after a placement this is the placed struct's offset. It stays
    /// valid when the buffer later grows.
    pub fn offset(&self) -> usize {
        self.bytes.len() - self.space
    }

    pub fn min_align(&self) -> usize {
        self.min_align
    }

    /// The assembled bytes, lowest address first
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[self.space..]
    }

    /// Forward position of a placed struct inside [`as_bytes`](Self::as_bytes).
    ///
    /// The position is a multiple of the struct's alignment once
    /// [`finish`](Self::finish) has run after the last placement.
    pub fn position(&self, offset: usize) -> Result<usize> {
        let len = self.offset();
        if offset > len {
            return Err(CodecError::OutOfRange {
                offset,
                size: 0,
                len,
            });
        }
        Ok(len - offset)
    }

    /// Copy the assembled bytes into an owned buffer
    pub fn to_byte_buffer(&self) -> ByteBuffer {
        ByteBuffer::new(self.as_bytes().to_vec())
    }

    /// Pad the front so the assembled length is a multiple of `min_align`.
    ///
    /// Placing more structs afterwards is allowed; call `finish` again
    /// before handing out the bytes.
    pub fn finish(&mut self) -> Result<()> {
        self.prep(self.min_align, 0)?;
        tracing::trace!(len = self.offset(), min_align = self.min_align, "finished builder");
        Ok(())
    }

    /// Drop all written data, keeping the allocation
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.space = self.bytes.len();
        self.min_align = 1;
    }

    /// Make room for `size` bytes whose end lands on an `alignment`
    /// boundary, inserting zero padding first if needed.
    ///
    /// Must be called once per struct before any of its fields are written.
    pub fn prep(&mut self, alignment: usize, size: usize) -> Result<()> {
        if !alignment.is_power_of_two() {
            return Err(CodecError::invalid_layout(
                "<prep>",
                format!("alignment {} is not a power of two", alignment),
            ));
        }
        let max = self.max_capacity;
        let overflow = move || CodecError::CapacityExceeded {
            requested: usize::MAX,
            max,
        };
        let end = self.offset().checked_add(size).ok_or_else(overflow)?;
        let align_size = (alignment - end % alignment) % alignment;
        let needed = align_size.checked_add(size).ok_or_else(overflow)?;

        self.min_align = self.min_align.max(alignment);
        if self.space < needed {
            self.grow(needed)?;
        }
        self.pad(align_size)
    }

    fn grow(&mut self, needed: usize) -> Result<()> {
        let used = self.offset();
        let required = used.checked_add(needed).unwrap_or(usize::MAX);
        if required > self.max_capacity {
            return Err(CodecError::CapacityExceeded {
                requested: required,
                max: self.max_capacity,
            });
        }

        let old_capacity = self.bytes.len();
        let mut new_capacity = old_capacity.max(1);
        while new_capacity < required {
            new_capacity = new_capacity.saturating_mul(2);
        }
        let new_capacity = new_capacity.min(self.max_capacity);

        let mut bytes = vec![0u8; new_capacity];
        bytes[new_capacity - used..].copy_from_slice(self.as_bytes());
        self.bytes = bytes;
        self.space = new_capacity - used;

        tracing::debug!(old_capacity, new_capacity, "grew builder buffer");
        Ok(())
    }

    /// Reserve `size` bytes below the cursor. Never grows the buffer.
    fn claim(&mut self, size: usize) -> Result<Range<usize>> {
        if size > self.space {
            return Err(CodecError::OutOfRange {
                offset: self.offset(),
                size,
                len: self.bytes.len(),
            });
        }
        self.space -= size;
        Ok(self.space..self.space + size)
    }

    /// Write `n` zero bytes
    pub fn pad(&mut self, n: usize) -> Result<()> {
        let range = self.claim(n)?;
        self.bytes[range].fill(0);
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        let range = self.claim(1)?;
        self.bytes[range.start] = value;
        Ok(())
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_u8(value as u8)
    }

    #[inline]
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    write_le! {
        write_u16(u16), 2, LittleEndian::write_u16;
        write_i16(i16), 2, LittleEndian::write_i16;
        write_u32(u32), 4, LittleEndian::write_u32;
        write_i32(i32), 4, LittleEndian::write_i32;
        write_u64(u64), 8, LittleEndian::write_u64;
        write_i64(i64), 8, LittleEndian::write_i64;
        write_f32(f32), 4, LittleEndian::write_f32;
        write_f64(f64), 8, LittleEndian::write_f64;
    }

    /// Write one scalar value at the cursor
    pub fn write_scalar(&mut self, value: &Value) -> Result<()> {
        match *value {
            Value::Bool(v) => self.write_bool(v),
            Value::Int8(v) => self.write_i8(v),
            Value::UInt8(v) => self.write_u8(v),
            Value::Int16(v) => self.write_i16(v),
            Value::UInt16(v) => self.write_u16(v),
            Value::Int32(v) => self.write_i32(v),
            Value::UInt32(v) => self.write_u32(v),
            Value::Int64(v) => self.write_i64(v),
            Value::UInt64(v) => self.write_u64(v),
            Value::Float32(v) => self.write_f32(v),
            Value::Float64(v) => self.write_f64(v),
            Value::Struct(_) => Err(CodecError::TypeMismatch {
                field: format!("@{}", self.offset()),
                expected: "scalar".to_string(),
                actual: value.type_name(),
            }),
        }
    }

    /// Serialize one struct and return its offset.
    ///
    /// `values` are in declaration order and must match the layout's field
    /// types. On failure the builder is rewound to where it was before the
    /// call.
    pub fn create_struct(&mut self, layout: &StructLayout, values: &[Value]) -> Result<usize> {
        check_values(layout, values)?;

        let mark = self.offset();
        let min_align = self.min_align;
        match self.place_struct(layout, values) {
            Ok(offset) => Ok(offset),
            Err(e) => {
                self.rewind(mark);
                self.min_align = min_align;
                tracing::debug!(
                    layout = %layout.fully_qualified_name(),
                    error = %e,
                    "struct placement failed, builder rewound"
                );
                Err(e)
            }
        }
    }

    fn place_struct(&mut self, layout: &StructLayout, values: &[Value]) -> Result<usize> {
        self.prep(layout.alignment(), layout.total_size())?;
        let start = self.offset();
        self.write_fields(layout, values)?;

        let written = self.offset() - start;
        if self.verify_placement && written != layout.total_size() {
            return Err(CodecError::OrderViolation {
                layout: layout.fully_qualified_name(),
                expected: layout.total_size(),
                written,
            });
        }

        tracing::trace!(
            layout = %layout.fully_qualified_name(),
            offset = self.offset(),
            "placed struct"
        );
        Ok(self.offset())
    }

    /// Emit fields last to first with the padding the layout defines.
    /// Nested structs are written inline without their own `prep`.
    fn write_fields(&mut self, layout: &StructLayout, values: &[Value]) -> Result<()> {
        let start = self.offset();
        let mut cursor = layout.total_size();
        for (field, value) in layout.fields().iter().zip(values).rev() {
            self.pad(cursor - field.end())?;
            debug_assert_eq!(
                self.offset() - start,
                layout.total_size() - field.end(),
                "field `{}` emitted out of order",
                field.name()
            );
            match value {
                Value::Struct(record) => self.write_fields(record.layout(), record.values())?,
                scalar => self.write_scalar(scalar)?,
            }
            cursor = field.byte_offset();
        }
        self.pad(cursor)
    }

    /// Discard everything written after `offset` was current
    fn rewind(&mut self, offset: usize) {
        let space = self.bytes.len() - offset;
        self.bytes[self.space..space].fill(0);
        self.space = space;
    }
}

//! Bounds-checked little-endian byte storage
//!
//! `ByteBuffer` keeps no cursor: every read and write takes an explicit byte
//! offset. The storage type is generic so a buffer can own its bytes
//! (`Vec<u8>`) or borrow them (`&[u8]`, `&mut [u8]`) without copying.

use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{CodecError, Result};
use crate::scalar::{ScalarType, Value};

/// Raw backing storage with fixed little-endian primitive access
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteBuffer<B = Vec<u8>> {
    bytes: B,
}

impl ByteBuffer<Vec<u8>> {
    /// Create an owned buffer of `len` zero bytes
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len],
        }
    }
}

impl<B> ByteBuffer<B> {
    /// Wrap existing storage
    pub fn new(bytes: B) -> Self {
        Self { bytes }
    }

    pub fn into_inner(self) -> B {
        self.bytes
    }
}

fn get_u8(buf: &[u8]) -> u8 {
    buf[0]
}

fn get_i8(buf: &[u8]) -> i8 {
    buf[0] as i8
}

fn put_u8(buf: &mut [u8], value: u8) {
    buf[0] = value;
}

fn put_i8(buf: &mut [u8], value: i8) {
    buf[0] = value as u8;
}

macro_rules! read_le {
    ($($name:ident -> $ty:ty, $size:expr, $get:path;)*) => {
        $(
            #[inline]
            pub fn $name(&self, offset: usize) -> Result<$ty> {
                let range = self.check_range(offset, $size)?;
                Ok($get(&self.bytes.as_ref()[range]))
            }
        )*
    };
}

macro_rules! write_le {
    ($($name:ident($ty:ty), $size:expr, $put:path;)*) => {
        $(
            #[inline]
            pub fn $name(&mut self, offset: usize, value: $ty) -> Result<()> {
                let range = self.check_range(offset, $size)?;
                $put(&mut self.bytes.as_mut()[range], value);
                Ok(())
            }
        )*
    };
}

impl<B: AsRef<[u8]>> ByteBuffer<B> {
    pub fn len(&self) -> usize {
        self.bytes.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    /// Byte range `[offset, offset + size)`, or `OutOfRange` if any part of
    /// it lies past the end of the buffer.
    pub fn check_range(&self, offset: usize, size: usize) -> Result<Range<usize>> {
        let len = self.len();
        match offset.checked_add(size) {
            Some(end) if end <= len => Ok(offset..end),
            _ => Err(CodecError::OutOfRange { offset, size, len }),
        }
    }

    read_le! {
        read_u8 -> u8, 1, get_u8;
        read_i8 -> i8, 1, get_i8;
        read_u16 -> u16, 2, LittleEndian::read_u16;
        read_i16 -> i16, 2, LittleEndian::read_i16;
        read_u32 -> u32, 4, LittleEndian::read_u32;
        read_i32 -> i32, 4, LittleEndian::read_i32;
        read_u64 -> u64, 8, LittleEndian::read_u64;
        read_i64 -> i64, 8, LittleEndian::read_i64;
        read_f32 -> f32, 4, LittleEndian::read_f32;
        read_f64 -> f64, 8, LittleEndian::read_f64;
    }

    /// Any non-zero byte reads as `true`
    #[inline]
    pub fn read_bool(&self, offset: usize) -> Result<bool> {
        Ok(self.read_u8(offset)? != 0)
    }

    /// Read a scalar of kind `ty` at `offset`
    pub fn read_scalar(&self, offset: usize, ty: ScalarType) -> Result<Value> {
        Ok(match ty {
            ScalarType::Bool => Value::Bool(self.read_bool(offset)?),
            ScalarType::Int8 => Value::Int8(self.read_i8(offset)?),
            ScalarType::UInt8 => Value::UInt8(self.read_u8(offset)?),
            ScalarType::Int16 => Value::Int16(self.read_i16(offset)?),
            ScalarType::UInt16 => Value::UInt16(self.read_u16(offset)?),
            ScalarType::Int32 => Value::Int32(self.read_i32(offset)?),
            ScalarType::UInt32 => Value::UInt32(self.read_u32(offset)?),
            ScalarType::Int64 => Value::Int64(self.read_i64(offset)?),
            ScalarType::UInt64 => Value::UInt64(self.read_u64(offset)?),
            ScalarType::Float32 => Value::Float32(self.read_f32(offset)?),
            ScalarType::Float64 => Value::Float64(self.read_f64(offset)?),
        })
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ByteBuffer<B> {
    write_le! {
        write_u8(u8), 1, put_u8;
        write_i8(i8), 1, put_i8;
        write_u16(u16), 2, LittleEndian::write_u16;
        write_i16(i16), 2, LittleEndian::write_i16;
        write_u32(u32), 4, LittleEndian::write_u32;
        write_i32(i32), 4, LittleEndian::write_i32;
        write_u64(u64), 8, LittleEndian::write_u64;
        write_i64(i64), 8, LittleEndian::write_i64;
        write_f32(f32), 4, LittleEndian::write_f32;
        write_f64(f64), 8, LittleEndian::write_f64;
    }

    #[inline]
    pub fn write_bool(&mut self, offset: usize, value: bool) -> Result<()> {
        self.write_u8(offset, value as u8)
    }

    /// Write a scalar value at `offset`.
    ///
    /// Nested struct values are not scalars and are rejected with
    /// `TypeMismatch`; struct writes go through a view or the builder.
    pub fn write_scalar(&mut self, offset: usize, value: &Value) -> Result<()> {
        match *value {
            Value::Bool(v) => self.write_bool(offset, v),
            Value::Int8(v) => self.write_i8(offset, v),
            Value::UInt8(v) => self.write_u8(offset, v),
            Value::Int16(v) => self.write_i16(offset, v),
            Value::UInt16(v) => self.write_u16(offset, v),
            Value::Int32(v) => self.write_i32(offset, v),
            Value::UInt32(v) => self.write_u32(offset, v),
            Value::Int64(v) => self.write_i64(offset, v),
            Value::UInt64(v) => self.write_u64(offset, v),
            Value::Float32(v) => self.write_f32(offset, v),
            Value::Float64(v) => self.write_f64(offset, v),
            Value::Struct(_) => Err(CodecError::TypeMismatch {
                field: format!("@{offset}"),
                expected: "scalar".to_string(),
                actual: value.type_name(),
            }),
        }
    }
}

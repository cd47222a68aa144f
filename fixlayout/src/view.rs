//! Zero-copy struct accessors
//!
//! A view binds a layout to a base position inside a [`ByteBuffer`] and reads
//! or writes fields in place at `base + field.byte_offset()`. Views own
//! nothing and cannot outlive the buffer they borrow.
//!
//! `StructView` is the shared, read-only form; any number may point into the
//! same buffer. `StructViewMut` borrows the buffer exclusively and adds
//! `mutate`, so a buffer has at most one writer at a time.

use std::sync::Arc;

use crate::buffer::ByteBuffer;
use crate::error::{CodecError, Result};
use crate::layout::{FieldDescriptor, FieldType, StructLayout};
use crate::record::{PlainRecord, check_value, same_layout};
use crate::scalar::{Scalar, Value};

/// Read-only view of one struct inside a buffer
#[derive(Debug)]
pub struct StructView<'a, B = Vec<u8>> {
    buf: &'a ByteBuffer<B>,
    layout: &'a Arc<StructLayout>,
    base: usize,
}

impl<B> Clone for StructView<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for StructView<'_, B> {}

fn expect_scalar<T: Scalar>(field: &FieldDescriptor) -> Result<()> {
    match field.ty() {
        FieldType::Scalar(ty) if *ty == T::TYPE => Ok(()),
        other => Err(CodecError::TypeMismatch {
            field: field.name().to_string(),
            expected: other.name(),
            actual: T::TYPE.name().to_string(),
        }),
    }
}

fn expect_struct(field: &FieldDescriptor) -> Result<&Arc<StructLayout>> {
    match field.ty() {
        FieldType::Struct(layout) => Ok(layout),
        other => Err(CodecError::TypeMismatch {
            field: field.name().to_string(),
            expected: other.name(),
            actual: "struct".to_string(),
        }),
    }
}

impl<'a, B: AsRef<[u8]>> StructView<'a, B> {
    /// Bind `layout` at `base`.
    ///
    /// Fails with `OutOfRange` unless the whole struct lies inside `buf`.
    pub fn new(buf: &'a ByteBuffer<B>, layout: &'a Arc<StructLayout>, base: usize) -> Result<Self> {
        buf.check_range(base, layout.total_size())?;
        Ok(Self { buf, layout, base })
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn layout(&self) -> &'a Arc<StructLayout> {
        self.layout
    }

    /// Read a field by name
    pub fn get(&self, name: &str) -> Result<Value> {
        let (_, field) = self.layout.require(name)?;
        self.read_field(field)
    }

    /// Read a field by declaration index
    pub fn get_at(&self, index: usize) -> Result<Value> {
        let field = self.layout.require_at(index)?;
        self.read_field(field)
    }

    /// Read a scalar field as its Rust type; the type must match exactly
    pub fn get_as<T: Scalar>(&self, name: &str) -> Result<T> {
        let (_, field) = self.layout.require(name)?;
        expect_scalar::<T>(field)?;
        let value = self.buf.read_scalar(self.base + field.byte_offset(), T::TYPE)?;
        T::from_value(&value).ok_or_else(|| CodecError::TypeMismatch {
            field: name.to_string(),
            expected: T::TYPE.name().to_string(),
            actual: value.type_name(),
        })
    }

    /// View of a nested struct field, sharing the same buffer
    pub fn nested(&self, name: &str) -> Result<StructView<'a, B>> {
        let layout = self.layout;
        let (_, field) = layout.require(name)?;
        let nested = expect_struct(field)?;
        StructView::new(self.buf, nested, self.base + field.byte_offset())
    }

    /// Copy every field into a new record
    pub fn unpack(&self) -> Result<PlainRecord> {
        let values = self
            .layout
            .fields()
            .iter()
            .map(|field| self.read_field(field))
            .collect::<Result<Vec<_>>>()?;
        PlainRecord::new(self.layout.clone(), values)
    }

    /// Overwrite the fields of an existing record of the same layout.
    ///
    /// Nested records are updated in place rather than reallocated.
    pub fn unpack_into(&self, record: &mut PlainRecord) -> Result<()> {
        if !same_layout(self.layout, record.layout()) {
            return Err(CodecError::LayoutMismatch {
                expected: self.layout.fully_qualified_name(),
                actual: record.layout().fully_qualified_name(),
            });
        }

        for (field, slot) in self.layout.fields().iter().zip(record.values_mut()) {
            match (field.ty(), slot) {
                (FieldType::Struct(nested), Value::Struct(inner)) => {
                    StructView::new(self.buf, nested, self.base + field.byte_offset())?
                        .unpack_into(inner)?;
                }
                (_, slot) => *slot = self.read_field(field)?,
            }
        }
        Ok(())
    }

    fn read_field(&self, field: &FieldDescriptor) -> Result<Value> {
        let at = self.base + field.byte_offset();
        match field.ty() {
            FieldType::Scalar(ty) => self.buf.read_scalar(at, *ty),
            FieldType::Struct(nested) => {
                Ok(Value::Struct(StructView::new(self.buf, nested, at)?.unpack()?))
            }
        }
    }
}

/// Read-write view of one struct inside a buffer
#[derive(Debug)]
pub struct StructViewMut<'a, B = Vec<u8>> {
    buf: &'a mut ByteBuffer<B>,
    layout: &'a Arc<StructLayout>,
    base: usize,
}

fn write_value<B: AsRef<[u8]> + AsMut<[u8]>>(
    buf: &mut ByteBuffer<B>,
    at: usize,
    value: &Value,
) -> Result<()> {
    match value {
        Value::Struct(record) => {
            for (field, value) in record.layout().fields().iter().zip(record.values()) {
                write_value(buf, at + field.byte_offset(), value)?;
            }
            Ok(())
        }
        scalar => buf.write_scalar(at, scalar),
    }
}

impl<'a, B: AsRef<[u8]> + AsMut<[u8]>> StructViewMut<'a, B> {
    pub fn new(
        buf: &'a mut ByteBuffer<B>,
        layout: &'a Arc<StructLayout>,
        base: usize,
    ) -> Result<Self> {
        buf.check_range(base, layout.total_size())?;
        Ok(Self { buf, layout, base })
    }

    /// Reborrow as a read-only view
    pub fn as_view(&self) -> StructView<'_, B> {
        StructView {
            buf: &*self.buf,
            layout: self.layout,
            base: self.base,
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.as_view().get(name)
    }

    pub fn get_as<T: Scalar>(&self, name: &str) -> Result<T> {
        self.as_view().get_as(name)
    }

    pub fn unpack(&self) -> Result<PlainRecord> {
        self.as_view().unpack()
    }

    /// Write a field in place.
    ///
    /// Only the bytes of that field change; padding and other fields are
    /// left as they are. A nested struct value rewrites the nested fields
    /// but not the nested padding.
    pub fn mutate(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let (_, field) = self.layout.require(name)?;
        check_value(field, &value)?;
        write_value(self.buf, self.base + field.byte_offset(), &value)
    }

    /// Mutable view of a nested struct field
    pub fn nested_mut(&mut self, name: &str) -> Result<StructViewMut<'_, B>> {
        let layout = self.layout;
        let (_, field) = layout.require(name)?;
        let nested = expect_struct(field)?;
        StructViewMut::new(self.buf, nested, self.base + field.byte_offset())
    }
}

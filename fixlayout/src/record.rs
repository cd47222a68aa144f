//! Owned struct values
//!
//! A `PlainRecord` is a snapshot of one struct's field values, detached from
//! any buffer. It is produced by unpacking a view and consumed by packing
//! into a [`Builder`].

use std::sync::Arc;

use crate::builder::Builder;
use crate::error::{CodecError, Result};
use crate::layout::{FieldDescriptor, FieldType, StructLayout};
use crate::scalar::{Scalar, Value};

/// Field values of one struct, in layout order
#[derive(Debug, Clone, PartialEq)]
pub struct PlainRecord {
    layout: Arc<StructLayout>,
    values: Vec<Value>,
}

pub(crate) fn same_layout(a: &Arc<StructLayout>, b: &Arc<StructLayout>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

/// Check that `value` can be stored in `field` without conversion
pub(crate) fn check_value(field: &FieldDescriptor, value: &Value) -> Result<()> {
    let matches = match (field.ty(), value) {
        (FieldType::Struct(layout), Value::Struct(record)) => same_layout(layout, record.layout()),
        (FieldType::Scalar(ty), value) => value.scalar_type() == Some(*ty),
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(CodecError::TypeMismatch {
            field: field.name().to_string(),
            expected: field.ty().name(),
            actual: value.type_name(),
        })
    }
}

/// Check a full value list against a layout
pub(crate) fn check_values(layout: &StructLayout, values: &[Value]) -> Result<()> {
    if values.len() != layout.fields().len() {
        return Err(CodecError::FieldCountMismatch {
            layout: layout.fully_qualified_name(),
            expected: layout.fields().len(),
            actual: values.len(),
        });
    }
    layout
        .fields()
        .iter()
        .zip(values)
        .try_for_each(|(field, value)| check_value(field, value))
}

impl PlainRecord {
    /// Create a record from values in declaration order.
    ///
    /// Each value must have exactly its field's type; nested struct values
    /// must be records of the nested layout.
    pub fn new(layout: Arc<StructLayout>, values: Vec<Value>) -> Result<Self> {
        check_values(&layout, &values)?;
        Ok(Self { layout, values })
    }

    /// A record with every field zero (`false`, `0`, `0.0`), nested
    /// structs included
    pub fn zeroed(layout: Arc<StructLayout>) -> Self {
        let values = layout
            .fields()
            .iter()
            .map(|field| match field.ty() {
                FieldType::Scalar(ty) => ty.zero(),
                FieldType::Struct(nested) => Value::Struct(PlainRecord::zeroed(nested.clone())),
            })
            .collect();
        Self { layout, values }
    }

    pub fn layout(&self) -> &Arc<StructLayout> {
        &self.layout
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        let (index, _) = self.layout.require(name)?;
        Ok(&self.values[index])
    }

    pub fn get_as<T: Scalar>(&self, name: &str) -> Result<T> {
        let value = self.get(name)?;
        T::from_value(value).ok_or_else(|| CodecError::TypeMismatch {
            field: name.to_string(),
            expected: T::TYPE.name().to_string(),
            actual: value.type_name(),
        })
    }

    /// Replace one field's value; the type must match the field exactly
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let (index, field) = self.layout.require(name)?;
        check_value(field, &value)?;
        self.values[index] = value;
        Ok(())
    }

    /// Serialize into `builder`, returning the struct's offset
    pub fn pack(&self, builder: &mut Builder) -> Result<usize> {
        builder.create_struct(&self.layout, &self.values)
    }
}

//! Struct layout computation
//!
//! A `StructLayout` maps each field of a fixed-size struct to a byte offset.
//! Fields are placed in declaration order; before each field the running
//! offset is rounded up to the field's alignment, and after the last field
//! the total is rounded up to the struct alignment (the largest field
//! alignment). Padding bytes carry no meaning and are never read.
//!
//! ```
//! use fixlayout::{FieldDef, ScalarType, StructLayout};
//!
//! let layout = StructLayout::new(
//!     "Test",
//!     [
//!         FieldDef::new("a", ScalarType::Int16),
//!         FieldDef::new("b", ScalarType::Int8),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(layout.field("b").unwrap().byte_offset(), 2);
//! assert_eq!(layout.total_size(), 4);
//! assert_eq!(layout.padding_bytes(), 1);
//! ```

#[cfg(test)]
mod tests;

use std::sync::Arc;

use hashbrown::HashMap;

use crate::error::{CodecError, Result};
use crate::scalar::ScalarType;

/// Type of a struct field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar(ScalarType),
    /// Another fixed-layout struct stored inline
    Struct(Arc<StructLayout>),
}

impl FieldType {
    pub fn size(&self) -> usize {
        match self {
            FieldType::Scalar(ty) => ty.size(),
            FieldType::Struct(layout) => layout.total_size(),
        }
    }

    pub fn alignment(&self) -> usize {
        match self {
            FieldType::Scalar(ty) => ty.alignment(),
            FieldType::Struct(layout) => layout.alignment(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            FieldType::Scalar(ty) => ty.name().to_string(),
            FieldType::Struct(layout) => layout.fully_qualified_name(),
        }
    }
}

impl From<ScalarType> for FieldType {
    fn from(ty: ScalarType) -> Self {
        FieldType::Scalar(ty)
    }
}

impl From<Arc<StructLayout>> for FieldType {
    fn from(layout: Arc<StructLayout>) -> Self {
        FieldType::Struct(layout)
    }
}

/// A declared field, before placement
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A placed field: name, type and byte offset from the struct base
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    ty: FieldType,
    byte_offset: usize,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: impl Into<FieldType>, byte_offset: usize) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            byte_offset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_size(&self) -> usize {
        self.ty.size()
    }

    pub fn alignment(&self) -> usize {
        self.ty.alignment()
    }

    /// One past the last byte of this field.
    ///
    /// Saturates for descriptors that are not part of a validated layout;
    /// inside a `StructLayout` the sum never overflows.
    pub fn end(&self) -> usize {
        self.byte_offset.saturating_add(self.byte_size())
    }

    fn checked_end(&self) -> Option<usize> {
        self.byte_offset.checked_add(self.byte_size())
    }
}

/// Static description of a fixed-size struct.
///
/// Immutable once built. Share it behind an `Arc` so records and nested
/// field types can refer to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    name: String,
    namespace: Option<String>,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    total_size: usize,
    alignment: usize,
}

/// Round `offset` up to the next multiple of `alignment` (a power of two),
/// or `None` if that overflows
#[inline]
pub(crate) const fn align_up(offset: usize, alignment: usize) -> Option<usize> {
    match offset.checked_add(alignment - 1) {
        Some(v) => Some(v & !(alignment - 1)),
        None => None,
    }
}

impl StructLayout {
    /// Compute a layout from fields in declaration order.
    ///
    /// Fails with `InvalidLayout` for an empty field list, duplicate field
    /// names, or a struct too large to address.
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = FieldDef>) -> Result<Self> {
        let name = name.into();
        let mut descriptors = Vec::new();
        let mut offset = 0usize;
        let mut alignment = 1usize;

        for field in fields {
            let field_align = field.ty.alignment();
            let size = field.ty.size();
            let Some((at, end)) = align_up(offset, field_align)
                .and_then(|at| at.checked_add(size).map(|end| (at, end)))
            else {
                return Err(CodecError::invalid_layout(
                    &name,
                    format!("field `{}` does not fit in the address space", field.name),
                ));
            };
            descriptors.push(FieldDescriptor::new(field.name, field.ty, at));
            offset = end;
            alignment = alignment.max(field_align);
        }

        let total_size = align_up(offset, alignment).ok_or_else(|| {
            CodecError::invalid_layout(&name, "total size does not fit in the address space")
        })?;
        let layout = Self::assemble(name, descriptors, total_size)?;

        tracing::trace!(
            layout = %layout.name,
            total_size = layout.total_size,
            alignment = layout.alignment,
            "computed struct layout"
        );
        Ok(layout)
    }

    /// Build a layout from fields whose offsets were already decided
    /// elsewhere (for example by a schema compiler).
    ///
    /// The placement is checked, not recomputed: offsets must be aligned,
    /// non-decreasing and non-overlapping, every field must fit inside
    /// `total_size`, and `total_size` must be a multiple of the struct
    /// alignment.
    pub fn from_descriptors(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDescriptor>,
        total_size: usize,
    ) -> Result<Self> {
        Self::assemble(name.into(), fields.into_iter().collect(), total_size)
    }

    fn assemble(name: String, fields: Vec<FieldDescriptor>, total_size: usize) -> Result<Self> {
        if fields.is_empty() {
            return Err(CodecError::invalid_layout(&name, "struct has no fields"));
        }

        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(CodecError::invalid_layout(
                    &name,
                    format!("duplicate field `{}`", field.name),
                ));
            }
        }

        let alignment = fields.iter().map(FieldDescriptor::alignment).max().unwrap_or(1);
        let layout = Self {
            name,
            namespace: None,
            fields,
            index,
            total_size,
            alignment,
        };
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> Result<()> {
        let mut prev_end = 0usize;
        for field in &self.fields {
            let align = field.alignment();
            if !align.is_power_of_two() {
                return Err(CodecError::invalid_layout(
                    &self.name,
                    format!("field `{}` alignment {} is not a power of two", field.name, align),
                ));
            }
            if field.byte_offset % align != 0 {
                return Err(CodecError::invalid_layout(
                    &self.name,
                    format!(
                        "field `{}` offset {} is not a multiple of its alignment {}",
                        field.name, field.byte_offset, align
                    ),
                ));
            }
            if field.byte_offset < prev_end {
                return Err(CodecError::invalid_layout(
                    &self.name,
                    format!(
                        "field `{}` at offset {} overlaps the previous field ending at {}",
                        field.name, field.byte_offset, prev_end
                    ),
                ));
            }
            prev_end = field.checked_end().ok_or_else(|| {
                CodecError::invalid_layout(
                    &self.name,
                    format!(
                        "field `{}` at offset {} runs past the address space",
                        field.name, field.byte_offset
                    ),
                )
            })?;
        }

        if prev_end > self.total_size {
            return Err(CodecError::invalid_layout(
                &self.name,
                format!("fields end at {} past total size {}", prev_end, self.total_size),
            ));
        }
        if self.total_size % self.alignment != 0 {
            return Err(CodecError::invalid_layout(
                &self.name,
                format!(
                    "total size {} is not a multiple of alignment {}",
                    self.total_size, self.alignment
                ),
            ));
        }
        Ok(())
    }

    /// Attach a dotted namespace, e.g. `MyGame.Example`
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }

    /// Fields in declaration (and offset) order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Encoded size of the struct, trailing padding included
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Bytes of intra-struct and trailing padding
    pub fn padding_bytes(&self) -> usize {
        self.total_size - self.fields.iter().map(FieldDescriptor::byte_size).sum::<usize>()
    }

    pub(crate) fn require(&self, name: &str) -> Result<(usize, &FieldDescriptor)> {
        self.index
            .get(name)
            .map(|&i| (i, &self.fields[i]))
            .ok_or_else(|| CodecError::UnknownField {
                layout: self.fully_qualified_name(),
                field: name.to_string(),
            })
    }

    pub(crate) fn require_at(&self, index: usize) -> Result<&FieldDescriptor> {
        self.fields.get(index).ok_or_else(|| CodecError::UnknownField {
            layout: self.fully_qualified_name(),
            field: format!("#{index}"),
        })
    }
}

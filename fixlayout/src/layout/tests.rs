//! Tests for struct layout computation

use std::sync::Arc;

use super::*;

fn test_struct() -> StructLayout {
    StructLayout::new(
        "Test",
        [
            FieldDef::new("a", ScalarType::Int16),
            FieldDef::new("b", ScalarType::Int8),
        ],
    )
    .unwrap()
    .with_namespace("MyGame.Example")
}

fn vec3() -> Arc<StructLayout> {
    Arc::new(
        StructLayout::new(
            "Vec3",
            [
                FieldDef::new("x", ScalarType::Float32),
                FieldDef::new("y", ScalarType::Float32),
                FieldDef::new("z", ScalarType::Float32),
            ],
        )
        .unwrap(),
    )
}

#[test]
fn test_two_field_struct() {
    let layout = test_struct();
    assert_eq!(layout.field("a").unwrap().byte_offset(), 0);
    assert_eq!(layout.field("b").unwrap().byte_offset(), 2);
    assert_eq!(layout.total_size(), 4);
    assert_eq!(layout.alignment(), 2);
    assert_eq!(layout.padding_bytes(), 1);
    assert_eq!(layout.fully_qualified_name(), "MyGame.Example.Test");
}

#[test]
fn test_interior_padding() {
    let layout = StructLayout::new(
        "Mixed",
        [
            FieldDef::new("tag", ScalarType::UInt8),
            FieldDef::new("id", ScalarType::UInt64),
            FieldDef::new("kind", ScalarType::UInt16),
        ],
    )
    .unwrap();

    let offsets: Vec<_> = layout.fields().iter().map(|f| f.byte_offset()).collect();
    assert_eq!(offsets, vec![0, 8, 16]);
    assert_eq!(layout.total_size(), 24);
    assert_eq!(layout.alignment(), 8);
    assert_eq!(layout.padding_bytes(), 13);
}

#[test]
fn test_nested_struct_field() {
    let outer = StructLayout::new(
        "Transform",
        [
            FieldDef::new("visible", ScalarType::Bool),
            FieldDef::new("pos", vec3()),
            FieldDef::new("id", ScalarType::UInt64),
        ],
    )
    .unwrap();

    assert_eq!(outer.field("visible").unwrap().byte_offset(), 0);
    assert_eq!(outer.field("pos").unwrap().byte_offset(), 4);
    assert_eq!(outer.field("pos").unwrap().byte_size(), 12);
    assert_eq!(outer.field("id").unwrap().byte_offset(), 16);
    assert_eq!(outer.total_size(), 24);
    assert_eq!(outer.alignment(), 8);
}

#[test]
fn test_alignment_invariant() {
    let layouts = [
        test_struct(),
        StructLayout::new(
            "Wide",
            [
                FieldDef::new("flag", ScalarType::Bool),
                FieldDef::new("ratio", ScalarType::Float64),
                FieldDef::new("count", ScalarType::Int32),
                FieldDef::new("small", ScalarType::Int8),
            ],
        )
        .unwrap(),
        StructLayout::new("Single", [FieldDef::new("v", ScalarType::UInt8)]).unwrap(),
    ];

    for layout in &layouts {
        for field in layout.fields() {
            assert_eq!(field.byte_offset() % field.alignment(), 0, "{}", field.name());
        }
        assert_eq!(layout.total_size() % layout.alignment(), 0);
        assert!(layout.total_size() >= layout.fields().iter().map(|f| f.byte_size()).sum::<usize>());
    }
}

#[test]
fn test_layout_is_deterministic() {
    assert_eq!(test_struct(), test_struct());
}

#[test]
fn test_field_lookup() {
    let layout = test_struct();
    assert_eq!(layout.index_of("b"), Some(1));
    assert_eq!(layout.field_at(0).unwrap().name(), "a");
    assert!(layout.field("missing").is_none());
    assert!(matches!(
        layout.require("missing"),
        Err(CodecError::UnknownField { .. })
    ));
}

#[test]
fn test_empty_struct_rejected() {
    let result = StructLayout::new("Empty", Vec::<FieldDef>::new());
    assert!(matches!(result, Err(CodecError::InvalidLayout { .. })));
}

#[test]
fn test_duplicate_field_rejected() {
    let result = StructLayout::new(
        "Dup",
        [
            FieldDef::new("a", ScalarType::Int8),
            FieldDef::new("a", ScalarType::Int8),
        ],
    );
    assert!(matches!(result, Err(CodecError::InvalidLayout { .. })));
}

#[test]
fn test_from_descriptors_matches_computed() {
    let explicit = StructLayout::from_descriptors(
        "Test",
        [
            FieldDescriptor::new("a", ScalarType::Int16, 0),
            FieldDescriptor::new("b", ScalarType::Int8, 2),
        ],
        4,
    )
    .unwrap()
    .with_namespace("MyGame.Example");
    assert_eq!(explicit, test_struct());
}

#[test]
fn test_from_descriptors_rejects_overlap() {
    let result = StructLayout::from_descriptors(
        "Overlap",
        [
            FieldDescriptor::new("a", ScalarType::Int32, 0),
            FieldDescriptor::new("b", ScalarType::Int16, 2),
        ],
        8,
    );
    assert!(matches!(result, Err(CodecError::InvalidLayout { .. })));
}

#[test]
fn test_from_descriptors_rejects_misaligned_field() {
    let result = StructLayout::from_descriptors(
        "Misaligned",
        [
            FieldDescriptor::new("a", ScalarType::Int8, 0),
            FieldDescriptor::new("b", ScalarType::Int32, 1),
        ],
        8,
    );
    assert!(matches!(result, Err(CodecError::InvalidLayout { .. })));
}

#[test]
fn test_from_descriptors_rejects_bad_total_size() {
    // Not a multiple of the 2-byte alignment
    let odd = StructLayout::from_descriptors(
        "Odd",
        [FieldDescriptor::new("a", ScalarType::Int16, 0)],
        3,
    );
    assert!(matches!(odd, Err(CodecError::InvalidLayout { .. })));

    // Field runs past the end
    let short = StructLayout::from_descriptors(
        "Short",
        [FieldDescriptor::new("a", ScalarType::Int64, 0)],
        4,
    );
    assert!(matches!(short, Err(CodecError::InvalidLayout { .. })));
}

#[test]
fn test_from_descriptors_rejects_offset_overflow() {
    let result = StructLayout::from_descriptors(
        "Huge",
        [FieldDescriptor::new("x", ScalarType::UInt8, usize::MAX)],
        1,
    );
    assert!(matches!(result, Err(CodecError::InvalidLayout { .. })));

    // Same field with a total size that would hide a wrapped end
    let result = StructLayout::from_descriptors(
        "Huge",
        [FieldDescriptor::new("x", ScalarType::UInt8, usize::MAX)],
        usize::MAX,
    );
    assert!(matches!(result, Err(CodecError::InvalidLayout { .. })));
}

#[test]
fn test_nested_size_overflow_rejected() {
    let huge = Arc::new(
        StructLayout::from_descriptors(
            "Huge",
            [FieldDescriptor::new("x", ScalarType::UInt8, 0)],
            usize::MAX,
        )
        .unwrap(),
    );
    let result = StructLayout::new(
        "Outer",
        [
            FieldDef::new("a", huge.clone()),
            FieldDef::new("b", huge),
        ],
    );
    assert!(matches!(result, Err(CodecError::InvalidLayout { .. })));
}

#[test]
fn test_field_end_saturates() {
    let field = FieldDescriptor::new("x", ScalarType::UInt32, usize::MAX - 1);
    assert_eq!(field.end(), usize::MAX);
    assert_eq!(field.checked_end(), None);
}

#[test]
fn test_align_up() {
    assert_eq!(align_up(0, 4), Some(0));
    assert_eq!(align_up(1, 4), Some(4));
    assert_eq!(align_up(4, 4), Some(4));
    assert_eq!(align_up(5, 8), Some(8));
    assert_eq!(align_up(3, 1), Some(3));
    assert_eq!(align_up(usize::MAX, 2), None);
}

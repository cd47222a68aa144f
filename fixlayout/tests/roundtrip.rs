//! Round-trip tests across scalar kinds and nested structs

use std::sync::{Arc, Once};

use fixlayout::{
    Builder, BuilderConfig, CodecConfig, CodecError, FieldDef, PlainRecord, ScalarType,
    StructLayout, StructView, StructViewMut, Value,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
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
        .unwrap()
        .with_namespace("MyGame"),
    )
}

/// Every scalar kind, declared in an order that forces interior padding
fn all_scalars() -> Arc<StructLayout> {
    Arc::new(
        StructLayout::new(
            "AllScalars",
            [
                FieldDef::new("flag", ScalarType::Bool),
                FieldDef::new("f64", ScalarType::Float64),
                FieldDef::new("i8", ScalarType::Int8),
                FieldDef::new("u16", ScalarType::UInt16),
                FieldDef::new("u8", ScalarType::UInt8),
                FieldDef::new("i32", ScalarType::Int32),
                FieldDef::new("i16", ScalarType::Int16),
                FieldDef::new("u64", ScalarType::UInt64),
                FieldDef::new("f32", ScalarType::Float32),
                FieldDef::new("u32", ScalarType::UInt32),
                FieldDef::new("i64", ScalarType::Int64),
            ],
        )
        .unwrap(),
    )
}

fn monster_pose() -> Arc<StructLayout> {
    Arc::new(
        StructLayout::new(
            "Pose",
            [
                FieldDef::new("id", ScalarType::UInt16),
                FieldDef::new("pos", vec3()),
                FieldDef::new("alive", ScalarType::Bool),
                FieldDef::new("vel", vec3()),
                FieldDef::new("stamp", ScalarType::Int64),
            ],
        )
        .unwrap()
        .with_namespace("MyGame"),
    )
}

fn vec3_record(x: f32, y: f32, z: f32) -> PlainRecord {
    PlainRecord::new(
        vec3(),
        vec![Value::Float32(x), Value::Float32(y), Value::Float32(z)],
    )
    .unwrap()
}

fn sample_all_scalars(seed: i64) -> PlainRecord {
    PlainRecord::new(
        all_scalars(),
        vec![
            Value::Bool(seed % 2 == 0),
            Value::Float64(seed as f64 * 0.5),
            Value::Int8((seed % 128) as i8),
            Value::UInt16(seed as u16),
            Value::UInt8(seed as u8),
            Value::Int32(-(seed as i32)),
            Value::Int16(seed as i16),
            Value::UInt64(u64::MAX - seed as u64),
            Value::Float32(-1.25),
            Value::UInt32(u32::MAX),
            Value::Int64(i64::MIN + seed),
        ],
    )
    .unwrap()
}

fn roundtrip(record: &PlainRecord) -> PlainRecord {
    let mut builder = Builder::new();
    let offset = record.pack(&mut builder).unwrap();
    assert_eq!(builder.offset() % record.layout().alignment(), 0);
    builder.finish().unwrap();

    let buf = builder.to_byte_buffer();
    let base = builder.position(offset).unwrap();
    assert_eq!(base % record.layout().alignment(), 0);
    let view = StructView::new(&buf, record.layout(), base).unwrap();
    view.unpack().unwrap()
}

#[test]
fn test_all_scalar_kinds_roundtrip() {
    init_logging();
    let layout = all_scalars();
    assert_eq!(layout.total_size() % layout.alignment(), 0);

    for seed in [0, 1, 7, 1000, 65_535] {
        let record = sample_all_scalars(seed);
        assert_eq!(roundtrip(&record), record);
    }
}

#[test]
fn test_nested_roundtrip_and_views() {
    init_logging();
    let layout = monster_pose();
    let record = PlainRecord::new(
        layout.clone(),
        vec![
            Value::UInt16(7),
            Value::Struct(vec3_record(1.0, 2.0, 3.0)),
            Value::Bool(true),
            Value::Struct(vec3_record(-0.5, 0.0, 9.75)),
            Value::Int64(1_700_000_000),
        ],
    )
    .unwrap();
    assert_eq!(roundtrip(&record), record);

    let mut builder = Builder::new();
    let offset = record.pack(&mut builder).unwrap();
    let buf = builder.to_byte_buffer();
    let view = StructView::new(&buf, &layout, builder.position(offset).unwrap()).unwrap();

    let pos = view.nested("pos").unwrap();
    assert_eq!(pos.layout().fully_qualified_name(), "MyGame.Vec3");
    assert_eq!(pos.get_as::<f32>("y").unwrap(), 2.0);
    assert_eq!(view.get("vel").unwrap(), Value::Struct(vec3_record(-0.5, 0.0, 9.75)));
    assert!(matches!(
        view.nested("id"),
        Err(CodecError::TypeMismatch { .. })
    ));
}

#[test]
fn test_nested_mutation() {
    let layout = monster_pose();
    let mut builder = Builder::new();
    let offset = PlainRecord::zeroed(layout.clone()).pack(&mut builder).unwrap();
    let base = builder.position(offset).unwrap();
    let mut buf = builder.to_byte_buffer();

    {
        let mut view = StructViewMut::new(&mut buf, &layout, base).unwrap();
        view.nested_mut("vel").unwrap().mutate("z", 4.5f32).unwrap();
        view.mutate("pos", vec3_record(1.0, 1.0, 1.0)).unwrap();
        assert!(view.mutate("pos", 1.0f32).is_err());
    }

    let view = StructView::new(&buf, &layout, base).unwrap();
    assert_eq!(view.nested("vel").unwrap().get_as::<f32>("z").unwrap(), 4.5);
    assert_eq!(view.get("pos").unwrap(), Value::Struct(vec3_record(1.0, 1.0, 1.0)));
    assert_eq!(view.get_as::<u16>("id").unwrap(), 0);
}

#[test]
fn test_unpack_into_reuses_record() {
    let layout = monster_pose();
    let source = PlainRecord::new(
        layout.clone(),
        vec![
            Value::UInt16(1),
            Value::Struct(vec3_record(4.0, 5.0, 6.0)),
            Value::Bool(false),
            Value::Struct(vec3_record(0.0, 0.0, 0.0)),
            Value::Int64(-5),
        ],
    )
    .unwrap();

    let mut builder = Builder::new();
    let offset = source.pack(&mut builder).unwrap();
    let buf = builder.to_byte_buffer();
    let view = StructView::new(&buf, &layout, builder.position(offset).unwrap()).unwrap();

    let mut target = PlainRecord::zeroed(layout.clone());
    view.unpack_into(&mut target).unwrap();
    assert_eq!(target, source);
    assert_eq!(target, view.unpack().unwrap());
}

#[test]
fn test_many_structs_in_one_builder() {
    init_logging();
    let small = vec3();
    let big = all_scalars();
    let mut builder = Builder::with_capacity(8);

    let mut placed = Vec::new();
    for i in 0..32i64 {
        let record = if i % 3 == 0 {
            sample_all_scalars(i)
        } else {
            vec3_record(i as f32, -(i as f32), 0.25)
        };
        let offset = record.pack(&mut builder).unwrap();
        placed.push((offset, record));
    }
    builder.finish().unwrap();
    assert_eq!(builder.offset() % builder.min_align(), 0);

    let buf = builder.to_byte_buffer();
    for (offset, record) in &placed {
        let layout = if record.layout().name() == "Vec3" {
            &small
        } else {
            &big
        };
        let base = builder.position(*offset).unwrap();
        assert_eq!(base % layout.alignment(), 0);
        let view = StructView::new(&buf, layout, base).unwrap();
        assert_eq!(&view.unpack().unwrap(), record);
    }
}

#[test]
fn test_builder_from_config() {
    let config = CodecConfig::from_toml_str(
        "[builder]\ninitial_capacity = 4\nmax_capacity = 16\nverify_placement = true\n",
    )
    .unwrap();
    let mut builder = Builder::with_config(&config.builder);
    assert_eq!(builder.capacity(), 4);

    let layout = vec3();
    vec3_record(1.0, 2.0, 3.0).pack(&mut builder).unwrap();
    assert_eq!(builder.capacity(), 16);

    let result = vec3_record(4.0, 5.0, 6.0).pack(&mut builder);
    assert!(matches!(result, Err(CodecError::CapacityExceeded { .. })));
    assert_eq!(builder.offset(), layout.total_size());

    let unlimited = Builder::with_config(&BuilderConfig::default());
    assert_eq!(unlimited.capacity(), 1024);
}

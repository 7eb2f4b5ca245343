// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::types::{FieldType, TypeDescriptor, Value};

fn point() -> TypeDescriptor {
    TypeDescriptor::builder("Point")
        .field("x", FieldType::Int64, 1)
        .field("y", FieldType::Int64, 2)
        .build()
}

fn codec_with(descs: Vec<TypeDescriptor>) -> BinaryCodec {
    let registry = Arc::new(TypeRegistry::new());
    for desc in descs {
        registry.register(desc).unwrap();
    }
    BinaryCodec::new(registry)
}

#[test]
fn point_golden_bytes() {
    let codec = codec_with(vec![point()]);
    let env = Envelope::new("Point").with(1, 5i64).with(2, -3i64);
    let bytes = codec.encode(&env).unwrap();
    assert_eq!(
        bytes,
        [0x54, 0x57, 0x01, 0x05, b'P', b'o', b'i', b'n', b't', 0x08, 0x0A, 0x10, 0x05, 0x00]
    );
    assert_eq!(codec.decode(&bytes).unwrap(), env);
}

#[test]
fn all_field_kinds_round_trip() {
    let inner = TypeDescriptor::builder("Inner")
        .field("label", FieldType::String, 1)
        .build();
    let outer = TypeDescriptor::builder("Outer")
        .field("flag", FieldType::Bool, 1)
        .field("small", FieldType::Int32, 2)
        .field("big", FieldType::Int64, 3)
        .field("ratio", FieldType::Double, 4)
        .field("name", FieldType::String, 5)
        .field("blob", FieldType::Bytes, 6)
        .field("inner", FieldType::struct_of("Inner"), 7)
        .field("grid", FieldType::list_of(FieldType::list_of(FieldType::Int32)), 8)
        .field("inners", FieldType::list_of(FieldType::struct_of("Inner")), 9)
        .build();
    let codec = codec_with(vec![inner, outer]);

    let env = Envelope::new("Outer")
        .with(1, true)
        .with(2, i32::MIN)
        .with(3, i64::MAX)
        .with(4, -0.125)
        .with(5, "héllo")
        .with(6, vec![0u8, 255, 7])
        .with(7, Envelope::new("Inner").with(1, "a"))
        .with(
            8,
            vec![
                Value::List(vec![Value::Int32(1), Value::Int32(-2)]),
                Value::List(vec![]),
            ],
        )
        .with(
            9,
            vec![
                Value::Struct(Envelope::new("Inner").with(1, "b")),
                Value::Struct(Envelope::new("Inner")),
            ],
        );

    let bytes = codec.encode(&env).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), env);
}

#[test]
fn defaults_are_omitted_and_filled() {
    let desc = TypeDescriptor::builder("Config")
        .field_with_default("retries", FieldType::Int32, 1, 3)
        .field("note", FieldType::String, 2)
        .build();
    let codec = codec_with(vec![desc]);

    let explicit = Envelope::new("Config").with(1, 3);
    let bytes = codec.encode(&explicit).unwrap();
    let empty = codec.encode(&Envelope::new("Config")).unwrap();
    assert_eq!(bytes, empty);

    let decoded = codec.decode(&empty).unwrap();
    assert_eq!(decoded.get(1), Some(&Value::Int32(3)));
    // no default declared: absent stays absent
    assert!(decoded.get(2).is_none());
}

#[test]
fn unknown_fields_are_skipped() {
    let meta = TypeDescriptor::builder("Meta")
        .field("source", FieldType::String, 1)
        .build();
    let v2 = TypeDescriptor::builder("Point")
        .field("x", FieldType::Int64, 1)
        .field("y", FieldType::Int64, 2)
        .field("z", FieldType::Double, 3)
        .field("tags", FieldType::list_of(FieldType::list_of(FieldType::String)), 4)
        .field("meta", FieldType::struct_of("Meta"), 5)
        .field("seq", FieldType::Int32, 6)
        .build();
    let writer = codec_with(vec![meta, v2]);
    let reader = codec_with(vec![point()]);

    let env = Envelope::new("Point")
        .with(1, 5i64)
        .with(3, 1.5)
        .with(
            4,
            vec![Value::List(vec![Value::from("a"), Value::from("bc")])],
        )
        .with(5, Envelope::new("Meta").with(1, "radar"))
        .with(2, -3i64)
        .with(6, 9);
    let bytes = writer.encode(&env).unwrap();

    let decoded = reader.decode(&bytes).unwrap();
    assert_eq!(decoded, Envelope::new("Point").with(1, 5i64).with(2, -3i64));
}

#[test]
fn unknown_type_fails_without_partial_result() {
    let writer = codec_with(vec![point()]);
    let reader = codec_with(vec![]);
    let bytes = writer.encode(&Envelope::new("Point").with(1, 1i64)).unwrap();
    assert_eq!(
        reader.decode(&bytes),
        Err(SerializationError::UnknownType {
            name: "Point".into()
        })
    );
}

#[test]
fn wire_type_disagreement_is_a_mismatch() {
    let writer = codec_with(vec![TypeDescriptor::builder("Point")
        .field("x", FieldType::Double, 1)
        .build()]);
    let reader = codec_with(vec![point()]);
    let bytes = writer.encode(&Envelope::new("Point").with(1, 2.0)).unwrap();
    assert_eq!(
        reader.decode(&bytes),
        Err(SerializationError::TypeMismatch {
            type_name: "Point".into(),
            tag: 1,
            expected: "varint".into(),
            found: "fixed64".into(),
        })
    );
}

#[test]
fn nested_struct_name_is_checked() {
    let a = TypeDescriptor::builder("A").field("v", FieldType::Int32, 1).build();
    let b = TypeDescriptor::builder("B").field("v", FieldType::Int32, 1).build();
    let holder_writes_b = TypeDescriptor::builder("Holder")
        .field("child", FieldType::struct_of("B"), 1)
        .build();
    let holder_reads_a = TypeDescriptor::builder("Holder")
        .field("child", FieldType::struct_of("A"), 1)
        .build();
    let writer = codec_with(vec![a.clone(), b.clone(), holder_writes_b]);
    let reader = codec_with(vec![a, b, holder_reads_a]);

    let bytes = writer
        .encode(&Envelope::new("Holder").with(1, Envelope::new("B").with(1, 1)))
        .unwrap();
    let err = reader.decode(&bytes).unwrap_err();
    assert!(matches!(err, SerializationError::TypeMismatch { tag: 1, .. }), "{}", err);
}

#[test]
fn encode_rejects_undeclared_tag_and_wrong_value() {
    let codec = codec_with(vec![point()]);
    assert_eq!(
        codec.encode(&Envelope::new("Point").with(9, 1i64)),
        Err(SerializationError::UnknownField {
            type_name: "Point".into(),
            tag: 9
        })
    );
    let err = codec
        .encode(&Envelope::new("Point").with(1, "five"))
        .unwrap_err();
    assert!(matches!(err, SerializationError::TypeMismatch { tag: 1, .. }));
    assert!(matches!(
        codec.encode(&Envelope::new("Nope")),
        Err(SerializationError::UnknownType { .. })
    ));
}

#[test]
fn malformed_frames() {
    let codec = codec_with(vec![point()]);
    let good = codec
        .encode(&Envelope::new("Point").with(1, 5i64).with(2, -3i64))
        .unwrap();

    let mut bad_magic = good.clone();
    bad_magic[0] = b'X';
    assert!(matches!(
        codec.decode(&bad_magic),
        Err(SerializationError::Malformed { offset: 0, .. })
    ));

    let mut bad_version = good.clone();
    bad_version[2] = 9;
    assert!(codec.decode(&bad_version).is_err());

    for cut in 0..good.len() {
        let err = codec.decode(&good[..cut]).unwrap_err();
        assert!(matches!(err, SerializationError::Malformed { .. }), "cut {}: {}", cut, err);
    }

    let mut trailing = good.clone();
    trailing.push(0);
    let err = codec.decode(&trailing).unwrap_err();
    assert!(err.to_string().contains("trailing"));
}

#[test]
fn invalid_wire_type_in_key() {
    let codec = codec_with(vec![point()]);
    // tag 1, wire-type 5
    let bytes = [0x54, 0x57, 0x01, 0x05, b'P', b'o', b'i', b'n', b't', 0x0D, 0x00, 0x00];
    let err = codec.decode(&bytes).unwrap_err();
    assert_eq!(err, SerializationError::malformed(9, "invalid wire-type 5"));
}

#[test]
fn int32_range_and_utf8_are_enforced() {
    let wide = TypeDescriptor::builder("N").field("v", FieldType::Int64, 1).build();
    let narrow = TypeDescriptor::builder("N").field("v", FieldType::Int32, 1).build();
    let writer = codec_with(vec![wide]);
    let reader = codec_with(vec![narrow]);
    let bytes = writer
        .encode(&Envelope::new("N").with(1, i64::from(i32::MAX) + 1))
        .unwrap();
    let err = reader.decode(&bytes).unwrap_err();
    assert!(err.to_string().contains("out of int32 range"));

    let text = codec_with(vec![TypeDescriptor::builder("S")
        .field("s", FieldType::String, 1)
        .build()]);
    // "S" { tag1 lendel len 2 [0xC3 0x28] } STOP
    let bytes = [0x54, 0x57, 0x01, 0x01, b'S', 0x0A, 0x02, 0xC3, 0x28, 0x00];
    let err = text.decode(&bytes).unwrap_err();
    assert!(err.to_string().contains("not UTF-8"));
}

#[test]
fn oversized_lengths_fail_before_allocation() {
    let desc = TypeDescriptor::builder("B").field("b", FieldType::Bytes, 1).build();
    let registry = Arc::new(TypeRegistry::new());
    registry.register(desc).unwrap();
    let codec = BinaryCodec::with_limits(
        Arc::clone(&registry),
        CodecLimits {
            max_read_length: 16,
            ..CodecLimits::default()
        },
    );

    let big = BinaryCodec::new(registry)
        .encode(&Envelope::new("B").with(1, vec![7u8; 32]))
        .unwrap();
    let err = codec.decode(&big).unwrap_err();
    assert!(err.to_string().contains("exceeds limit 16"), "{}", err);

    // claims 2^40 bytes with only a handful present
    let mut lying = vec![0x54, 0x57, 0x01, 0x01, b'B', 0x0A];
    varint::encode_varint(1 << 40, &mut lying);
    lying.push(0x00);
    assert!(matches!(
        BinaryCodec::new(Arc::new(TypeRegistry::new())).decode(&lying),
        Err(SerializationError::UnknownType { .. })
    ));
    assert!(matches!(
        codec.decode(&lying),
        Err(SerializationError::Malformed { .. })
    ));
}

#[test]
fn list_count_beyond_input_is_rejected() {
    let codec = codec_with(vec![TypeDescriptor::builder("L")
        .field("v", FieldType::list_of(FieldType::Int32), 1)
        .build()]);
    // tag 1 wire list, count 1000, elem varint, one element
    let mut bytes = vec![0x54, 0x57, 0x01, 0x01, b'L', 0x0B];
    varint::encode_varint(1000, &mut bytes);
    bytes.extend_from_slice(&[0x00, 0x02, 0x00]);
    let err = codec.decode(&bytes).unwrap_err();
    assert!(err.to_string().contains("list count 1000"), "{}", err);
}

#[test]
fn depth_limit_applies_both_ways() {
    let node = TypeDescriptor::builder("Node")
        .field("next", FieldType::struct_of("Node"), 1)
        .build();
    let registry = Arc::new(TypeRegistry::new());
    registry.register(node).unwrap();

    let mut env = Envelope::new("Node");
    for _ in 0..10 {
        env = Envelope::new("Node").with(1, env);
    }

    let roomy = BinaryCodec::new(Arc::clone(&registry));
    let bytes = roomy.encode(&env).unwrap();
    assert_eq!(roomy.decode(&bytes).unwrap(), env);

    let tight = BinaryCodec::with_limits(
        registry,
        CodecLimits {
            max_depth: 4,
            ..CodecLimits::default()
        },
    );
    assert!(tight.encode(&env).unwrap_err().to_string().contains("nesting deeper than 4"));
    assert!(tight.decode(&bytes).unwrap_err().to_string().contains("nesting deeper than 4"));
}

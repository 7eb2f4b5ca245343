// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bytes -> Envelope.

use super::varint::zigzag_decode;
use super::{CodecLimits, Reader, WireType};
use crate::error::{SerResult, SerializationError};
use crate::types::{Envelope, FieldType, TypeRegistry, Value, MAX_TAG};

/// Where a nested struct sits, for error reporting and name checks.
pub(super) struct NestedSlot<'a> {
    parent: &'a str,
    tag: u32,
    expected: &'a str,
}

pub(super) struct Decoder<'r> {
    registry: &'r TypeRegistry,
    limits: &'r CodecLimits,
}

impl<'r> Decoder<'r> {
    pub(super) fn new(registry: &'r TypeRegistry, limits: &'r CodecLimits) -> Self {
        Self { registry, limits }
    }

    pub(super) fn decode_struct(
        &self,
        reader: &mut Reader<'_>,
        slot: Option<NestedSlot<'_>>,
        depth: usize,
    ) -> SerResult<Envelope> {
        self.check_depth(depth, reader)?;

        let name_at = reader.offset();
        let name_len = reader.read_length(self.limits.max_read_length, "type name")?;
        let name = std::str::from_utf8(reader.read_bytes(name_len)?)
            .map_err(|_| SerializationError::malformed(name_at, "type name is not UTF-8"))?;

        if let Some(slot) = &slot {
            if slot.expected != name {
                return Err(SerializationError::TypeMismatch {
                    type_name: slot.parent.to_string(),
                    tag: slot.tag,
                    expected: format!("struct:{}", slot.expected),
                    found: format!("struct:{}", name),
                });
            }
        }

        let desc = self.registry.resolve_by_name(name)?;
        let mut envelope = Envelope::new(desc.name.clone());

        loop {
            let key_at = reader.offset();
            let key = reader.read_varint()?;
            if key == 0 {
                break;
            }

            let raw_wire = (key & 0x07) as u8;
            let wire = WireType::from_u8(raw_wire).ok_or_else(|| {
                SerializationError::malformed(key_at, format!("invalid wire-type {}", raw_wire))
            })?;
            let tag = key >> 3;
            if tag == 0 || tag > u64::from(MAX_TAG) {
                return Err(SerializationError::malformed(
                    key_at,
                    format!("invalid field tag {}", tag),
                ));
            }
            let tag = tag as u32;

            match desc.field_by_tag(tag) {
                Some(field) => {
                    let expected = field.field_type.wire_type();
                    if expected != wire {
                        return Err(SerializationError::wire_mismatch(
                            &desc.name, tag, expected, wire,
                        ));
                    }
                    let value =
                        self.decode_payload(reader, &field.field_type, &desc.name, tag, depth)?;
                    envelope.fields.insert(tag, value);
                }
                None => {
                    log::trace!("[tagwire] {} skipping unknown tag {} ({})", desc.name, tag, wire);
                    self.skip_payload(reader, wire, depth)?;
                }
            }
        }

        for field in &desc.fields {
            if let Some(default) = &field.default {
                envelope
                    .fields
                    .entry(field.tag)
                    .or_insert_with(|| default.clone());
            }
        }

        Ok(envelope)
    }

    fn decode_payload(
        &self,
        reader: &mut Reader<'_>,
        ty: &FieldType,
        type_name: &str,
        tag: u32,
        depth: usize,
    ) -> SerResult<Value> {
        let at = reader.offset();
        let value = match ty {
            FieldType::Bool => match reader.read_varint()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(SerializationError::malformed(
                        at,
                        format!("invalid bool value {}", other),
                    ))
                }
            },
            FieldType::Int32 => {
                let wide = zigzag_decode(reader.read_varint()?);
                let narrow = i32::try_from(wide).map_err(|_| {
                    SerializationError::malformed(at, format!("{} out of int32 range", wide))
                })?;
                Value::Int32(narrow)
            }
            FieldType::Int64 => Value::Int64(zigzag_decode(reader.read_varint()?)),
            FieldType::Double => Value::Double(reader.read_f64_le()?),
            FieldType::String => {
                let len = reader.read_length(self.limits.max_read_length, "string")?;
                let text = std::str::from_utf8(reader.read_bytes(len)?)
                    .map_err(|_| SerializationError::malformed(at, "string is not UTF-8"))?;
                Value::String(text.to_string())
            }
            FieldType::Bytes => {
                let len = reader.read_length(self.limits.max_read_length, "bytes")?;
                Value::Bytes(reader.read_bytes(len)?.to_vec())
            }
            FieldType::Struct(expected) => {
                let len = reader.read_length(self.limits.max_read_length, "struct")?;
                let mut body = reader.sub_reader(len)?;
                let slot = NestedSlot {
                    parent: type_name,
                    tag,
                    expected,
                };
                let nested = self.decode_struct(&mut body, Some(slot), depth + 1)?;
                if !body.is_eof() {
                    return Err(SerializationError::malformed(
                        body.offset(),
                        "nested struct shorter than its length prefix",
                    ));
                }
                Value::Struct(nested)
            }
            FieldType::List(elem) => {
                self.check_depth(depth + 1, reader)?;
                let count = self.read_count(reader)?;
                let elem_at = reader.offset();
                let raw = reader.read_u8()?;
                let found = WireType::from_u8(raw).ok_or_else(|| {
                    SerializationError::malformed(elem_at, format!("invalid wire-type {}", raw))
                })?;
                let expected = elem.wire_type();
                if found != expected {
                    return Err(SerializationError::TypeMismatch {
                        type_name: type_name.to_string(),
                        tag,
                        expected: format!("list of {}", expected),
                        found: format!("list of {}", found),
                    });
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.decode_payload(reader, elem, type_name, tag, depth + 1)?);
                }
                Value::List(items)
            }
        };
        Ok(value)
    }

    /// Skip one payload of the given wire-type without interpreting it.
    fn skip_payload(&self, reader: &mut Reader<'_>, wire: WireType, depth: usize) -> SerResult<()> {
        match wire {
            WireType::Varint => reader.read_varint().map(|_| ()),
            WireType::Fixed64 => reader.skip(8),
            WireType::LengthDelimited => {
                let len = reader.read_length(self.limits.max_read_length, "field")?;
                reader.skip(len)
            }
            WireType::List => {
                self.check_depth(depth + 1, reader)?;
                let count = self.read_count(reader)?;
                let elem_at = reader.offset();
                let raw = reader.read_u8()?;
                let elem = WireType::from_u8(raw).ok_or_else(|| {
                    SerializationError::malformed(elem_at, format!("invalid wire-type {}", raw))
                })?;
                for _ in 0..count {
                    self.skip_payload(reader, elem, depth + 1)?;
                }
                Ok(())
            }
        }
    }

    /// List element count. Every element occupies at least one byte, so a
    /// count above the remaining input is corrupt.
    fn read_count(&self, reader: &mut Reader<'_>) -> SerResult<usize> {
        let at = reader.offset();
        let count = reader.read_length(self.limits.max_read_length, "list")?;
        if count > reader.remaining() {
            return Err(SerializationError::malformed(
                at,
                format!("list count {} exceeds remaining {} bytes", count, reader.remaining()),
            ));
        }
        Ok(count)
    }

    fn check_depth(&self, depth: usize, reader: &Reader<'_>) -> SerResult<()> {
        if depth > self.limits.max_depth {
            return Err(SerializationError::malformed(
                reader.offset(),
                format!("nesting deeper than {}", self.limits.max_depth),
            ));
        }
        Ok(())
    }
}

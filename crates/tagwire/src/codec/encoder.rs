// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Envelope -> bytes.

use super::varint::zigzag_encode;
use super::{CodecLimits, Writer, STOP};
use crate::error::{SerResult, SerializationError};
use crate::types::{Envelope, FieldType, TypeRegistry, Value};

pub(super) struct Encoder<'r> {
    registry: &'r TypeRegistry,
    limits: &'r CodecLimits,
}

impl<'r> Encoder<'r> {
    pub(super) fn new(registry: &'r TypeRegistry, limits: &'r CodecLimits) -> Self {
        Self { registry, limits }
    }

    /// Write `name fields STOP` for one struct.
    pub(super) fn encode_struct(
        &self,
        envelope: &Envelope,
        depth: usize,
        out: &mut Writer,
    ) -> SerResult<()> {
        self.check_depth(depth, out)?;
        let desc = self.registry.resolve_by_name(&envelope.type_name)?;

        if let Some(&tag) = envelope
            .fields
            .keys()
            .find(|tag| desc.field_by_tag(**tag).is_none())
        {
            return Err(SerializationError::UnknownField {
                type_name: desc.name.clone(),
                tag,
            });
        }

        out.write_len_prefixed(desc.name.as_bytes());

        for field in &desc.fields {
            let Some(value) = envelope.get(field.tag) else {
                continue;
            };
            if field.default.as_ref() == Some(value) {
                continue;
            }
            if !value.conforms_to(&field.field_type) {
                return Err(SerializationError::TypeMismatch {
                    type_name: desc.name.clone(),
                    tag: field.tag,
                    expected: field.field_type.to_string(),
                    found: value.kind_name().to_string(),
                });
            }
            let wire = field.field_type.wire_type();
            out.write_varint((u64::from(field.tag) << 3) | u64::from(wire.as_u8()));
            self.encode_payload(value, &field.field_type, depth, out)?;
        }

        out.write_u8(STOP);
        Ok(())
    }

    /// `value` has already been checked against `ty`.
    fn encode_payload(
        &self,
        value: &Value,
        ty: &FieldType,
        depth: usize,
        out: &mut Writer,
    ) -> SerResult<()> {
        match (value, ty) {
            (Value::Bool(v), _) => out.write_varint(u64::from(*v)),
            (Value::Int32(v), _) => out.write_varint(zigzag_encode(i64::from(*v))),
            (Value::Int64(v), _) => out.write_varint(zigzag_encode(*v)),
            (Value::Double(v), _) => out.write_f64_le(*v),
            (Value::String(v), _) => out.write_len_prefixed(v.as_bytes()),
            (Value::Bytes(v), _) => out.write_len_prefixed(v),
            (Value::Struct(nested), _) => {
                let mut body = Writer::new();
                self.encode_struct(nested, depth + 1, &mut body)?;
                out.write_len_prefixed(&body.into_inner());
            }
            (Value::List(items), FieldType::List(elem)) => {
                self.check_depth(depth + 1, out)?;
                out.write_varint(items.len() as u64);
                out.write_u8(elem.wire_type().as_u8());
                for item in items {
                    self.encode_payload(item, elem, depth + 1, out)?;
                }
            }
            (Value::List(_), other) => {
                return Err(SerializationError::malformed(
                    out.len(),
                    format!("list value for non-list field type {}", other),
                ));
            }
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize, out: &Writer) -> SerResult<()> {
        if depth > self.limits.max_depth {
            return Err(SerializationError::malformed(
                out.len(),
                format!("nesting deeper than {}", self.limits.max_depth),
            ));
        }
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON strategy.
//!
//! ```json
//! {"type": "Point", "fields": {"x": 5, "y": -3}}
//! ```
//!
//! Fields are keyed by name rather than tag. Nested structs carry their own
//! `type`, bytes are arrays of integers, and unknown names are ignored.

use super::{SerializationStrategy, JSON_CONTENT_TYPE};
use crate::codec::CodecLimits;
use crate::error::{SerResult, SerializationError};
use crate::types::{Envelope, FieldType, TypeRegistry, Value};
use serde_json::{Map, Number, Value as Json};
use std::sync::Arc;

const TYPE_KEY: &str = "type";
const FIELDS_KEY: &str = "fields";

#[derive(Debug, Clone)]
pub struct JsonStrategy {
    registry: Arc<TypeRegistry>,
    limits: CodecLimits,
}

impl JsonStrategy {
    pub fn new(registry: Arc<TypeRegistry>, limits: CodecLimits) -> Self {
        Self { registry, limits }
    }

    /// Envelope as a JSON document, without serializing it to bytes.
    pub fn to_json(&self, envelope: &Envelope) -> SerResult<Json> {
        self.struct_to_json(envelope, 0)
    }

    /// Envelope from an already-parsed JSON document.
    pub fn from_json(&self, json: &Json) -> SerResult<Envelope> {
        self.struct_from_json(json, None, 0)
    }

    fn check_depth(&self, depth: usize) -> SerResult<()> {
        if depth > self.limits.max_depth {
            return Err(SerializationError::malformed(
                0,
                format!("nesting deeper than {}", self.limits.max_depth),
            ));
        }
        Ok(())
    }

    fn struct_to_json(&self, envelope: &Envelope, depth: usize) -> SerResult<Json> {
        self.check_depth(depth)?;
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

        let mut fields = Map::new();
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
            fields.insert(field.name.clone(), self.value_to_json(value, depth)?);
        }

        let mut doc = Map::new();
        doc.insert(TYPE_KEY.to_string(), Json::String(desc.name.clone()));
        doc.insert(FIELDS_KEY.to_string(), Json::Object(fields));
        Ok(Json::Object(doc))
    }

    fn value_to_json(&self, value: &Value, depth: usize) -> SerResult<Json> {
        Ok(match value {
            Value::Bool(v) => Json::Bool(*v),
            Value::Int32(v) => Json::from(*v),
            Value::Int64(v) => Json::from(*v),
            Value::Double(v) => Number::from_f64(*v).map(Json::Number).ok_or_else(|| {
                SerializationError::malformed(0, format!("{} has no JSON representation", v))
            })?,
            Value::String(v) => Json::String(v.clone()),
            Value::Bytes(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
            Value::Struct(nested) => self.struct_to_json(nested, depth + 1)?,
            Value::List(items) => {
                self.check_depth(depth + 1)?;
                Json::Array(
                    items
                        .iter()
                        .map(|item| self.value_to_json(item, depth + 1))
                        .collect::<SerResult<_>>()?,
                )
            }
        })
    }

    /// `slot` is `(parent type, tag, declared nested type)` for nested structs.
    fn struct_from_json(
        &self,
        json: &Json,
        slot: Option<(&str, u32, &str)>,
        depth: usize,
    ) -> SerResult<Envelope> {
        self.check_depth(depth)?;
        let obj = json
            .as_object()
            .ok_or_else(|| SerializationError::malformed(0, "struct is not a JSON object"))?;
        let name = obj
            .get(TYPE_KEY)
            .and_then(Json::as_str)
            .ok_or_else(|| SerializationError::malformed(0, "struct has no \"type\" string"))?;

        if let Some((parent, tag, expected)) = slot {
            if expected != name {
                return Err(SerializationError::TypeMismatch {
                    type_name: parent.to_string(),
                    tag,
                    expected: format!("struct:{}", expected),
                    found: format!("struct:{}", name),
                });
            }
        }

        let desc = self.registry.resolve_by_name(name)?;
        let mut envelope = Envelope::new(desc.name.clone());

        match obj.get(FIELDS_KEY) {
            None | Some(Json::Null) => {}
            Some(Json::Object(fields)) => {
                for (field_name, raw) in fields {
                    let Some(field) = desc.field_by_name(field_name) else {
                        log::trace!("[tagwire] {} skipping unknown field {}", desc.name, field_name);
                        continue;
                    };
                    if raw.is_null() {
                        continue;
                    }
                    let value =
                        self.value_from_json(raw, &field.field_type, &desc.name, field.tag, depth)?;
                    envelope.fields.insert(field.tag, value);
                }
            }
            Some(_) => {
                return Err(SerializationError::malformed(0, "\"fields\" is not a JSON object"))
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

    fn value_from_json(
        &self,
        json: &Json,
        ty: &FieldType,
        type_name: &str,
        tag: u32,
        depth: usize,
    ) -> SerResult<Value> {
        let mismatch = || SerializationError::TypeMismatch {
            type_name: type_name.to_string(),
            tag,
            expected: ty.to_string(),
            found: json_kind(json).to_string(),
        };
        let out_of_range = |what: &str| {
            SerializationError::malformed(0, format!("{} is not a valid {}", json, what))
        };

        Ok(match ty {
            FieldType::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
            FieldType::Int32 | FieldType::Int64 if !json.is_number() => return Err(mismatch()),
            FieldType::Int32 => {
                let wide = json.as_i64().ok_or_else(|| out_of_range("int32"))?;
                Value::Int32(i32::try_from(wide).map_err(|_| out_of_range("int32"))?)
            }
            FieldType::Int64 => Value::Int64(json.as_i64().ok_or_else(|| out_of_range("int64"))?),
            FieldType::Double => Value::Double(json.as_f64().ok_or_else(mismatch)?),
            FieldType::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
            FieldType::Bytes => {
                let items = json.as_array().ok_or_else(mismatch)?;
                let bytes = items
                    .iter()
                    .map(|b| {
                        b.as_u64()
                            .and_then(|v| u8::try_from(v).ok())
                            .ok_or_else(|| out_of_range("byte"))
                    })
                    .collect::<SerResult<Vec<u8>>>()?;
                Value::Bytes(bytes)
            }
            FieldType::Struct(expected) => {
                if !json.is_object() {
                    return Err(mismatch());
                }
                Value::Struct(self.struct_from_json(
                    json,
                    Some((type_name, tag, expected.as_str())),
                    depth + 1,
                )?)
            }
            FieldType::List(elem) => {
                self.check_depth(depth + 1)?;
                let items = json.as_array().ok_or_else(mismatch)?;
                Value::List(
                    items
                        .iter()
                        .map(|item| self.value_from_json(item, elem, type_name, tag, depth + 1))
                        .collect::<SerResult<_>>()?,
                )
            }
        })
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

impl SerializationStrategy for JsonStrategy {
    fn format_name(&self) -> &str {
        JSON_CONTENT_TYPE
    }

    fn encode(&self, envelope: &Envelope) -> SerResult<Vec<u8>> {
        let doc = self.to_json(envelope)?;
        serde_json::to_vec(&doc).map_err(|e| SerializationError::malformed(0, e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> SerResult<Envelope> {
        if bytes.len() > self.limits.max_read_length {
            return Err(SerializationError::malformed(
                0,
                format!(
                    "document of {} bytes exceeds limit {}",
                    bytes.len(),
                    self.limits.max_read_length
                ),
            ));
        }
        let doc: Json = serde_json::from_slice(bytes)
            .map_err(|e| SerializationError::malformed(0, format!("invalid JSON: {}", e)))?;
        self.from_json(&doc)
    }
}

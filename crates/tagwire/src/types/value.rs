// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values and the envelope that carries them.

use super::descriptor::FieldType;
use crate::error::{SerResult, SerializationError};
use std::collections::BTreeMap;

/// A runtime value for a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Struct(Envelope),
    List(Vec<Value>),
}

impl Value {
    /// Short name of the value kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Struct(_) => "struct",
            Self::List(_) => "list",
        }
    }

    /// Whether this value may be stored in a field of type `ty`.
    ///
    /// Lists check every element. Structs only check the type name; the
    /// nested fields are checked when the nested envelope is encoded.
    pub fn conforms_to(&self, ty: &FieldType) -> bool {
        match (self, ty) {
            (Self::Bool(_), FieldType::Bool)
            | (Self::Int32(_), FieldType::Int32)
            | (Self::Int64(_), FieldType::Int64)
            | (Self::Double(_), FieldType::Double)
            | (Self::String(_), FieldType::String)
            | (Self::Bytes(_), FieldType::Bytes) => true,
            (Self::Struct(env), FieldType::Struct(name)) => env.type_name == *name,
            (Self::List(items), FieldType::List(elem)) => {
                items.iter().all(|item| item.conforms_to(elem))
            }
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value, widening `Int32`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            Self::Int32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Envelope> {
        match self {
            Self::Struct(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Envelope> for Value {
    fn from(v: Envelope) -> Self {
        Self::Struct(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

/// One object in transit: its logical type name and its fields keyed by tag.
///
/// Absent tags mean "null"; the codec fills declared defaults on decode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    pub type_name: String,
    pub fields: BTreeMap<u32, Value>,
}

impl Envelope {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, tag: u32, value: impl Into<Value>) -> Self {
        self.fields.insert(tag, value.into());
        self
    }

    pub fn set(&mut self, tag: u32, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(tag, value.into())
    }

    pub fn get(&self, tag: u32) -> Option<&Value> {
        self.fields.get(&tag)
    }

    pub fn remove(&mut self, tag: u32) -> Option<Value> {
        self.fields.remove(&tag)
    }

    pub fn contains(&self, tag: u32) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Typed access to a required field, for `from_envelope` implementations.
    pub fn field<'a, T>(
        &'a self,
        tag: u32,
        expected: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> SerResult<T> {
        match self.optional_field(tag, expected, extract)? {
            Some(v) => Ok(v),
            None => Err(SerializationError::TypeMismatch {
                type_name: self.type_name.clone(),
                tag,
                expected: expected.to_string(),
                found: "absent".to_string(),
            }),
        }
    }

    /// Like [`Envelope::field`], but absence is not an error.
    pub fn optional_field<'a, T>(
        &'a self,
        tag: u32,
        expected: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> SerResult<Option<T>> {
        let Some(value) = self.fields.get(&tag) else {
            return Ok(None);
        };
        extract(value)
            .map(Some)
            .ok_or_else(|| SerializationError::TypeMismatch {
                type_name: self.type_name.clone(),
                tag,
                expected: expected.to_string(),
                found: value.kind_name().to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

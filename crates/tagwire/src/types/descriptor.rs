// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.

use crate::codec::WireType;
use crate::error::{SerResult, SerializationError};
use crate::types::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Highest usable field tag. Tags share a varint with the 3-bit wire-type.
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// Declared type of a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int32,
    Int64,
    Double,
    String,
    Bytes,
    /// Nested registered struct, by logical name.
    Struct(String),
    /// Homogeneous list.
    List(Box<FieldType>),
}

impl FieldType {
    /// Nested struct field type.
    pub fn struct_of(name: impl Into<String>) -> Self {
        Self::Struct(name.into())
    }

    /// List field type.
    pub fn list_of(element: FieldType) -> Self {
        Self::List(Box::new(element))
    }

    /// Wire-type used to carry a value of this type.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Bool | Self::Int32 | Self::Int64 => WireType::Varint,
            Self::Double => WireType::Fixed64,
            Self::String | Self::Bytes | Self::Struct(_) => WireType::LengthDelimited,
            Self::List(_) => WireType::List,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Double => write!(f, "double"),
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::Struct(name) => write!(f, "struct:{}", name),
            Self::List(elem) => write!(f, "list<{}>", elem),
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    /// Parse the textual form used in schema files.
    ///
    /// A bare identifier that is not a primitive keyword names a struct.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix("list<").and_then(|r| r.strip_suffix('>')) {
            return Ok(Self::list_of(inner.parse()?));
        }
        if let Some(name) = s.strip_prefix("struct:") {
            return if is_identifier(name) {
                Ok(Self::struct_of(name))
            } else {
                Err(format!("invalid struct name '{}'", name))
            };
        }
        match s {
            "bool" => Ok(Self::Bool),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "double" => Ok(Self::Double),
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes),
            other if is_identifier(other) => Ok(Self::struct_of(other)),
            other => Err(format!("invalid field type '{}'", other)),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == ':')
        && !s.starts_with(|c: char| c.is_ascii_digit())
}

/// Field descriptor for struct members.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name (used by the JSON strategy and for diagnostics).
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Stable wire tag, never reused for a different field.
    pub tag: u32,
    /// Value assumed when the field is absent from the stream.
    pub default: Option<Value>,
}

impl FieldDescriptor {
    /// Create a field without a default.
    pub fn new(name: impl Into<String>, field_type: FieldType, tag: u32) -> Self {
        Self {
            name: name.into(),
            field_type,
            tag,
            default: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A registered struct type: logical name plus ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Globally unique logical name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Start a fluent builder.
    pub fn builder(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder::new(name)
    }

    pub fn field_by_tag(&self, tag: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Tag of the named field.
    pub fn tag_of(&self, name: &str) -> Option<u32> {
        self.field_by_name(name).map(|f| f.tag)
    }

    /// Check the registration invariants.
    pub fn validate(&self) -> SerResult<()> {
        let invalid = |reason: String| SerializationError::InvalidDescriptor {
            name: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("type name is empty".into()));
        }

        let mut names = HashSet::new();
        let mut tags = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(invalid(format!("field with tag {} has no name", field.tag)));
            }
            if field.tag == 0 || field.tag > MAX_TAG {
                return Err(invalid(format!(
                    "field '{}' has tag {} outside 1..={}",
                    field.name, field.tag, MAX_TAG
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate field name '{}'", field.name)));
            }
            if !tags.insert(field.tag) {
                return Err(invalid(format!("duplicate tag {}", field.tag)));
            }
            if let Some(default) = &field.default {
                if !default.conforms_to(&field.field_type) {
                    return Err(invalid(format!(
                        "default for '{}' is {}, declared {}",
                        field.name,
                        default.kind_name(),
                        field.field_type
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Fluent builder for [`TypeDescriptor`].
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field without a default.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType, tag: u32) -> Self {
        self.fields.push(FieldDescriptor::new(name, field_type, tag));
        self
    }

    /// Add a field with a default value.
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        tag: u32,
        default: impl Into<Value>,
    ) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, field_type, tag).with_default(default));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::new(self.name, self.fields)
    }
}

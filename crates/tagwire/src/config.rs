// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration and TOML schema declarations.
//!
//! ```toml
//! [codec]
//! max_read_length = 1048576
//! max_depth = 32
//!
//! [[types]]
//! name = "Point"
//!
//! [[types.fields]]
//! name = "x"
//! type = "int64"
//! tag = 1
//!
//! [[types.fields]]
//! name = "label"
//! type = "string"
//! tag = 2
//! default = "origin"
//! ```

use crate::codec::{CodecLimits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_READ_LENGTH};
use crate::error::SerializationError;
use crate::serialization::SerializationManager;
use crate::types::{FieldDescriptor, FieldType, TypeDescriptor, TypeRegistry, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Type registration failed: {0}")]
    Registry(#[from] SerializationError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagwireConfig {
    #[serde(default)]
    pub codec: CodecConfig,

    /// Schema declarations registered by [`TagwireConfig::build_registry`].
    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

/// Decoder limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Largest accepted length prefix or list count, in bytes/elements.
    #[serde(default = "default_max_read_length")]
    pub max_read_length: usize,

    /// Deepest accepted struct/list nesting.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_read_length() -> usize {
    DEFAULT_MAX_READ_LENGTH
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_read_length: default_max_read_length(),
            max_depth: default_max_depth(),
        }
    }
}

impl CodecConfig {
    pub fn limits(&self) -> CodecLimits {
        CodecLimits {
            max_read_length: self.max_read_length,
            max_depth: self.max_depth,
        }
    }
}

/// One `[[types]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// One `[[types.fields]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    /// Textual field type: `int64`, `list<string>`, `struct:Point`, ...
    #[serde(rename = "type")]
    pub field_type: String,

    pub tag: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<toml::Value>,
}

impl TagwireConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Small example configuration declaring a `Point` type.
    pub fn sample() -> Self {
        let field = |name: &str, field_type: &str, tag: u32| FieldSpec {
            name: name.to_string(),
            field_type: field_type.to_string(),
            tag,
            default: None,
        };
        Self {
            codec: CodecConfig::default(),
            types: vec![TypeSpec {
                name: "Point".to_string(),
                fields: vec![
                    field("x", "int64", 1),
                    field("y", "int64", 2),
                    FieldSpec {
                        default: Some(toml::Value::String("origin".to_string())),
                        ..field("label", "string", 3)
                    },
                ],
            }],
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.codec.max_read_length == 0 {
            return Err(ConfigError::Invalid("codec.max_read_length must be > 0".into()));
        }
        if self.codec.max_depth == 0 {
            return Err(ConfigError::Invalid("codec.max_depth must be > 0".into()));
        }

        let mut seen = HashSet::new();
        for spec in &self.types {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Type {} is declared twice",
                    spec.name
                )));
            }
            spec.to_descriptor()?
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    /// Descriptors for every declared type, in declaration order.
    pub fn descriptors(&self) -> Result<Vec<TypeDescriptor>, ConfigError> {
        self.types.iter().map(TypeSpec::to_descriptor).collect()
    }

    /// Registry holding the built-in types plus every declared type.
    pub fn build_registry(&self) -> Result<Arc<TypeRegistry>, ConfigError> {
        let registry = TypeRegistry::new();
        for desc in self.descriptors()? {
            registry.register(desc)?;
        }
        log::debug!("[tagwire] registry built with {} types", registry.len());
        Ok(Arc::new(registry))
    }

    /// Manager with the binary and JSON strategies over `registry`, using the
    /// configured limits.
    pub fn build_manager(&self, registry: Arc<TypeRegistry>) -> SerializationManager {
        SerializationManager::with_defaults(registry, self.codec.limits())
    }
}

impl TypeSpec {
    pub fn to_descriptor(&self) -> Result<TypeDescriptor, ConfigError> {
        let fields = self
            .fields
            .iter()
            .map(|f| {
                let field_type: FieldType = f.field_type.parse().map_err(|e| {
                    ConfigError::Invalid(format!("{}.{}: {}", self.name, f.name, e))
                })?;
                let default = f
                    .default
                    .as_ref()
                    .map(|raw| default_value(raw, &field_type))
                    .transpose()
                    .map_err(|e| ConfigError::Invalid(format!("{}.{}: {}", self.name, f.name, e)))?;
                Ok(FieldDescriptor {
                    name: f.name.clone(),
                    field_type,
                    tag: f.tag,
                    default,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(TypeDescriptor::new(self.name.clone(), fields))
    }
}

/// Convert a TOML default to a value of the declared type.
fn default_value(raw: &toml::Value, ty: &FieldType) -> Result<Value, String> {
    let wrong = || format!("default {} does not fit {}", raw, ty);
    match (ty, raw) {
        (FieldType::Bool, toml::Value::Boolean(b)) => Ok(Value::Bool(*b)),
        (FieldType::Int32, toml::Value::Integer(i)) => {
            i32::try_from(*i).map(Value::Int32).map_err(|_| wrong())
        }
        (FieldType::Int64, toml::Value::Integer(i)) => Ok(Value::Int64(*i)),
        (FieldType::Double, toml::Value::Float(f)) => Ok(Value::Double(*f)),
        (FieldType::Double, toml::Value::Integer(i)) => Ok(Value::Double(*i as f64)),
        (FieldType::String, toml::Value::String(s)) => Ok(Value::String(s.clone())),
        (FieldType::Bytes, toml::Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_integer()
                    .and_then(|i| u8::try_from(i).ok())
                    .ok_or_else(wrong)
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Value::Bytes),
        (FieldType::List(elem), toml::Value::Array(items)) => items
            .iter()
            .map(|item| default_value(item, elem))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (FieldType::Struct(_), _) => Err(format!("struct fields cannot have a default ({})", ty)),
        _ => Err(wrong()),
    }
}

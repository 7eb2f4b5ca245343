// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Content-type keyed strategy table.
//!
//! Built once at start-up and shared by reference afterwards; after
//! [`SerializationManagerBuilder::build`] the table is never mutated, so
//! lookups take no lock.

use super::{
    normalize_content_type, BinaryStrategy, JsonStrategy, SerializationStrategy,
};
use crate::codec::CodecLimits;
use crate::error::{SerResult, SerializationError};
use crate::types::{DynamicSerialize, Envelope, TypeRegistry};
use std::collections::HashMap;
use std::sync::Arc;

pub struct SerializationManager {
    registry: Arc<TypeRegistry>,
    strategies: HashMap<String, Arc<dyn SerializationStrategy>>,
}

impl SerializationManager {
    pub fn builder(registry: Arc<TypeRegistry>) -> SerializationManagerBuilder {
        SerializationManagerBuilder {
            registry,
            strategies: HashMap::new(),
        }
    }

    /// Manager with the binary and JSON strategies.
    pub fn with_defaults(registry: Arc<TypeRegistry>, limits: CodecLimits) -> Self {
        let binary: Arc<dyn SerializationStrategy> =
            Arc::new(BinaryStrategy::new(Arc::clone(&registry), limits));
        let json: Arc<dyn SerializationStrategy> =
            Arc::new(JsonStrategy::new(Arc::clone(&registry), limits));

        let strategies = [binary, json]
            .into_iter()
            .map(|s| (normalize_content_type(s.format_name()), s))
            .collect();
        Self {
            registry,
            strategies,
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Strategy registered for `format`, ignoring case and parameters.
    pub fn get_strategy(&self, format: &str) -> SerResult<&dyn SerializationStrategy> {
        self.strategies
            .get(&normalize_content_type(format))
            .map(|s| s.as_ref())
            .ok_or_else(|| SerializationError::UnsupportedFormat {
                format: format.to_string(),
            })
    }

    pub fn supports(&self, format: &str) -> bool {
        self.strategies.contains_key(&normalize_content_type(format))
    }

    /// Registered content types, sorted.
    pub fn formats(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn serialize(&self, envelope: &Envelope, format: &str) -> SerResult<Vec<u8>> {
        self.get_strategy(format)?.encode(envelope)
    }

    pub fn deserialize(&self, bytes: &[u8], format: &str) -> SerResult<Envelope> {
        self.get_strategy(format)?.decode(bytes)
    }

    /// Encode a Rust value whose type was registered with
    /// [`TypeRegistry::register_type`].
    pub fn serialize_typed<T: DynamicSerialize + 'static>(
        &self,
        value: &T,
        format: &str,
    ) -> SerResult<Vec<u8>> {
        let strategy = self.get_strategy(format)?;
        self.registry.resolve_by_runtime_type::<T>()?;
        strategy.encode(&value.to_envelope())
    }

    pub fn deserialize_typed<T: DynamicSerialize + 'static>(
        &self,
        bytes: &[u8],
        format: &str,
    ) -> SerResult<T> {
        let strategy = self.get_strategy(format)?;
        let desc = self.registry.resolve_by_runtime_type::<T>()?;
        let envelope = strategy.decode(bytes)?;
        expect_type(&envelope, &desc.name)?;
        T::from_envelope(&envelope)
    }
}

/// Fail unless `envelope` holds a `type_name`.
pub(crate) fn expect_type(envelope: &Envelope, type_name: &str) -> SerResult<()> {
    if envelope.type_name == type_name {
        Ok(())
    } else {
        Err(SerializationError::TypeMismatch {
            type_name: type_name.to_string(),
            tag: 0,
            expected: format!("struct:{}", type_name),
            found: format!("struct:{}", envelope.type_name),
        })
    }
}

impl std::fmt::Debug for SerializationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationManager")
            .field("formats", &self.formats())
            .finish()
    }
}

/// Collects strategies before the manager is frozen.
pub struct SerializationManagerBuilder {
    registry: Arc<TypeRegistry>,
    strategies: HashMap<String, Arc<dyn SerializationStrategy>>,
}

impl SerializationManagerBuilder {
    /// Add a strategy. Two strategies for the same normalized content type
    /// fail with `DuplicateFormat`.
    pub fn strategy<S: SerializationStrategy + 'static>(mut self, strategy: S) -> SerResult<Self> {
        let key = normalize_content_type(strategy.format_name());
        if key.is_empty() {
            return Err(SerializationError::InvalidFormat {
                format: strategy.format_name().to_string(),
                reason: "empty content type".to_string(),
            });
        }
        if self.strategies.contains_key(&key) {
            return Err(SerializationError::DuplicateFormat { format: key });
        }
        log::debug!("[tagwire] registered strategy {}", key);
        self.strategies.insert(key, Arc::new(strategy));
        Ok(self)
    }

    /// Add the binary strategy.
    pub fn binary(self, limits: CodecLimits) -> SerResult<Self> {
        let strategy = BinaryStrategy::new(Arc::clone(&self.registry), limits);
        self.strategy(strategy)
    }

    /// Add the JSON strategy.
    pub fn json(self, limits: CodecLimits) -> SerResult<Self> {
        let strategy = JsonStrategy::new(Arc::clone(&self.registry), limits);
        self.strategy(strategy)
    }

    pub fn build(self) -> SerializationManager {
        SerializationManager {
            registry: self.registry,
            strategies: self.strategies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE};
    use crate::types::{FieldType, TypeDescriptor, Value};

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl DynamicSerialize for Point {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::builder("Point")
                .field("x", FieldType::Int64, 1)
                .field("y", FieldType::Int64, 2)
                .build()
        }

        fn to_envelope(&self) -> Envelope {
            Envelope::new("Point").with(1, self.x).with(2, self.y)
        }

        fn from_envelope(env: &Envelope) -> SerResult<Self> {
            Ok(Point {
                x: env.field(1, "int64", Value::as_i64)?,
                y: env.field(2, "int64", Value::as_i64)?,
            })
        }
    }

    fn manager() -> SerializationManager {
        let registry = Arc::new(TypeRegistry::new());
        registry.register_type::<Point>().unwrap();
        SerializationManager::with_defaults(registry, CodecLimits::default())
    }

    #[test]
    fn lookup_is_case_insensitive_and_ignores_parameters() {
        let m = manager();
        assert_eq!(
            m.get_strategy("APPLICATION/JSON; charset=utf-8")
                .unwrap()
                .format_name(),
            JSON_CONTENT_TYPE
        );
        assert_eq!(m.formats(), vec![JSON_CONTENT_TYPE, BINARY_CONTENT_TYPE]);
    }

    #[test]
    fn unknown_format_is_distinct_from_decode_errors() {
        let m = manager();
        let err = m.deserialize(b"whatever", "text/csv").unwrap_err();
        assert_eq!(
            err,
            SerializationError::UnsupportedFormat {
                format: "text/csv".into()
            }
        );
        assert!(!err.is_decode_failure());
        assert!(m
            .deserialize(b"whatever", BINARY_CONTENT_TYPE)
            .unwrap_err()
            .is_decode_failure());
    }

    #[test]
    fn typed_round_trip_in_every_format() {
        let m = manager();
        let p = Point { x: 5, y: -3 };
        for format in m.formats() {
            let bytes = m.serialize_typed(&p, format).unwrap();
            assert_eq!(m.deserialize_typed::<Point>(&bytes, format).unwrap(), p);
        }
    }

    #[test]
    fn typed_decode_checks_the_type_name() {
        let m = manager();
        let other = m
            .serialize(
                &Envelope::new(crate::dispatch::ErrorResponse::TYPE_NAME).with(1, "boom"),
                BINARY_CONTENT_TYPE,
            )
            .unwrap();
        assert!(matches!(
            m.deserialize_typed::<Point>(&other, BINARY_CONTENT_TYPE),
            Err(SerializationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn builder_rejects_duplicate_formats() {
        let registry = Arc::new(TypeRegistry::new());
        let result = SerializationManager::builder(Arc::clone(&registry))
            .binary(CodecLimits::default())
            .and_then(|b| b.binary(CodecLimits::default()));
        assert!(matches!(
            result,
            Err(SerializationError::DuplicateFormat { .. })
        ));

        let m = SerializationManager::builder(registry)
            .json(CodecLimits::default())
            .unwrap()
            .build();
        assert!(m.supports("application/json"));
        assert!(!m.supports(BINARY_CONTENT_TYPE));
    }

    struct Nameless;

    impl SerializationStrategy for Nameless {
        fn format_name(&self) -> &str {
            " ; charset=utf-8"
        }

        fn encode(&self, _envelope: &Envelope) -> SerResult<Vec<u8>> {
            Ok(Vec::new())
        }

        fn decode(&self, _bytes: &[u8]) -> SerResult<Envelope> {
            Ok(Envelope::new("Point"))
        }
    }

    #[test]
    fn builder_rejects_empty_content_type() {
        let registry = Arc::new(TypeRegistry::new());
        let Err(err) = SerializationManager::builder(registry).strategy(Nameless) else {
            panic!("empty content type accepted");
        };
        assert!(matches!(err, SerializationError::InvalidFormat { .. }));
        assert!(!err.is_decode_failure());
        assert!(err.to_string().contains("empty content type"));
    }
}

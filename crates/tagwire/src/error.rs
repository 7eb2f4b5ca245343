// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by the type registry, the codecs and the
//! serialization manager.

use crate::codec::WireType;
use std::fmt;

/// Result type for serialization operations.
pub type SerResult<T> = Result<T, SerializationError>;

/// Errors produced while registering types or encoding/decoding payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializationError {
    /// The type name is not registered at this end of the wire.
    ///
    /// The encoding carries no schema, so this is the usual symptom of two
    /// processes running with different type registries.
    UnknownType { name: String },

    /// The wire-type (or nested type name) on the stream disagrees with the
    /// descriptor registered for that tag.
    TypeMismatch {
        type_name: String,
        tag: u32,
        expected: String,
        found: String,
    },

    /// A type with the same name but a different shape is already registered.
    DuplicateType { name: String },

    /// The descriptor failed validation at registration time.
    InvalidDescriptor { name: String, reason: String },

    /// No strategy is registered for the requested content type.
    UnsupportedFormat { format: String },

    /// Two strategies were registered under the same content type.
    DuplicateFormat { format: String },

    /// A strategy names a content type it cannot be registered under.
    InvalidFormat { format: String, reason: String },

    /// Encode-side only: the envelope carries a tag its descriptor does not declare.
    UnknownField { type_name: String, tag: u32 },

    /// Malformed byte stream (truncated payload, invalid wire-type, corrupt
    /// length prefix, trailing garbage, ...).
    Malformed { offset: usize, reason: String },
}

impl SerializationError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    pub(crate) fn wire_mismatch(
        type_name: &str,
        tag: u32,
        expected: WireType,
        found: WireType,
    ) -> Self {
        Self::TypeMismatch {
            type_name: type_name.to_string(),
            tag,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// True for errors caused by the byte stream itself rather than by the
    /// registry or the format lookup.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownType { .. } | Self::TypeMismatch { .. } | Self::Malformed { .. }
        )
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType { name } => write!(f, "unknown type: {}", name),
            Self::TypeMismatch {
                type_name,
                tag,
                expected,
                found,
            } => write!(
                f,
                "type mismatch in {} tag {}: expected {}, found {}",
                type_name, tag, expected, found
            ),
            Self::DuplicateType { name } => {
                write!(f, "type {} is already registered with a different shape", name)
            }
            Self::InvalidDescriptor { name, reason } => {
                write!(f, "invalid descriptor for {}: {}", name, reason)
            }
            Self::UnsupportedFormat { format } => write!(f, "unsupported format: {}", format),
            Self::InvalidFormat { format, reason } => {
                write!(f, "cannot register a strategy for '{}': {}", format, reason)
            }
            Self::DuplicateFormat { format } => {
                write!(f, "a strategy is already registered for {}", format)
            }
            Self::UnknownField { type_name, tag } => {
                write!(f, "type {} declares no field with tag {}", type_name, tag)
            }
            Self::Malformed { offset, reason } => {
                write!(f, "malformed payload at offset {}: {}", offset, reason)
            }
        }
    }
}

impl std::error::Error for SerializationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_variants() {
        let err = SerializationError::malformed(12, "truncated varint");
        assert_eq!(err.to_string(), "malformed payload at offset 12: truncated varint");

        let err = SerializationError::wire_mismatch("Point", 1, WireType::Varint, WireType::Fixed64);
        assert_eq!(
            err.to_string(),
            "type mismatch in Point tag 1: expected varint, found fixed64"
        );

        let err = SerializationError::unknown_type("Radar");
        assert_eq!(err.to_string(), "unknown type: Radar");
    }

    #[test]
    fn decode_failure_classification() {
        assert!(SerializationError::unknown_type("X").is_decode_failure());
        assert!(SerializationError::malformed(0, "eof").is_decode_failure());
        assert!(!SerializationError::UnsupportedFormat {
            format: "text/csv".into()
        }
        .is_decode_failure());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary codec engine for the tagged, self-describing wire format.
//!
//! # Wire Layout
//!
//! ```text
//! frame   := MAGIC(0x54 0x57) VERSION(0x01) struct
//! struct  := varint(len) name  { key payload }  STOP(0x00)
//! key     := varint((tag << 3) | wire_type)
//! payload := varint         zig-zag ints, 0/1 bool
//!          | fixed64        8 bytes LE double
//!          | length-delim   varint(len) bytes (string, bytes, nested struct)
//!          | list           varint(count) elem_wire_type(u8) elements
//! ```
//!
//! Unknown tags are skipped using their wire-type alone, which is what lets
//! an older reader accept payloads from a newer writer.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tagwire::codec::BinaryCodec;
//! use tagwire::types::{Envelope, FieldType, TypeDescriptor, TypeRegistry};
//!
//! let registry = Arc::new(TypeRegistry::new());
//! registry
//!     .register(
//!         TypeDescriptor::builder("Point")
//!             .field("x", FieldType::Int64, 1)
//!             .field("y", FieldType::Int64, 2)
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let codec = BinaryCodec::new(registry);
//! let point = Envelope::new("Point").with(1, 5i64).with(2, -3i64);
//! let bytes = codec.encode(&point).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), point);
//! ```

mod cursor;
mod decoder;
mod encoder;
pub mod varint;

pub use cursor::{Reader, Writer};

use crate::error::{SerResult, SerializationError};
use crate::types::{Envelope, TypeRegistry};
use std::fmt;
use std::sync::Arc;

/// Frame magic, ASCII "TW".
pub const MAGIC: [u8; 2] = [0x54, 0x57];

/// Current frame version.
pub const VERSION: u8 = 0x01;

/// Key value terminating a struct's field stream.
pub const STOP: u8 = 0x00;

/// Default cap on any single length prefix or list count (200 MiB).
pub const DEFAULT_MAX_READ_LENGTH: usize = 200 * 1024 * 1024;

/// Default maximum nesting of structs and lists.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Encoding category carried in the low 3 bits of every field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    List = 3,
}

impl WireType {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            3 => Some(Self::List),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Varint => "varint",
            Self::Fixed64 => "fixed64",
            Self::LengthDelimited => "length-delimited",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Decoder safety limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    /// Largest accepted length prefix or list count.
    pub max_read_length: usize,
    /// Deepest accepted struct/list nesting.
    pub max_depth: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_read_length: DEFAULT_MAX_READ_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Encodes and decodes [`Envelope`]s against a shared [`TypeRegistry`].
///
/// Stateless apart from the registry handle, so one instance can serve any
/// number of threads.
#[derive(Debug, Clone)]
pub struct BinaryCodec {
    registry: Arc<TypeRegistry>,
    limits: CodecLimits,
}

impl BinaryCodec {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_limits(registry, CodecLimits::default())
    }

    pub fn with_limits(registry: Arc<TypeRegistry>, limits: CodecLimits) -> Self {
        Self { registry, limits }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn limits(&self) -> CodecLimits {
        self.limits
    }

    /// Encode a complete frame.
    pub fn encode(&self, envelope: &Envelope) -> SerResult<Vec<u8>> {
        let mut out = Writer::with_capacity(64);
        out.write_bytes(&MAGIC);
        out.write_u8(VERSION);
        encoder::Encoder::new(&self.registry, &self.limits).encode_struct(envelope, 0, &mut out)?;
        Ok(out.into_inner())
    }

    /// Decode a complete frame. Trailing bytes are rejected.
    pub fn decode(&self, bytes: &[u8]) -> SerResult<Envelope> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_bytes(MAGIC.len())?;
        if magic != MAGIC.as_slice() {
            return Err(SerializationError::malformed(0, "bad frame magic"));
        }
        let version = reader.read_u8()?;
        if version != VERSION {
            return Err(SerializationError::malformed(
                2,
                format!("unsupported frame version {}", version),
            ));
        }

        let envelope =
            decoder::Decoder::new(&self.registry, &self.limits).decode_struct(&mut reader, None, 0)?;
        if !reader.is_eof() {
            return Err(SerializationError::malformed(
                reader.offset(),
                format!("{} trailing bytes after frame", reader.remaining()),
            ));
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests;

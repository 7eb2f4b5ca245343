// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tagwire - self-describing tagged serialization
//!
//! Moves typed request/response objects between processes that share a
//! type registry but no compiled schema.
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  RequestDispatcher   decode -> handler lookup -> encode       |
//! +---------------------------------------------------------------+
//! |  SerializationManager   content type -> SerializationStrategy |
//! |      application/x-tagwire (BinaryStrategy)                   |
//! |      application/json      (JsonStrategy)                     |
//! +---------------------------------------------------------------+
//! |  BinaryCodec   Envelope <-> tagged byte stream                |
//! +---------------------------------------------------------------+
//! |  TypeRegistry   name -> TypeDescriptor, TypeId -> name        |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Compatibility
//!
//! The encoding carries type names and field tags, never a schema. All
//! communicating processes must register compatible descriptors: a type
//! missing at the receiver fails with `UnknownType`, while fields the
//! receiver does not know are skipped. Tags must never be reused for a
//! different field.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tagwire::codec::CodecLimits;
//! use tagwire::serialization::{SerializationManager, BINARY_CONTENT_TYPE};
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
//! let manager = SerializationManager::with_defaults(registry, CodecLimits::default());
//! let point = Envelope::new("Point").with(1, 5i64).with(2, -3i64);
//! let bytes = manager.serialize(&point, BINARY_CONTENT_TYPE).unwrap();
//! assert_eq!(manager.deserialize(&bytes, BINARY_CONTENT_TYPE).unwrap(), point);
//! ```

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod serialization;
pub mod types;

pub use codec::{BinaryCodec, CodecLimits, WireType};
pub use config::{ConfigError, TagwireConfig};
pub use dispatch::{
    typed_handler, DeflatedRequest, DispatchError, DispatchReport, DispatchState, ErrorResponse,
    HandlerError, RequestDispatcher, RequestHandler,
};
pub use error::{SerResult, SerializationError};
pub use serialization::{
    SerializationManager, SerializationStrategy, BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
pub use types::{
    DynamicSerialize, Envelope, FieldDescriptor, FieldType, TypeDescriptor, TypeRegistry, Value,
};

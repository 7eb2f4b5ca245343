// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process request dispatch over the serialization layer.
//!
//! A transport hands [`RequestDispatcher::dispatch`] raw bytes and a content
//! type; it gets back bytes in the same (or a chosen) format. Faults inside
//! decoding or handlers come back as an encoded [`ErrorResponse`], so the
//! transport only ever has to deal with an unknown content type.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tagwire::codec::CodecLimits;
//! use tagwire::dispatch::{HandlerError, RequestDispatcher};
//! use tagwire::serialization::{SerializationManager, BINARY_CONTENT_TYPE};
//! use tagwire::types::{Envelope, FieldType, TypeDescriptor, TypeRegistry};
//!
//! let registry = Arc::new(TypeRegistry::new());
//! registry
//!     .register(TypeDescriptor::builder("Ping").field("seq", FieldType::Int64, 1).build())
//!     .unwrap();
//! let manager = Arc::new(SerializationManager::with_defaults(registry, CodecLimits::default()));
//!
//! let mut dispatcher = RequestDispatcher::new(Arc::clone(&manager)).unwrap();
//! dispatcher
//!     .register_handler("Ping", |req: Envelope| -> Result<Envelope, HandlerError> { Ok(req) })
//!     .unwrap();
//!
//! let request = manager
//!     .serialize(&Envelope::new("Ping").with(1, 7i64), BINARY_CONTENT_TYPE)
//!     .unwrap();
//! let reply = dispatcher.dispatch(&request, BINARY_CONTENT_TYPE).unwrap();
//! assert_eq!(reply, request);
//! ```

mod dispatcher;
mod error;
mod handler;
mod response;
mod trace;

pub use dispatcher::{DispatchReport, DispatchState, RequestDispatcher};
pub use error::{DispatchError, DispatchResult, HandlerError};
pub use handler::{typed_handler, RequestHandler};
pub use response::{DeflatedRequest, ErrorResponse};

#[cfg(test)]
mod tests;

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for request dispatch.

use crate::error::SerializationError;
use std::fmt;

/// Result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Error returned by a request handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while dispatching a request.
///
/// Only `UnsupportedFormat` (from `dispatch`) and `DuplicateHandler` (from
/// registration) ever reach callers. The other variants are rendered into an
/// encoded `ErrorResponse`.
#[derive(Debug)]
pub enum DispatchError {
    /// Input or output content type has no registered strategy.
    UnsupportedFormat(String),

    /// A handler is already registered for this request type.
    DuplicateHandler(String),

    /// No handler is registered for the decoded request type.
    HandlerNotFound(String),

    /// The handler returned an error or panicked.
    HandlerFailed { request_type: String, message: String },

    /// Decoding the request or encoding the response failed.
    Serialization(SerializationError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(format) => write!(f, "unsupported format: {}", format),
            Self::DuplicateHandler(name) => {
                write!(f, "a handler is already registered for {}", name)
            }
            Self::HandlerNotFound(name) => {
                write!(f, "no handler registered for request type {}", name)
            }
            Self::HandlerFailed {
                request_type,
                message,
            } => write!(f, "handler for {} failed: {}", request_type, message),
            Self::Serialization(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SerializationError> for DispatchError {
    fn from(e: SerializationError) -> Self {
        match e {
            SerializationError::UnsupportedFormat { format } => Self::UnsupportedFormat(format),
            other => Self::Serialization(other),
        }
    }
}

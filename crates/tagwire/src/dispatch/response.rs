// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in wire types known to every registry: `ErrorResponse` and
//! `DeflatedRequest`.

use super::trace::captured_backtrace;
use crate::error::{SerResult, SerializationError};
use crate::serialization::SerializationStrategy;
use crate::types::{DynamicSerialize, Envelope, FieldType, TypeDescriptor, Value};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Failure reply produced by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    /// Cause chain, then backtrace frames.
    pub stack_trace: Vec<String>,
    /// Request type being handled, when decoding got that far.
    pub request_type: Option<String>,
}

impl ErrorResponse {
    pub const TYPE_NAME: &'static str = "tagwire.ErrorResponse";

    const TAG_ERROR: u32 = 1;
    const TAG_STACK_TRACE: u32 = 2;
    const TAG_REQUEST_TYPE: u32 = 3;

    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            stack_trace: Vec::new(),
            request_type: None,
        }
    }

    /// Render `err`, its `source()` chain, then the backtrace of the calling
    /// thread.
    pub fn from_error(err: &(dyn std::error::Error + 'static), request_type: Option<&str>) -> Self {
        let mut stack_trace = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            stack_trace.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        stack_trace.extend(captured_backtrace());

        Self {
            error: err.to_string(),
            stack_trace,
            request_type: request_type.map(str::to_string),
        }
    }

    pub fn with_request_type(mut self, request_type: impl Into<String>) -> Self {
        self.request_type = Some(request_type.into());
        self
    }

    pub fn with_trace(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.stack_trace.extend(lines);
        self
    }
}

impl DynamicSerialize for ErrorResponse {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder(Self::TYPE_NAME)
            .field("error", FieldType::String, Self::TAG_ERROR)
            .field(
                "stack_trace",
                FieldType::list_of(FieldType::String),
                Self::TAG_STACK_TRACE,
            )
            .field("request_type", FieldType::String, Self::TAG_REQUEST_TYPE)
            .build()
    }

    fn to_envelope(&self) -> Envelope {
        let mut env = Envelope::new(Self::TYPE_NAME).with(Self::TAG_ERROR, self.error.as_str());
        if !self.stack_trace.is_empty() {
            let lines = self.stack_trace.iter().map(|l| Value::from(l.as_str())).collect::<Vec<_>>();
            env.set(Self::TAG_STACK_TRACE, lines);
        }
        if let Some(request_type) = &self.request_type {
            env.set(Self::TAG_REQUEST_TYPE, request_type.as_str());
        }
        env
    }

    fn from_envelope(env: &Envelope) -> SerResult<Self> {
        let stack_trace = env
            .optional_field(Self::TAG_STACK_TRACE, "list<string>", Value::as_list)?
            .unwrap_or_default()
            .iter()
            .map(|line| {
                line.as_str().map(str::to_string).ok_or_else(|| SerializationError::TypeMismatch {
                    type_name: Self::TYPE_NAME.to_string(),
                    tag: Self::TAG_STACK_TRACE,
                    expected: "string".to_string(),
                    found: line.kind_name().to_string(),
                })
            })
            .collect::<SerResult<_>>()?;

        Ok(Self {
            error: env.field(Self::TAG_ERROR, "string", Value::as_str)?.to_string(),
            stack_trace,
            request_type: env
                .optional_field(Self::TAG_REQUEST_TYPE, "string", Value::as_str)?
                .map(str::to_string),
        })
    }
}

/// A request whose encoded form travels zlib-compressed.
///
/// The dispatcher inflates `compressed_data`, decodes it with the input
/// strategy, and dispatches the inner request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeflatedRequest {
    pub compressed_data: Vec<u8>,
}

impl DeflatedRequest {
    pub const TYPE_NAME: &'static str = "tagwire.DeflatedRequest";

    const TAG_COMPRESSED_DATA: u32 = 1;

    /// Compress an already-encoded request.
    pub fn compress(encoded_request: &[u8]) -> std::io::Result<Self> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(encoded_request)?;
        Ok(Self {
            compressed_data: encoder.finish()?,
        })
    }

    /// Encode `request` with `strategy`, compress it, and encode the wrapper
    /// with the same strategy.
    pub fn wrap(strategy: &dyn SerializationStrategy, request: &Envelope) -> SerResult<Vec<u8>> {
        let inner = strategy.encode(request)?;
        let wrapper = Self::compress(&inner)
            .map_err(|e| SerializationError::malformed(0, format!("deflate failed: {}", e)))?;
        strategy.encode(&wrapper.to_envelope())
    }

    /// Decompress, refusing output longer than `limit` bytes.
    pub fn inflate(&self, limit: usize) -> SerResult<Vec<u8>> {
        let decoder = ZlibDecoder::new(self.compressed_data.as_slice());
        let mut inflated = Vec::new();
        decoder
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut inflated)
            .map_err(|e| SerializationError::malformed(0, format!("corrupt deflated request: {}", e)))?;
        if inflated.len() > limit {
            return Err(SerializationError::malformed(
                0,
                format!("deflated request inflates past {} bytes", limit),
            ));
        }
        log::debug!(
            "[tagwire] inflated request: {} bytes -> {} bytes",
            self.compressed_data.len(),
            inflated.len()
        );
        Ok(inflated)
    }
}

impl DynamicSerialize for DeflatedRequest {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder(Self::TYPE_NAME)
            .field("compressed_data", FieldType::Bytes, Self::TAG_COMPRESSED_DATA)
            .build()
    }

    fn to_envelope(&self) -> Envelope {
        Envelope::new(Self::TYPE_NAME).with(Self::TAG_COMPRESSED_DATA, self.compressed_data.clone())
    }

    fn from_envelope(env: &Envelope) -> SerResult<Self> {
        Ok(Self {
            compressed_data: env
                .field(Self::TAG_COMPRESSED_DATA, "bytes", Value::as_bytes)?
                .to_vec(),
        })
    }
}

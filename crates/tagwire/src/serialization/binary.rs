// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{SerializationStrategy, BINARY_CONTENT_TYPE};
use crate::codec::{BinaryCodec, CodecLimits};
use crate::error::SerResult;
use crate::types::{Envelope, TypeRegistry};
use std::sync::Arc;

/// [`BinaryCodec`] exposed as a strategy under `application/x-tagwire`.
#[derive(Debug, Clone)]
pub struct BinaryStrategy {
    codec: BinaryCodec,
}

impl BinaryStrategy {
    pub fn new(registry: Arc<TypeRegistry>, limits: CodecLimits) -> Self {
        Self {
            codec: BinaryCodec::with_limits(registry, limits),
        }
    }

    pub fn codec(&self) -> &BinaryCodec {
        &self.codec
    }
}

impl SerializationStrategy for BinaryStrategy {
    fn format_name(&self) -> &str {
        BINARY_CONTENT_TYPE
    }

    fn encode(&self, envelope: &Envelope) -> SerResult<Vec<u8>> {
        self.codec.encode(envelope)
    }

    fn decode(&self, bytes: &[u8]) -> SerResult<Envelope> {
        self.codec.decode(bytes)
    }
}

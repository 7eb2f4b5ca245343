// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire format strategies and the manager that selects them by content type.

mod binary;
mod json;
mod manager;

pub use binary::BinaryStrategy;
pub use json::JsonStrategy;
pub use manager::{SerializationManager, SerializationManagerBuilder};

use crate::error::SerResult;
use crate::types::Envelope;

/// Content type of the tagged binary format.
pub const BINARY_CONTENT_TYPE: &str = "application/x-tagwire";

/// Content type of the JSON format.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One wire format.
///
/// Strategies are stateless after construction and shared between threads.
pub trait SerializationStrategy: Send + Sync {
    /// Content type this strategy is registered under.
    fn format_name(&self) -> &str;

    fn encode(&self, envelope: &Envelope) -> SerResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> SerResult<Envelope>;
}

/// Lower-case a content type and drop any `;`-parameters.
///
/// `"Application/JSON; charset=utf-8"` becomes `"application/json"`.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

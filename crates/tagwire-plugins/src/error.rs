// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Plugin registry and cache router errors.

use thiserror::Error;

/// Rejected plugin registration. Returned to the caller of `register`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("invalid plugin descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },
}

/// Cache router failures.
#[derive(Debug, Error)]
pub enum CacheRouterError {
    #[error("invalid cache name '{name}': {reason}")]
    InvalidCacheName { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("assignment file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheRouterError {
    pub(crate) fn invalid_cache_name(name: &str, reason: &str) -> Self {
        Self::InvalidCacheName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Plugin descriptors and their capability flags.

use crate::error::PluginError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;

/// Declared data-access characteristics of a plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const NONE: Self = Self(0);

    /// High-churn, append-only writes (time series, point data).
    pub const APPEND_ONLY: Self = Self(1 << 0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        if self.contains(Self::APPEND_ONLY) {
            f.write_str("append-only")?;
        }
        let unknown = self.0 & !Self::APPEND_ONLY.0;
        if unknown != 0 {
            if self.contains(Self::APPEND_ONLY) {
                f.write_str("|")?;
            }
            write!(f, "{:#x}", unknown)?;
        }
        Ok(())
    }
}

/// A registered plugin. Re-registration replaces the descriptor; it is never
/// patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    name: String,
    #[serde(default)]
    capabilities: Capabilities,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Capabilities::NONE,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set or clear the append-only capability.
    pub fn append_only(mut self, enabled: bool) -> Self {
        if enabled {
            self.capabilities.insert(Capabilities::APPEND_ONLY);
        } else {
            self.capabilities.remove(Capabilities::APPEND_ONLY);
        }
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn is_append_only(&self) -> bool {
        self.capabilities.contains(Capabilities::APPEND_ONLY)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Names are used as cache-routing keys and path components.
    pub fn validate(&self) -> Result<(), PluginError> {
        let reason = if self.name.is_empty() {
            Some("name must not be empty")
        } else if self.name.chars().any(char::is_whitespace) {
            Some("name must not contain whitespace")
        } else if self.name.contains(['/', '\\']) {
            Some("name must not contain a path separator")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(PluginError::InvalidDescriptor {
                name: self.name.clone(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

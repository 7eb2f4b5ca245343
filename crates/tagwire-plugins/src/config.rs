// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Router configuration and plugin manifest.

use crate::descriptor::PluginDescriptor;
use crate::error::{CacheRouterError, PluginError};
use crate::router::{CacheRouter, DEFAULT_CACHE_NAME, DEFAULT_DEDICATED_CACHE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Router(#[from] CacheRouterError),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Cache router configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Cache for append-only plugins.
    #[serde(default = "default_dedicated_cache")]
    pub dedicated_cache: String,

    /// Shared cache for everything else.
    #[serde(default = "default_cache")]
    pub default_cache: String,

    /// Where assignments are persisted between runs.
    #[serde(default)]
    pub registry_file: Option<PathBuf>,

    /// Plugins known up front.
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
}

/// One `[[plugins]]` manifest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,

    #[serde(default)]
    pub append_only: bool,

    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_dedicated_cache() -> String {
    DEFAULT_DEDICATED_CACHE_NAME.to_string()
}

fn default_cache() -> String {
    DEFAULT_CACHE_NAME.to_string()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            dedicated_cache: default_dedicated_cache(),
            default_cache: default_cache(),
            registry_file: None,
            plugins: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Example manifest used by `tagwirectl gen-config`.
    pub fn sample() -> Self {
        Self {
            registry_file: Some(PathBuf::from("cache-assignments.json")),
            plugins: vec![
                PluginSpec {
                    name: "pointdata".to_string(),
                    append_only: true,
                    properties: BTreeMap::new(),
                },
                PluginSpec {
                    name: "radar".to_string(),
                    append_only: false,
                    properties: [("format".to_string(), "netcdf".to_string())]
                        .into_iter()
                        .collect(),
                },
            ],
            ..Self::default()
        }
    }

    /// Validate cache names and the plugin manifest.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::router::validate_cache_name(&self.dedicated_cache)?;
        crate::router::validate_cache_name(&self.default_cache)?;

        let mut seen = HashSet::new();
        for spec in &self.plugins {
            spec.to_descriptor().validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Plugin '{}' listed twice",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    pub fn build_router(&self) -> Result<CacheRouter, ConfigError> {
        Ok(CacheRouter::new(
            self.dedicated_cache.clone(),
            self.default_cache.clone(),
        )?)
    }

    /// Manifest entries in declaration order.
    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.plugins.iter().map(PluginSpec::to_descriptor).collect()
    }
}

impl PluginSpec {
    pub fn to_descriptor(&self) -> PluginDescriptor {
        self.properties.iter().fold(
            PluginDescriptor::new(self.name.clone()).append_only(self.append_only),
            |desc, (k, v)| desc.with_property(k.clone(), v.clone()),
        )
    }
}

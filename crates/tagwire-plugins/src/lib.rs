// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tagwire-plugins - plugin registry and cache routing
//!
//! A [`PluginRegistry`] collects plugin descriptors over the process
//! lifetime and publishes add/remove events to listeners, replaying existing
//! plugins to every listener as it attaches. The [`CacheRouter`] is such a
//! listener: it assigns append-only plugins to a dedicated cache partition.
//!
//! ```
//! use std::sync::Arc;
//! use tagwire_plugins::{CacheRouter, PluginDescriptor, PluginRegistry};
//!
//! let registry = PluginRegistry::new();
//! registry.register(PluginDescriptor::new("pointdata").append_only(true)).unwrap();
//!
//! // attaching late still sees "pointdata"
//! let router = Arc::new(CacheRouter::with_defaults());
//! registry.add_listener(router.clone());
//! registry.register(PluginDescriptor::new("radar")).unwrap();
//!
//! assert_eq!(router.cache_name_for("pointdata"), "pointDataCache");
//! assert_eq!(router.cache_name_for("radar"), "defaultDataStore");
//! assert_eq!(router.assignments().len(), 1);
//! ```

pub mod backend;
pub mod config;
pub mod descriptor;
pub mod error;
mod persistence;
pub mod registry;
pub mod router;

pub use backend::{CacheBackend, CacheHandle, InMemoryCacheBackend};
pub use config::{ConfigError, PluginSpec, RouterConfig};
pub use descriptor::{Capabilities, PluginDescriptor};
pub use error::{CacheRouterError, PluginError};
pub use registry::{ListenerError, ListenerId, PluginEvent, PluginListener, PluginRegistry};
pub use router::{
    Assignments, CacheRouter, DEFAULT_CACHE_NAME, DEFAULT_DEDICATED_CACHE_NAME, NO_CACHE,
};

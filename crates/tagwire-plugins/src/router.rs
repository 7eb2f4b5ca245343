// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cache partition routing.
//!
//! [`CacheRouter`] listens to a [`crate::PluginRegistry`] and assigns every
//! append-only plugin to the dedicated cache. Everything else stays on the
//! default cache, which is represented by the absence of an entry.
//!
//! Readers get an immutable snapshot through `ArcSwap`; writers serialize on
//! a small mutex and publish a new map.

use crate::backend::{CacheBackend, CacheHandle};
use crate::descriptor::PluginDescriptor;
use crate::error::CacheRouterError;
use crate::registry::{ListenerError, PluginEvent, PluginListener};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cache used by plugins without a dedicated assignment.
pub const DEFAULT_CACHE_NAME: &str = "defaultDataStore";

/// Cache for append-only plugins unless configured otherwise.
pub const DEFAULT_DEDICATED_CACHE_NAME: &str = "pointDataCache";

/// Reserved name meaning "the default cache".
pub const NO_CACHE: &str = "none";

pub type Assignments = BTreeMap<String, String>;

/// Check a cache name usable for routing.
pub fn validate_cache_name(name: &str) -> Result<(), CacheRouterError> {
    if name.is_empty() {
        Err(CacheRouterError::invalid_cache_name(name, "must not be empty"))
    } else if name.chars().any(char::is_whitespace) {
        Err(CacheRouterError::invalid_cache_name(
            name,
            "must not contain whitespace",
        ))
    } else if name.eq_ignore_ascii_case(NO_CACHE) {
        Err(CacheRouterError::invalid_cache_name(name, "is reserved"))
    } else {
        Ok(())
    }
}

pub struct CacheRouter {
    dedicated_cache: String,
    default_cache: String,
    assignments: ArcSwap<Assignments>,
    writer: Mutex<()>,
    /// Set on every change, cleared by save/load.
    dirty: AtomicBool,
}

impl CacheRouter {
    pub fn new(
        dedicated_cache: impl Into<String>,
        default_cache: impl Into<String>,
    ) -> Result<Self, CacheRouterError> {
        let dedicated_cache = dedicated_cache.into();
        let default_cache = default_cache.into();
        validate_cache_name(&dedicated_cache)?;
        validate_cache_name(&default_cache)?;
        Ok(Self {
            dedicated_cache,
            default_cache,
            assignments: ArcSwap::from_pointee(Assignments::new()),
            writer: Mutex::new(()),
            dirty: AtomicBool::new(false),
        })
    }

    /// Router using `pointDataCache` and `defaultDataStore`.
    pub fn with_defaults() -> Self {
        Self {
            dedicated_cache: DEFAULT_DEDICATED_CACHE_NAME.to_string(),
            default_cache: DEFAULT_CACHE_NAME.to_string(),
            assignments: ArcSwap::from_pointee(Assignments::new()),
            writer: Mutex::new(()),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn dedicated_cache(&self) -> &str {
        &self.dedicated_cache
    }

    pub fn default_cache(&self) -> &str {
        &self.default_cache
    }

    /// Snapshot of the assignment table. Plugins on the default cache are
    /// absent.
    pub fn assignments(&self) -> Arc<Assignments> {
        self.assignments.load_full()
    }

    /// Explicit assignment, if any.
    pub fn assigned_cache(&self, plugin: &str) -> Option<String> {
        self.assignments.load().get(plugin).cloned()
    }

    /// Cache serving `plugin`, falling back to the default cache.
    pub fn cache_name_for(&self, plugin: &str) -> String {
        self.assigned_cache(plugin)
            .unwrap_or_else(|| self.default_cache.clone())
    }

    /// Cache serving a data-store path whose first component names the
    /// plugin, e.g. `/pointdata/2026/10/19.h5`.
    pub fn cache_name_for_path(&self, path: &str) -> String {
        let plugin = path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        if plugin.is_empty() {
            return self.default_cache.clone();
        }
        self.cache_name_for(plugin)
    }

    /// Resolve `plugin` to a cache handle. The backend owns cache creation.
    pub fn resolve(
        &self,
        backend: &dyn CacheBackend,
        plugin: &str,
    ) -> Result<CacheHandle, CacheRouterError> {
        backend.create_or_get_named_cache(&self.cache_name_for(plugin))
    }

    /// Drop the assignment of `plugin`, moving it back to the default cache.
    /// Removal events never do this on their own.
    pub fn retract(&self, plugin: &str) -> Option<String> {
        let removed = self.update(|map| map.remove(plugin));
        if let Some(cache) = &removed {
            log::info!(
                "[cache-router] retracted {} from {}, now on {}",
                plugin,
                cache,
                self.default_cache
            );
        }
        removed
    }

    /// Apply an added/replaced plugin. Last write wins.
    pub fn on_added(&self, plugin: &PluginDescriptor) {
        let name = plugin.name();
        if plugin.is_append_only() {
            let target = &self.dedicated_cache;
            let change = self.update(|map| {
                if map.get(name) == Some(target) {
                    return None;
                }
                Some(map.insert(name.to_string(), target.clone()))
            });
            match change {
                None => log::debug!("[cache-router] {} already on {}", name, target),
                Some(None) => log::info!("[cache-router] assigned {} to {}", name, target),
                Some(Some(old)) => {
                    log::warn!("[cache-router] {} moved from {} to {}", name, old, target)
                }
            }
        } else if let Some(old) = self.update(|map| map.remove(name)) {
            log::warn!(
                "[cache-router] {} moved from {} to {}",
                name,
                old,
                self.default_cache
            );
        }
    }

    /// Run `change` on a copy of the table and publish it if it returned
    /// `Some`.
    fn update<R>(&self, change: impl FnOnce(&mut Assignments) -> Option<R>) -> Option<R> {
        let _guard = self.writer.lock();
        let mut next = Assignments::clone(&self.assignments.load());
        let result = change(&mut next)?;
        self.assignments.store(Arc::new(next));
        self.dirty.store(true, Ordering::Release);
        Some(result)
    }

    pub(crate) fn writer_lock(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.writer.lock()
    }

    pub(crate) fn publish(&self, assignments: Assignments) {
        self.assignments.store(Arc::new(assignments));
    }

    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }
}

impl Default for CacheRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for CacheRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRouter")
            .field("dedicated_cache", &self.dedicated_cache)
            .field("default_cache", &self.default_cache)
            .field("assignments", &**self.assignments.load())
            .finish()
    }
}

impl PluginListener for CacheRouter {
    fn on_event(&self, event: &PluginEvent) -> Result<(), ListenerError> {
        match event {
            PluginEvent::Added(plugin) => self.on_added(plugin),
            PluginEvent::Removed(plugin) => log::debug!(
                "[cache-router] {} removed, keeping its assignment",
                plugin.name()
            ),
        }
        Ok(())
    }
}

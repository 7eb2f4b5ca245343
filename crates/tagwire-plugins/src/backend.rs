// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cache backend seam.
//!
//! The router only produces cache names; a [`CacheBackend`] owns the physical
//! caches behind them.

use crate::error::CacheRouterError;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Opaque reference to a named cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheHandle {
    name: Arc<str>,
    id: u64,
}

impl CacheHandle {
    pub fn new(name: &str, id: u64) -> Self {
        Self {
            name: Arc::from(name),
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Creates or looks up named caches.
pub trait CacheBackend: Send + Sync {
    fn create_or_get_named_cache(&self, name: &str) -> Result<CacheHandle, CacheRouterError>;
}

struct MemoryCache {
    id: u64,
    entries: HashMap<String, Vec<u8>>,
}

/// Key/value caches held in process memory.
#[derive(Default)]
pub struct InMemoryCacheBackend {
    caches: Mutex<BTreeMap<String, MemoryCache>>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every cache created so far, sorted.
    pub fn cache_names(&self) -> Vec<String> {
        self.caches.lock().keys().cloned().collect()
    }

    pub fn put(
        &self,
        cache: &CacheHandle,
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>, CacheRouterError> {
        let mut caches = self.caches.lock();
        let entry = Self::lookup(&mut caches, cache)?;
        Ok(entry.entries.insert(key.into(), value.into()))
    }

    pub fn get(&self, cache: &CacheHandle, key: &str) -> Result<Option<Vec<u8>>, CacheRouterError> {
        let mut caches = self.caches.lock();
        let entry = Self::lookup(&mut caches, cache)?;
        Ok(entry.entries.get(key).cloned())
    }

    pub fn len(&self, cache: &CacheHandle) -> Result<usize, CacheRouterError> {
        let mut caches = self.caches.lock();
        Ok(Self::lookup(&mut caches, cache)?.entries.len())
    }

    fn lookup<'a>(
        caches: &'a mut BTreeMap<String, MemoryCache>,
        handle: &CacheHandle,
    ) -> Result<&'a mut MemoryCache, CacheRouterError> {
        match caches.get_mut(handle.name()) {
            Some(cache) if cache.id == handle.id() => Ok(cache),
            _ => Err(CacheRouterError::Backend(format!("stale cache handle {}", handle))),
        }
    }
}

impl CacheBackend for InMemoryCacheBackend {
    fn create_or_get_named_cache(&self, name: &str) -> Result<CacheHandle, CacheRouterError> {
        crate::router::validate_cache_name(name)?;
        let mut caches = self.caches.lock();
        let next_id = caches.len() as u64;
        let cache = caches.entry(name.to_string()).or_insert_with(|| {
            log::debug!("[cache-backend] created cache {}", name);
            MemoryCache {
                id: next_id,
                entries: HashMap::new(),
            }
        });
        Ok(CacheHandle::new(name, cache.id))
    }
}

impl fmt::Debug for InMemoryCacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCacheBackend")
            .field("caches", &self.cache_names())
            .finish()
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Saving and restoring the cache assignment table as JSON.

use crate::error::CacheRouterError;
use crate::router::{validate_cache_name, Assignments, CacheRouter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

impl CacheRouter {
    /// Write the assignment table to `path` as sorted JSON if it changed
    /// since the last save or load. Returns whether the file was written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<bool, CacheRouterError> {
        let path = path.as_ref();
        if !self.take_dirty() {
            return Ok(false);
        }
        let snapshot = self.assignments();
        let result = serde_json::to_string_pretty(&*snapshot)
            .map_err(CacheRouterError::from)
            .and_then(|json| {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, json)?;
                Ok(())
            });
        if let Err(e) = result {
            self.set_dirty(true);
            return Err(e);
        }
        log::info!(
            "[cache-router] saved {} assignments to {}",
            snapshot.len(),
            path.display()
        );
        Ok(true)
    }

    /// Merge assignments from `path`. Entries already assigned in memory win;
    /// a missing file is not an error. Returns the number of entries taken
    /// from the file.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<usize, CacheRouterError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("[cache-router] no assignment file at {}", path.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };
        let stored: Assignments = serde_json::from_str(&content)?;

        let _guard = self.writer_lock();
        let mut merged = Assignments::clone(&self.assignments());
        let mut taken = 0;
        for (plugin, cache) in &stored {
            if let Err(e) = validate_cache_name(cache) {
                log::warn!("[cache-router] ignoring stored entry for {}: {}", plugin, e);
                continue;
            }
            if !merged.contains_key(plugin) {
                merged.insert(plugin.clone(), cache.clone());
                taken += 1;
            }
        }
        self.set_dirty(merged != stored);
        self.publish(merged);
        log::info!(
            "[cache-router] loaded {} assignments from {}",
            taken,
            path.display()
        );
        Ok(taken)
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Name-keyed registry of type descriptors.
//!
//! The binary encoding carries type names and tags but no schema. Every
//! process taking part in an exchange must therefore register compatible
//! descriptors: same names, same tags for the fields both sides know.
//! Extra fields on either side are tolerated, a missing type is not.

use super::descriptor::TypeDescriptor;
use super::DynamicSerialize;
use crate::dispatch::{DeflatedRequest, ErrorResponse};
use crate::error::{SerResult, SerializationError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Concurrent registry of [`TypeDescriptor`]s.
///
/// Registration normally happens once at start-up; lookups afterwards are
/// lock-free reads.
pub struct TypeRegistry {
    by_name: DashMap<String, Arc<TypeDescriptor>>,
    by_type_id: DashMap<TypeId, String>,
}

impl TypeRegistry {
    /// Registry pre-loaded with the built-in `ErrorResponse` and
    /// `DeflatedRequest` types.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.insert_builtin::<ErrorResponse>();
        registry.insert_builtin::<DeflatedRequest>();
        registry
    }

    /// Registry without any built-in types.
    pub fn empty() -> Self {
        Self {
            by_name: DashMap::new(),
            by_type_id: DashMap::new(),
        }
    }

    fn insert_builtin<T: DynamicSerialize + 'static>(&self) {
        let desc = T::type_descriptor();
        self.by_type_id.insert(TypeId::of::<T>(), desc.name.clone());
        self.by_name.insert(desc.name.clone(), Arc::new(desc));
    }

    /// Register a descriptor.
    ///
    /// Registering an identical descriptor twice is a no-op. A different
    /// shape under an existing name fails with `DuplicateType`.
    pub fn register(&self, descriptor: TypeDescriptor) -> SerResult<Arc<TypeDescriptor>> {
        descriptor.validate()?;

        match self.by_name.entry(descriptor.name.clone()) {
            Entry::Occupied(existing) => {
                if **existing.get() == descriptor {
                    Ok(Arc::clone(existing.get()))
                } else {
                    Err(SerializationError::DuplicateType {
                        name: descriptor.name,
                    })
                }
            }
            Entry::Vacant(slot) => {
                log::debug!(
                    "[tagwire] registered type {} ({} fields)",
                    descriptor.name,
                    descriptor.fields.len()
                );
                let desc = Arc::new(descriptor);
                slot.insert(Arc::clone(&desc));
                Ok(desc)
            }
        }
    }

    /// Register the descriptor of a Rust type and index it by `TypeId`.
    pub fn register_type<T: DynamicSerialize + 'static>(&self) -> SerResult<Arc<TypeDescriptor>> {
        let desc = self.register(T::type_descriptor())?;
        self.by_type_id.insert(TypeId::of::<T>(), desc.name.clone());
        Ok(desc)
    }

    pub fn resolve_by_name(&self, name: &str) -> SerResult<Arc<TypeDescriptor>> {
        self.by_name
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SerializationError::unknown_type(name))
    }

    /// Descriptor registered for the Rust type `T` via [`Self::register_type`].
    pub fn resolve_by_runtime_type<T: 'static>(&self) -> SerResult<Arc<TypeDescriptor>> {
        self.resolve_by_type_id(TypeId::of::<T>())
            .map_err(|_| SerializationError::unknown_type(std::any::type_name::<T>()))
    }

    pub fn resolve_by_type_id(&self, type_id: TypeId) -> SerResult<Arc<TypeDescriptor>> {
        let name = self
            .by_type_id
            .get(&type_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SerializationError::unknown_type(format!("{:?}", type_id)))?;
        self.resolve_by_name(&name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

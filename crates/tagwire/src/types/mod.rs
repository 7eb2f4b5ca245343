// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type information: descriptors, values, and the type registry.

mod descriptor;
mod registry;
mod value;

pub use descriptor::{FieldDescriptor, FieldType, TypeDescriptor, TypeDescriptorBuilder, MAX_TAG};
pub use registry::TypeRegistry;
pub use value::{Envelope, Value};

use crate::error::SerResult;

/// Rust types with a registered wire shape.
///
/// Implementors describe themselves once and convert to and from an
/// [`Envelope`]; the codecs only ever see envelopes.
pub trait DynamicSerialize: Sized {
    /// Descriptor registered for this type.
    fn type_descriptor() -> TypeDescriptor;

    fn to_envelope(&self) -> Envelope;

    fn from_envelope(envelope: &Envelope) -> SerResult<Self>;
}

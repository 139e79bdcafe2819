//! Field handler traits.
//!
//! A [`FieldHandler`] is a registered strategy: it decides whether it can map
//! a property and, once selected, configures a [`BoundField`] for that single
//! property. The bound field does the per-record work.

use std::collections::HashSet;
use std::sync::Arc;

use contour_store::{EditScope, Record};
use contour_types::TypeKey;

use crate::context::MappingContext;
use crate::declaration::{PropertyDeclaration, PropertyMarker};
use crate::error::{ConfigError, MapperError, MapperResult};
use crate::value::Value;

/// The set of types discovered by the registry, known before any handler is
/// configured.
#[derive(Clone, Debug, Default)]
pub struct KnownTypes(HashSet<TypeKey>);

impl KnownTypes {
    /// Returns `true` if `key` was discovered as a mapped type.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.0.contains(key)
    }

    /// Number of known types.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no types are known.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TypeKey> for KnownTypes {
    fn from_iter<I: IntoIterator<Item = TypeKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Everything a handler sees when it is configured for one property.
#[derive(Clone, Copy, Debug)]
pub struct HandlerTarget<'a> {
    pub owner: TypeKey,
    pub property: &'a PropertyDeclaration,
    pub marker: &'a PropertyMarker,
    pub known: &'a KnownTypes,
}

impl HandlerTarget<'_> {
    /// Store field name for the property.
    pub fn field_name(&self) -> String {
        self.property.field_name().to_string()
    }

    /// Build an [`ConfigError::IncompatibleHandler`] for this target.
    pub fn incompatible(&self, handler: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::IncompatibleHandler {
            type_name: self.owner.to_string(),
            property: self.property.name.clone(),
            handler: handler.to_string(),
            reason: reason.into(),
        }
    }
}

/// A registered field-conversion strategy.
///
/// The trait is object-safe and `Send + Sync` so handlers can be stored in a
/// `Vec<Arc<dyn FieldHandler>>` and shared by every schema.
pub trait FieldHandler: Send + Sync {
    /// Human-readable name of this handler (e.g. "image", "parent").
    fn name(&self) -> &str;

    /// Pure predicate over the property's declared metadata.
    fn can_handle(&self, property: &PropertyDeclaration) -> bool;

    /// Bind this handler to one property. Runs once per property, before any
    /// read or write, and may reject bindings that passed `can_handle` but
    /// are structurally incompatible.
    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError>;
}

/// A handler configured for one property of one type.
pub trait BoundField: Send + Sync {
    /// Read the property value from `record`.
    fn read(&self, record: &Record, ctx: &MappingContext) -> MapperResult<Value>;

    /// Write `value` into the record behind `scope`.
    fn write(&self, scope: &mut EditScope<'_>, value: &Value, ctx: &MappingContext)
        -> MapperResult<()>;

    /// Whether [`BoundField::write`] is supported. Mapping an instance onto a
    /// record skips properties that are not writable.
    fn writable(&self) -> bool {
        true
    }
}

/// Error for a write through a read-only binding.
pub(crate) fn unsupported_write(owner: &TypeKey, property: &str, reason: &str) -> MapperError {
    MapperError::Unsupported {
        type_name: owner.to_string(),
        property: property.to_string(),
        reason: reason.to_string(),
    }
}

/// Error for a value whose shape does not match the binding.
pub(crate) fn unexpected_value(property: &str, expected: &'static str, value: &Value) -> MapperError {
    MapperError::TypeMismatch {
        property: property.to_string(),
        expected,
        found: value.kind_name(),
    }
}

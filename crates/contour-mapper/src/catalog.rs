//! Type catalogs and source groups.
//!
//! A [`TypeCatalog`] is a named container of candidate types, the unit a
//! source group points at. A [`SourceGroup`] selects the candidates of one
//! catalog whose type path starts with a prefix.

use std::fmt;
use std::sync::Arc;

use contour_types::TypeKey;
use serde::{Deserialize, Serialize};

use crate::declaration::{Mapped, TypeDescriptor};
use crate::error::{ConfigError, MapperResult};
use crate::lazy::Instance;
use crate::schema::Factory;
use crate::value::PropertyValues;

/// A type offered for discovery, with its descriptor and constructor.
#[derive(Clone, Copy)]
pub struct CandidateType {
    pub key: TypeKey,
    pub describe: fn() -> TypeDescriptor,
    pub factory: Factory,
}

impl CandidateType {
    pub fn of<T: Mapped>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            describe: T::describe,
            factory: construct::<T>,
        }
    }
}

impl fmt::Debug for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CandidateType").field(&self.key).finish()
    }
}

fn construct<T: Mapped>(values: &mut PropertyValues) -> MapperResult<Instance> {
    Ok(Arc::new(T::from_values(values)?))
}

/// A named set of candidate types.
#[derive(Clone, Debug)]
pub struct TypeCatalog {
    name: String,
    types: Vec<CandidateType>,
}

impl TypeCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offer `T` for discovery. Registering a type twice has no effect.
    pub fn register<T: Mapped>(&mut self) {
        let candidate = CandidateType::of::<T>();
        if !self.types.iter().any(|t| t.key == candidate.key) {
            self.types.push(candidate);
        }
    }

    /// Builder form of [`TypeCatalog::register`].
    pub fn with<T: Mapped>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Candidates in registration order.
    pub fn candidates(&self) -> &[CandidateType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A catalog name plus a type-path prefix filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
    /// Type path prefix, e.g. `my_site::model`. Empty matches every type.
    pub prefix: String,
    /// Name of the catalog to scan.
    pub catalog: String,
}

impl SourceGroup {
    pub fn new(prefix: impl Into<String>, catalog: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            catalog: catalog.into(),
        }
    }

    /// Parse the `"<prefix>, <catalog>"` form.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let (prefix, catalog) = s
            .split_once(',')
            .ok_or_else(|| ConfigError::InvalidSourceGroup(s.to_string()))?;
        let (prefix, catalog) = (prefix.trim(), catalog.trim());
        if catalog.is_empty() || catalog.contains(',') {
            return Err(ConfigError::InvalidSourceGroup(s.to_string()));
        }
        Ok(Self::new(prefix, catalog))
    }

    /// Returns `true` if `key` lies under this group's prefix.
    pub fn matches(&self, key: &TypeKey) -> bool {
        key.path().starts_with(&self.prefix)
    }
}

impl fmt::Display for SourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.prefix, self.catalog)
    }
}

//! The configuration registry: every mapped type's schema, built once.

use std::collections::HashMap;
use std::sync::Arc;

use contour_types::{Guid, TypeKey};
use serde::{Deserialize, Serialize};

use crate::chain::HandlerChain;
use crate::error::{ConfigError, MapperError, MapperResult};
use crate::handler::KnownTypes;
use crate::loader::{ConfigurationLoader, Discovery, Rejection};
use crate::schema::{self, ClassSchema};

/// What to do when some discovered types fail configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Keep every valid type; rejected types report
    /// [`MapperError::InvalidType`] on lookup.
    #[default]
    BestEffort,
    /// Fail the whole build if any error was found.
    Strict,
}

/// Read-only map from mapped types to their schemas.
///
/// Built by [`Registry::build`] and shared through `Arc` afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    schemas: Vec<Arc<ClassSchema>>,
    by_type: HashMap<TypeKey, usize>,
    by_template: HashMap<Guid, Vec<usize>>,
    rejected: Vec<Rejection>,
    load_errors: Vec<ConfigError>,
    policy: LoadPolicy,
}

impl Registry {
    /// Run every loader, bind handlers from `chain`, and index the result.
    ///
    /// Given the same loaders and chain the result is the same.
    pub fn build(
        loaders: &[&dyn ConfigurationLoader],
        chain: &HandlerChain,
        policy: LoadPolicy,
    ) -> MapperResult<Self> {
        let mut discovery = Discovery::default();
        for loader in loaders {
            discovery.merge(loader.load());
        }
        Self::from_discovery(discovery, chain, policy)
    }

    /// Build from an already merged discovery. A type listed more than once
    /// keeps its first occurrence.
    pub fn from_discovery(
        discovery: Discovery,
        chain: &HandlerChain,
        policy: LoadPolicy,
    ) -> MapperResult<Self> {
        let mut unique = Discovery::default();
        unique.merge(discovery);
        let Discovery {
            types,
            mut rejected,
            errors: load_errors,
        } = unique;

        let known: KnownTypes = types
            .iter()
            .map(|t| t.candidate.key)
            .chain(rejected.iter().map(|r| r.key))
            .collect();

        let mut registry = Self {
            policy,
            ..Self::default()
        };
        for discovered in &types {
            match schema::build(discovered, chain, &known) {
                Ok(schema) => registry.insert(schema),
                Err(errors) => rejected.push(Rejection {
                    key: discovered.candidate.key,
                    errors,
                }),
            }
        }

        for rejection in &rejected {
            for error in &rejection.errors {
                tracing::warn!(type_name = %rejection.key, error = %error, "mapped type rejected");
            }
        }
        for error in &load_errors {
            tracing::warn!(error = %error, "configuration source failed");
        }

        if policy == LoadPolicy::Strict && (!rejected.is_empty() || !load_errors.is_empty()) {
            let errors = load_errors
                .into_iter()
                .chain(rejected.into_iter().flat_map(|r| r.errors))
                .collect();
            return Err(MapperError::Configuration { errors });
        }

        registry.rejected = rejected;
        registry.load_errors = load_errors;
        tracing::info!(
            mapped = registry.schemas.len(),
            rejected = registry.rejected.len(),
            ?policy,
            "mapping registry built"
        );
        Ok(registry)
    }

    fn insert(&mut self, schema: ClassSchema) {
        let index = self.schemas.len();
        self.by_type.insert(schema.key(), index);
        if !schema.template_id().is_nil() {
            self.by_template
                .entry(schema.template_id())
                .or_default()
                .push(index);
        }
        self.schemas.push(Arc::new(schema));
    }

    /// Schema of `key`.
    ///
    /// Distinguishes a type that was never discovered ([`MapperError::NotMapped`])
    /// from one that was discovered but rejected ([`MapperError::InvalidType`]).
    pub fn lookup_by_type(&self, key: &TypeKey) -> MapperResult<&Arc<ClassSchema>> {
        if let Some(index) = self.by_type.get(key) {
            return Ok(&self.schemas[*index]);
        }
        match self.rejected.iter().find(|r| r.key == *key) {
            Some(rejection) => Err(MapperError::InvalidType {
                type_name: key.to_string(),
                errors: rejection.errors.clone(),
            }),
            None => Err(MapperError::NotMapped {
                type_name: key.to_string(),
            }),
        }
    }

    /// Schema of `T`.
    pub fn schema_for<T: 'static>(&self) -> MapperResult<&Arc<ClassSchema>> {
        self.lookup_by_type(&TypeKey::of::<T>())
    }

    /// Every schema correlated with `template`, in discovery order.
    /// The nil template matches nothing.
    pub fn lookup_by_template(&self, template: &Guid) -> Vec<&Arc<ClassSchema>> {
        self.by_template
            .get(template)
            .map(|indexes| indexes.iter().map(|i| &self.schemas[*i]).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `key` has a valid schema.
    pub fn is_mapped(&self, key: &TypeKey) -> bool {
        self.by_type.contains_key(key)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<ClassSchema>> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Types excluded by a best-effort build.
    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    /// Source-level errors tolerated by a best-effort build.
    pub fn load_errors(&self) -> &[ConfigError] {
        &self.load_errors
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }
}

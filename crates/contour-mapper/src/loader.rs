//! Configuration loaders.
//!
//! A loader scans its sources once and reports what it found: types ready to
//! have handlers bound, types rejected while reading their class marker, and
//! source-level errors not tied to any type.

use std::collections::HashSet;

use contour_types::{Guid, TypeKey};

use crate::catalog::{CandidateType, SourceGroup, TypeCatalog};
use crate::declaration::{ClassMarker, PropertyDeclaration};
use crate::error::ConfigError;

/// A type that carries a class marker, with its marked properties.
#[derive(Clone, Debug)]
pub struct DiscoveredType {
    pub candidate: CandidateType,
    pub marker: ClassMarker,
    pub template_id: Guid,
    pub branch_id: Guid,
    /// Own then inherited declarations that carry a property marker.
    pub properties: Vec<PropertyDeclaration>,
}

/// A type excluded from the registry with every reason found.
#[derive(Clone, Debug)]
pub struct Rejection {
    pub key: TypeKey,
    pub errors: Vec<ConfigError>,
}

/// Everything a loader found.
#[derive(Clone, Debug, Default)]
pub struct Discovery {
    pub types: Vec<DiscoveredType>,
    pub rejected: Vec<Rejection>,
    /// Errors not tied to a single type.
    pub errors: Vec<ConfigError>,
}

impl Discovery {
    /// Fold `other` into this discovery. The first occurrence of a type wins.
    pub fn merge(&mut self, other: Discovery) {
        let mut seen: HashSet<TypeKey> = self
            .types
            .iter()
            .map(|t| t.candidate.key)
            .chain(self.rejected.iter().map(|r| r.key))
            .collect();
        for discovered in other.types {
            if seen.insert(discovered.candidate.key) {
                self.types.push(discovered);
            }
        }
        for rejection in other.rejected {
            if seen.insert(rejection.key) {
                self.rejected.push(rejection);
            }
        }
        self.errors.extend(other.errors);
    }

    /// Returns `true` if anything was rejected or failed.
    pub fn has_errors(&self) -> bool {
        !self.rejected.is_empty() || !self.errors.is_empty()
    }
}

/// A source of mapped-type metadata.
pub trait ConfigurationLoader {
    fn load(&self) -> Discovery;
}

/// Discovers types from [`TypeCatalog`]s selected by [`SourceGroup`]s.
#[derive(Clone, Debug, Default)]
pub struct CatalogLoader {
    catalogs: Vec<TypeCatalog>,
    groups: Vec<SourceGroup>,
}

impl CatalogLoader {
    pub fn new(catalogs: impl IntoIterator<Item = TypeCatalog>) -> Self {
        Self {
            catalogs: catalogs.into_iter().collect(),
            groups: Vec::new(),
        }
    }

    /// Scan the catalog named by `group`, filtered by its prefix.
    pub fn group(mut self, group: SourceGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    fn catalog(&self, name: &str) -> Option<&TypeCatalog> {
        self.catalogs.iter().find(|c| c.name() == name)
    }
}

impl ConfigurationLoader for CatalogLoader {
    fn load(&self) -> Discovery {
        let mut discovery = Discovery::default();
        let mut seen = HashSet::new();

        for group in &self.groups {
            let Some(catalog) = self.catalog(&group.catalog) else {
                discovery
                    .errors
                    .push(ConfigError::UnknownCatalog(group.catalog.clone()));
                continue;
            };
            for candidate in catalog.candidates() {
                if !group.matches(&candidate.key) || !seen.insert(candidate.key) {
                    continue;
                }
                match inspect(candidate) {
                    Inspected::Unmarked => {
                        tracing::trace!(type_name = %candidate.key, "no class marker, skipped");
                    }
                    Inspected::Discovered(discovered) => {
                        tracing::debug!(
                            type_name = %candidate.key,
                            template = %discovered.template_id,
                            properties = discovered.properties.len(),
                            "discovered mapped type"
                        );
                        discovery.types.push(discovered);
                    }
                    Inspected::Rejected(errors) => discovery.rejected.push(Rejection {
                        key: candidate.key,
                        errors,
                    }),
                }
            }
        }
        discovery
    }
}

enum Inspected {
    Unmarked,
    Discovered(DiscoveredType),
    Rejected(Vec<ConfigError>),
}

fn inspect(candidate: &CandidateType) -> Inspected {
    let descriptor = (candidate.describe)();
    let Some(marker) = descriptor.class.clone() else {
        return Inspected::Unmarked;
    };

    let mut errors = Vec::new();
    let mut identifier = |field: &'static str, value: &str| {
        Guid::parse_or_nil(value).unwrap_or_else(|e| {
            errors.push(ConfigError::InvalidIdentifier {
                type_name: candidate.key.to_string(),
                field,
                value: value.to_string(),
                reason: e.to_string(),
            });
            Guid::nil()
        })
    };
    let template_id = identifier("template id", &marker.template_id);
    let branch_id = identifier("branch id", &marker.branch_id);
    if !errors.is_empty() {
        return Inspected::Rejected(errors);
    }

    let properties = descriptor
        .all_properties()
        .into_iter()
        .filter(|p| p.marker.is_some())
        .collect();
    Inspected::Discovered(DiscoveredType {
        candidate: *candidate,
        marker,
        template_id,
        branch_id,
        properties,
    })
}

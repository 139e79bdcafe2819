use serde::{Deserialize, Serialize};

use crate::catalog::{SourceGroup, TypeCatalog};
use crate::error::ConfigError;
use crate::loader::CatalogLoader;
use crate::registry::LoadPolicy;

/// Mapper configuration, usually read from a TOML document:
///
/// ```toml
/// source_groups = ["my_site::model, site"]
/// policy = "strict"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Source groups in `"<type path prefix>, <catalog>"` form.
    pub source_groups: Vec<String>,
    /// How configuration errors in individual types are handled.
    pub policy: LoadPolicy,
}

impl MapperConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }

    /// Parsed source groups, in declaration order.
    pub fn source_groups(&self) -> Result<Vec<SourceGroup>, ConfigError> {
        self.source_groups
            .iter()
            .map(|s| SourceGroup::parse(s))
            .collect()
    }

    /// A loader over `catalogs` scanning this configuration's groups.
    pub fn loader(
        &self,
        catalogs: impl IntoIterator<Item = TypeCatalog>,
    ) -> Result<CatalogLoader, ConfigError> {
        let loader = CatalogLoader::new(catalogs);
        Ok(self
            .source_groups()?
            .into_iter()
            .fold(loader, CatalogLoader::group))
    }
}

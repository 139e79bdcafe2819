//! Per-type mapping schemas and the builder that binds handlers to them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use contour_store::{EditScope, Record};
use contour_types::{Guid, TypeKey};

use crate::chain::HandlerChain;
use crate::context::MappingContext;
use crate::declaration::{ClassMarker, PropertyDeclaration};
use crate::error::{ConfigError, MapperResult};
use crate::handler::{BoundField, HandlerTarget, KnownTypes};
use crate::lazy::Instance;
use crate::loader::DiscoveredType;
use crate::value::{PropertyValues, Value};

/// Type-erased constructor that turns read values into an instance.
pub type Factory = fn(&mut PropertyValues) -> MapperResult<Instance>;

/// Structural role of a mapped property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyRole {
    Id,
    Language,
    Version,
    Ordinary,
}

impl fmt::Display for PropertyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "id",
            Self::Language => "language",
            Self::Version => "version",
            Self::Ordinary => "ordinary",
        })
    }
}

// ---------------------------------------------------------------------------
// PropertyBinding
// ---------------------------------------------------------------------------

/// One mapped property with the handler configured for it.
#[derive(Clone)]
pub struct PropertyBinding {
    declaration: PropertyDeclaration,
    role: PropertyRole,
    handler: String,
    field: Arc<dyn BoundField>,
}

impl PropertyBinding {
    /// Property name.
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// The declaration the binding was built from.
    pub fn declaration(&self) -> &PropertyDeclaration {
        &self.declaration
    }

    pub fn role(&self) -> PropertyRole {
        self.role
    }

    /// Name of the handler selected for this property.
    pub fn handler_name(&self) -> &str {
        &self.handler
    }

    /// Read the property from `record`.
    pub fn read(&self, record: &Record, ctx: &MappingContext) -> MapperResult<Value> {
        self.field.read(record, ctx)
    }

    /// Write `value` through the configured handler.
    pub fn write(
        &self,
        scope: &mut EditScope<'_>,
        value: &Value,
        ctx: &MappingContext,
    ) -> MapperResult<()> {
        self.field.write(scope, value, ctx)
    }

    pub fn writable(&self) -> bool {
        self.field.writable()
    }
}

impl fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("name", &self.declaration.name)
            .field("kind", &self.declaration.kind)
            .field("role", &self.role)
            .field("handler", &self.handler)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ClassSchema
// ---------------------------------------------------------------------------

/// The complete mapping description of one type.
///
/// Built once by the registry and immutable afterwards.
pub struct ClassSchema {
    key: TypeKey,
    marker: ClassMarker,
    template_id: Guid,
    branch_id: Guid,
    properties: Vec<PropertyBinding>,
    id_property: Option<usize>,
    language_property: Option<usize>,
    version_property: Option<usize>,
    factory: Factory,
}

impl ClassSchema {
    /// Identity of the mapped type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The class marker the schema was built from.
    pub fn marker(&self) -> &ClassMarker {
        &self.marker
    }

    /// Template the type correlates with, nil when none.
    pub fn template_id(&self) -> Guid {
        self.template_id
    }

    /// Branch the type correlates with, nil when none.
    pub fn branch_id(&self) -> Guid {
        self.branch_id
    }

    /// Mapped properties in discovery order.
    pub fn properties(&self) -> &[PropertyBinding] {
        &self.properties
    }

    /// Look up a binding by property name.
    pub fn property(&self, name: &str) -> Option<&PropertyBinding> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn id_property(&self) -> Option<&PropertyBinding> {
        self.id_property.map(|i| &self.properties[i])
    }

    pub fn language_property(&self) -> Option<&PropertyBinding> {
        self.language_property.map(|i| &self.properties[i])
    }

    pub fn version_property(&self) -> Option<&PropertyBinding> {
        self.version_property.map(|i| &self.properties[i])
    }

    /// Construct a type-erased instance from read values.
    pub fn instantiate(&self, values: &mut PropertyValues) -> MapperResult<Instance> {
        (self.factory)(values)
    }
}

impl fmt::Debug for ClassSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSchema")
            .field("key", &self.key)
            .field("template_id", &self.template_id)
            .field("branch_id", &self.branch_id)
            .field("properties", &self.properties)
            .finish()
    }
}

/// Bind every marked property of `discovered` to a handler.
///
/// All defects of the type are collected rather than stopping at the first.
pub(crate) fn build(
    discovered: &DiscoveredType,
    chain: &HandlerChain,
    known: &KnownTypes,
) -> Result<ClassSchema, Vec<ConfigError>> {
    let owner = discovered.candidate.key;
    let mut errors = Vec::new();
    let mut properties: Vec<PropertyBinding> = Vec::with_capacity(discovered.properties.len());
    let mut claimed: HashMap<PropertyRole, String> = HashMap::new();
    let mut slots: HashMap<PropertyRole, usize> = HashMap::new();

    for declaration in &discovered.properties {
        let Some(marker) = declaration.marker.as_ref() else {
            continue;
        };
        let role = marker.role();

        if role != PropertyRole::Ordinary {
            if let Some(first) = claimed.get(&role) {
                errors.push(ConfigError::DuplicateRole {
                    type_name: owner.to_string(),
                    role,
                    first: first.clone(),
                    second: declaration.name.clone(),
                });
                continue;
            }
            claimed.insert(role, declaration.name.clone());
        }

        let target = HandlerTarget {
            owner,
            property: declaration,
            marker,
            known,
        };
        match chain.bind(&target) {
            Ok((handler, field)) => {
                if role != PropertyRole::Ordinary {
                    slots.insert(role, properties.len());
                }
                properties.push(PropertyBinding {
                    declaration: declaration.clone(),
                    role,
                    handler,
                    field,
                });
            }
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ClassSchema {
        key: owner,
        marker: discovered.marker.clone(),
        template_id: discovered.template_id,
        branch_id: discovered.branch_id,
        properties,
        id_property: slots.get(&PropertyRole::Id).copied(),
        language_property: slots.get(&PropertyRole::Language).copied(),
        version_property: slots.get(&PropertyRole::Version).copied(),
        factory: discovered.candidate.factory,
    })
}

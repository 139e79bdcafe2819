//! Handlers for record metadata: identifier, language and version.
//!
//! These values belong to the record itself rather than to a field, so the
//! bound fields are read-only.

use std::sync::Arc;

use contour_store::{EditScope, Record};
use contour_types::TypeKey;

use crate::context::MappingContext;
use crate::declaration::{PropertyDeclaration, PropertyMarker, ValueKind};
use crate::error::{ConfigError, MapperResult};
use crate::handler::{unsupported_write, BoundField, FieldHandler, HandlerTarget};
use crate::schema::PropertyRole;
use crate::value::Value;

/// Maps the record identifier onto a [`ValueKind::Guid`] property.
pub struct IdHandler;

/// Maps the record language onto a [`ValueKind::Language`] property.
pub struct LanguageHandler;

/// Maps the record version number onto a [`ValueKind::Version`] or
/// [`ValueKind::Integer`] property.
pub struct VersionHandler;

struct MetadataField {
    owner: TypeKey,
    property: String,
    role: PropertyRole,
}

impl BoundField for MetadataField {
    fn read(&self, record: &Record, _ctx: &MappingContext) -> MapperResult<Value> {
        Ok(match self.role {
            PropertyRole::Id => Value::Guid(record.id),
            PropertyRole::Language => Value::Language(record.language.clone()),
            PropertyRole::Version => Value::Version(record.version),
            PropertyRole::Ordinary => Value::Empty,
        })
    }

    fn write(
        &self,
        _scope: &mut EditScope<'_>,
        _value: &Value,
        _ctx: &MappingContext,
    ) -> MapperResult<()> {
        Err(unsupported_write(
            &self.owner,
            &self.property,
            &format!("the record {} is not a field and cannot be written", self.role),
        ))
    }

    fn writable(&self) -> bool {
        false
    }
}

fn bind_metadata(
    handler: &str,
    target: &HandlerTarget<'_>,
    accepted: &[ValueKind],
) -> Result<Arc<dyn BoundField>, ConfigError> {
    if !accepted.contains(&target.property.kind) {
        return Err(target.incompatible(
            handler,
            format!("a {handler} property cannot hold a {} value", target.property.kind),
        ));
    }
    Ok(Arc::new(MetadataField {
        owner: target.owner,
        property: target.property.name.clone(),
        role: target.marker.role(),
    }))
}

impl FieldHandler for IdHandler {
    fn name(&self) -> &str {
        "id"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Id))
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        bind_metadata(self.name(), target, &[ValueKind::Guid])
    }
}

impl FieldHandler for LanguageHandler {
    fn name(&self) -> &str {
        "language"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Language))
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        bind_metadata(self.name(), target, &[ValueKind::Language])
    }
}

impl FieldHandler for VersionHandler {
    fn name(&self) -> &str {
        "version"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Version))
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        bind_metadata(self.name(), target, &[ValueKind::Version, ValueKind::Integer])
    }
}

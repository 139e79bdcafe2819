//! Relationship handlers: parent, reference and children.
//!
//! All three share one policy. An absent related identity reads as
//! [`Value::Empty`]. Lazy relationships produce pending references without
//! touching the store; eager ones materialize through the mapping context,
//! which guards against cycles.

use std::sync::Arc;

use contour_store::{EditScope, Record};
use contour_types::{Guid, TypeKey};

use crate::context::MappingContext;
use crate::declaration::{PropertyDeclaration, PropertyMarker, ValueKind};
use crate::error::{ConfigError, MapperError, MapperResult};
use crate::handler::{unexpected_value, unsupported_write, BoundField, FieldHandler, HandlerTarget};
use crate::lazy::RelatedValue;
use crate::schema::ClassSchema;
use crate::value::Value;

/// Maps the record's structural parent onto a single related object.
pub struct ParentHandler;

/// Maps an item whose identifier is stored in a field.
pub struct ReferenceHandler;

/// Maps the record's children of the related type's template onto a list.
pub struct ChildrenHandler;

/// Configuration shared by every relationship binding.
struct Relation {
    owner: TypeKey,
    property: String,
    related: TypeKey,
    lazy: bool,
}

impl Relation {
    /// Check the declared kind and that the related type was discovered.
    fn configure(
        handler: &str,
        target: &HandlerTarget<'_>,
        list: bool,
    ) -> Result<Self, ConfigError> {
        let related = match (target.property.kind, list) {
            (ValueKind::Object(key), false) | (ValueKind::ObjectList(key), true) => key,
            (kind, _) => {
                let expected = if list { "a list of mapped objects" } else { "a mapped object" };
                return Err(target.incompatible(
                    handler,
                    format!("expected {expected}, declared {kind}"),
                ));
            }
        };
        if !target.known.contains(&related) {
            return Err(ConfigError::UnresolvedRelatedType {
                type_name: target.owner.to_string(),
                property: target.property.name.clone(),
                related: related.to_string(),
            });
        }
        Ok(Self {
            owner: target.owner,
            property: target.property.name.clone(),
            related,
            lazy: target.marker.is_lazy(),
        })
    }

    fn mapping_error(&self, reason: impl Into<String>) -> MapperError {
        MapperError::Mapping {
            type_name: self.owner.to_string(),
            property: self.property.clone(),
            reason: reason.into(),
        }
    }

    /// Schema of the related type, looked up at read time.
    fn schema(&self, ctx: &MappingContext) -> MapperResult<Arc<ClassSchema>> {
        ctx.registry()
            .lookup_by_type(&self.related)
            .cloned()
            .map_err(|e| self.mapping_error(e.to_string()))
    }

    /// Reference the item `id`, loading it now when eager.
    fn relate(
        &self,
        schema: &Arc<ClassSchema>,
        id: Guid,
        ctx: &MappingContext,
    ) -> MapperResult<RelatedValue> {
        if self.lazy {
            return Ok(RelatedValue::pending(id, Arc::clone(schema), ctx.resolver()));
        }
        match ctx.materialize(schema, &id)? {
            Some(instance) => Ok(RelatedValue::loaded(id, self.related, instance)),
            None => Err(self.mapping_error(format!("related item {id} does not exist"))),
        }
    }

    /// Reference an already fetched record.
    fn relate_record(
        &self,
        schema: &Arc<ClassSchema>,
        record: &Record,
        ctx: &MappingContext,
    ) -> MapperResult<RelatedValue> {
        if self.lazy {
            return Ok(RelatedValue::pending(record.id, Arc::clone(schema), ctx.resolver()));
        }
        let instance = ctx.instantiate(schema, record)?;
        Ok(RelatedValue::loaded(record.id, self.related, instance))
    }

    fn read_only(&self) -> MapperError {
        unsupported_write(&self.owner, &self.property, "relationship is read-only")
    }
}

// ---------------------------------------------------------------------------
// Parent
// ---------------------------------------------------------------------------

struct ParentField(Relation);

impl BoundField for ParentField {
    fn read(&self, record: &Record, ctx: &MappingContext) -> MapperResult<Value> {
        let Some(parent) = record.parent_id.filter(|id| !id.is_nil()) else {
            return Ok(Value::Empty);
        };
        let schema = self.0.schema(ctx)?;
        Ok(Value::Related(self.0.relate(&schema, parent, ctx)?))
    }

    fn write(
        &self,
        _scope: &mut EditScope<'_>,
        _value: &Value,
        _ctx: &MappingContext,
    ) -> MapperResult<()> {
        Err(self.0.read_only())
    }

    fn writable(&self) -> bool {
        false
    }
}

impl FieldHandler for ParentHandler {
    fn name(&self) -> &str {
        "parent"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Parent { .. }))
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        Ok(Arc::new(ParentField(Relation::configure(self.name(), target, false)?)))
    }
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

struct ReferenceField {
    relation: Relation,
    field_name: String,
    writable: bool,
}

impl BoundField for ReferenceField {
    fn read(&self, record: &Record, ctx: &MappingContext) -> MapperResult<Value> {
        let raw = record.field(&self.field_name).unwrap_or_default();
        let id = match Guid::parse_or_nil(raw) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(
                    owner = %self.relation.owner,
                    field = %self.field_name,
                    error = %e,
                    "malformed reference, reading as empty"
                );
                Guid::nil()
            }
        };
        if id.is_nil() {
            return Ok(Value::Empty);
        }
        let schema = self.relation.schema(ctx)?;
        Ok(Value::Related(self.relation.relate(&schema, id, ctx)?))
    }

    fn write(
        &self,
        scope: &mut EditScope<'_>,
        value: &Value,
        _ctx: &MappingContext,
    ) -> MapperResult<()> {
        if !self.writable {
            return Err(self.relation.read_only());
        }
        let raw = match value {
            Value::Empty => String::new(),
            Value::Related(related) => related.id().to_string(),
            Value::Guid(id) if id.is_nil() => String::new(),
            Value::Guid(id) => id.to_string(),
            other => {
                return Err(unexpected_value(&self.relation.property, "related object", other))
            }
        };
        scope.set_field(&self.field_name, raw);
        Ok(())
    }

    fn writable(&self) -> bool {
        self.writable
    }
}

impl FieldHandler for ReferenceHandler {
    fn name(&self) -> &str {
        "reference"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Reference { .. }))
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        let writable = matches!(target.marker, PropertyMarker::Reference { writable: true, .. });
        Ok(Arc::new(ReferenceField {
            relation: Relation::configure(self.name(), target, false)?,
            field_name: target.field_name(),
            writable,
        }))
    }
}

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

struct ChildrenField(Relation);

impl BoundField for ChildrenField {
    fn read(&self, record: &Record, ctx: &MappingContext) -> MapperResult<Value> {
        let schema = self.0.schema(ctx)?;
        let template = schema.template_id();
        let children = if template.is_nil() {
            ctx.store().children(&record.id)?
        } else {
            ctx.store().children_with_template(&record.id, &template)?
        };
        let related = children
            .iter()
            .map(|child| self.0.relate_record(&schema, child, ctx))
            .collect::<MapperResult<Vec<_>>>()?;
        Ok(Value::RelatedList(related))
    }

    fn write(
        &self,
        _scope: &mut EditScope<'_>,
        _value: &Value,
        _ctx: &MappingContext,
    ) -> MapperResult<()> {
        Err(self.0.read_only())
    }

    fn writable(&self) -> bool {
        false
    }
}

impl FieldHandler for ChildrenHandler {
    fn name(&self) -> &str {
        "children"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Children { .. }))
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        Ok(Arc::new(ChildrenField(Relation::configure(self.name(), target, true)?)))
    }
}

//! Plain field values: text, integers, booleans and identifiers.

use std::sync::Arc;

use contour_store::{EditScope, Record};
use contour_types::{Guid, TypeKey};

use crate::context::MappingContext;
use crate::declaration::{PropertyDeclaration, PropertyMarker, ValueKind};
use crate::error::{ConfigError, MapperResult};
use crate::handler::{unexpected_value, unsupported_write, BoundField, FieldHandler, HandlerTarget};
use crate::value::Value;

/// Stored form of `true`. Anything else reads as `false`.
const TRUE: &str = "1";

/// Handles [`PropertyMarker::Field`] properties of the text, integer,
/// boolean and GUID kinds.
pub struct ScalarHandler;

struct ScalarField {
    owner: TypeKey,
    property: String,
    field_name: String,
    kind: ValueKind,
    read_only: bool,
}

impl ScalarField {
    fn decode(&self, raw: &str) -> Value {
        match self.kind {
            ValueKind::Integer => Value::Integer(raw.trim().parse().unwrap_or(0)),
            ValueKind::Boolean => Value::Boolean(raw.trim() == TRUE),
            ValueKind::Guid => match Guid::parse_or_nil(raw) {
                Ok(id) => Value::Guid(id),
                Err(e) => {
                    tracing::debug!(field = %self.field_name, error = %e, "malformed guid field");
                    Value::Guid(Guid::nil())
                }
            },
            _ => Value::Text(raw.to_string()),
        }
    }

    fn encode(&self, value: &Value) -> MapperResult<String> {
        match (self.kind, value) {
            (_, Value::Empty) => Ok(String::new()),
            (ValueKind::Text, Value::Text(s)) => Ok(s.clone()),
            (ValueKind::Integer, Value::Integer(n)) => Ok(n.to_string()),
            (ValueKind::Boolean, Value::Boolean(b)) => {
                Ok(if *b { TRUE.to_string() } else { String::new() })
            }
            (ValueKind::Guid, Value::Guid(id)) if id.is_nil() => Ok(String::new()),
            (ValueKind::Guid, Value::Guid(id)) => Ok(id.to_string()),
            (kind, other) => Err(unexpected_value(&self.property, kind_label(kind), other)),
        }
    }
}

fn kind_label(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Integer => "integer",
        ValueKind::Boolean => "boolean",
        ValueKind::Guid => "guid",
        _ => "text",
    }
}

impl BoundField for ScalarField {
    fn read(&self, record: &Record, _ctx: &MappingContext) -> MapperResult<Value> {
        Ok(self.decode(record.field(&self.field_name).unwrap_or_default()))
    }

    fn write(
        &self,
        scope: &mut EditScope<'_>,
        value: &Value,
        _ctx: &MappingContext,
    ) -> MapperResult<()> {
        if self.read_only {
            return Err(unsupported_write(&self.owner, &self.property, "field is read-only"));
        }
        let raw = self.encode(value)?;
        scope.set_field(&self.field_name, raw);
        Ok(())
    }

    fn writable(&self) -> bool {
        !self.read_only
    }
}

impl FieldHandler for ScalarHandler {
    fn name(&self) -> &str {
        "scalar"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Field { .. }))
            && matches!(
                property.kind,
                ValueKind::Text | ValueKind::Integer | ValueKind::Boolean | ValueKind::Guid
            )
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        let read_only = matches!(target.marker, PropertyMarker::Field { read_only: true, .. });
        Ok(Arc::new(ScalarField {
            owner: target.owner,
            property: target.property.name.clone(),
            field_name: target.field_name(),
            kind: target.property.kind,
            read_only,
        }))
    }
}

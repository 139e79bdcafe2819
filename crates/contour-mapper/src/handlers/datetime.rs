//! Compact ISO date-time fields (`yyyyMMddTHHmmss`).

use std::sync::Arc;

use chrono::NaiveDateTime;
use contour_store::{EditScope, Record};
use contour_types::TypeKey;

use crate::context::MappingContext;
use crate::declaration::{PropertyDeclaration, PropertyMarker, ValueKind};
use crate::error::{ConfigError, MapperResult};
use crate::handler::{unexpected_value, unsupported_write, BoundField, FieldHandler, HandlerTarget};
use crate::value::Value;

/// Storage format of date-time fields. A trailing `Z` is accepted on read.
pub const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Handles [`PropertyMarker::Field`] properties of [`ValueKind::DateTime`].
pub struct DateTimeHandler;

/// Parse a stored date-time. Empty or malformed input yields the zero value.
pub fn parse_date_time(raw: &str) -> NaiveDateTime {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return NaiveDateTime::default();
    }
    NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT).unwrap_or_else(|e| {
        tracing::debug!(value = raw, error = %e, "malformed date-time field");
        NaiveDateTime::default()
    })
}

/// Render a date-time in storage format.
///
/// The format has second precision; any fractional second is truncated.
pub fn format_date_time(value: &NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

struct DateTimeField {
    owner: TypeKey,
    property: String,
    field_name: String,
    read_only: bool,
}

impl BoundField for DateTimeField {
    fn read(&self, record: &Record, _ctx: &MappingContext) -> MapperResult<Value> {
        let raw = record.field(&self.field_name).unwrap_or_default();
        Ok(Value::DateTime(parse_date_time(raw)))
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
        let raw = match value {
            Value::Empty => String::new(),
            Value::DateTime(dt) => format_date_time(dt),
            other => return Err(unexpected_value(&self.property, "date-time", other)),
        };
        scope.set_field(&self.field_name, raw);
        Ok(())
    }

    fn writable(&self) -> bool {
        !self.read_only
    }
}

impl FieldHandler for DateTimeHandler {
    fn name(&self) -> &str {
        "date-time"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Field { .. }))
            && property.kind == ValueKind::DateTime
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        Ok(Arc::new(DateTimeField {
            owner: target.owner,
            property: target.property.name.clone(),
            field_name: target.field_name(),
            read_only: matches!(target.marker, PropertyMarker::Field { read_only: true, .. }),
        }))
    }
}

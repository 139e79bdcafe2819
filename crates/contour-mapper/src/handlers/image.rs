//! Image fields.
//!
//! An image field stores a single element whose attributes carry the media
//! link and display hints:
//!
//! ```text
//! <image mediaid="{...}" alt="..." width="720" height="540" hspace="50" vspace="60" border="" class="" />
//! ```

use std::sync::Arc;

use contour_store::{EditScope, Record};
use contour_types::{Guid, TypeKey};

use crate::context::MappingContext;
use crate::declaration::{PropertyDeclaration, PropertyMarker, ValueKind};
use crate::error::{ConfigError, MapperResult};
use crate::fields::Image;
use crate::handler::{unexpected_value, unsupported_write, BoundField, FieldHandler, HandlerTarget};
use crate::value::Value;

/// Handles [`PropertyMarker::Field`] properties of [`ValueKind::Image`].
pub struct ImageHandler;

/// Parse a stored image element. Missing attributes read as zero values.
pub fn parse_image(raw: &str) -> Image {
    let mut image = Image::default();
    for (name, value) in attributes(raw) {
        match name.as_str() {
            "mediaid" => image.media_id = Guid::parse_or_nil(&value).unwrap_or_default(),
            "alt" => image.alt = value,
            "border" => image.border = value,
            "class" => image.class = value,
            "width" => image.width = number(&value),
            "height" => image.height = number(&value),
            "hspace" => image.hspace = number(&value),
            "vspace" => image.vspace = number(&value),
            _ => {}
        }
    }
    image
}

/// Render an image element. A nil media id omits the `mediaid` attribute.
pub fn format_image(image: &Image) -> String {
    let mut out = String::from("<image");
    if !image.media_id.is_nil() {
        push_attribute(&mut out, "mediaid", &image.media_id.to_string());
    }
    push_attribute(&mut out, "alt", &image.alt);
    push_attribute(&mut out, "width", &image.width.to_string());
    push_attribute(&mut out, "height", &image.height.to_string());
    push_attribute(&mut out, "hspace", &image.hspace.to_string());
    push_attribute(&mut out, "vspace", &image.vspace.to_string());
    push_attribute(&mut out, "border", &image.border);
    push_attribute(&mut out, "class", &image.class);
    out.push_str(" />");
    out
}

fn number(value: &str) -> i32 {
    value.trim().parse().unwrap_or(0)
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn unescape(value: &str) -> String {
    const ENTITIES: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&apos;", '\''),
    ];
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Attribute pairs of the first element in `raw`, names lower-cased.
fn attributes(raw: &str) -> Vec<(String, String)> {
    let body = raw.trim();
    let body = body.strip_prefix('<').unwrap_or(body);
    let body = body.trim_end_matches('>').trim_end().trim_end_matches('/');
    let mut rest = match body.find(char::is_whitespace) {
        Some(pos) => &body[pos..],
        None => "",
    };

    let mut pairs = Vec::new();
    loop {
        rest = rest.trim_start();
        let Some(eq) = rest.find('=') else { break };
        let name = rest[..eq].trim().to_ascii_lowercase();
        let after = rest[eq + 1..].trim_start();
        let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            break;
        };
        let quoted = &after[1..];
        let Some(end) = quoted.find(quote) else { break };
        pairs.push((name, unescape(&quoted[..end])));
        rest = &quoted[end + 1..];
    }
    pairs
}

struct ImageField {
    owner: TypeKey,
    property: String,
    field_name: String,
    read_only: bool,
}

impl BoundField for ImageField {
    fn read(&self, record: &Record, _ctx: &MappingContext) -> MapperResult<Value> {
        match record.field(&self.field_name) {
            Some(raw) if !raw.trim().is_empty() => Ok(Value::Image(parse_image(raw))),
            _ => Ok(Value::Empty),
        }
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
            Value::Image(image) => format_image(image),
            other => return Err(unexpected_value(&self.property, "image", other)),
        };
        scope.set_field(&self.field_name, raw);
        Ok(())
    }

    fn writable(&self) -> bool {
        !self.read_only
    }
}

impl FieldHandler for ImageHandler {
    fn name(&self) -> &str {
        "image"
    }

    fn can_handle(&self, property: &PropertyDeclaration) -> bool {
        matches!(property.marker, Some(PropertyMarker::Field { .. }))
            && property.kind == ValueKind::Image
    }

    fn configure(&self, target: &HandlerTarget<'_>) -> Result<Arc<dyn BoundField>, ConfigError> {
        Ok(Arc::new(ImageField {
            owner: target.owner,
            property: target.property.name.clone(),
            field_name: target.field_name(),
            read_only: matches!(target.marker, PropertyMarker::Field { read_only: true, .. }),
        }))
    }
}

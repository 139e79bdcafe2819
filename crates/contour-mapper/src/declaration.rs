//! Declarative mapping metadata.
//!
//! A mapped type describes itself with a [`TypeDescriptor`]: an optional
//! class-level [`ClassMarker`] plus its property declarations, each with an
//! optional [`PropertyMarker`]. Types without a class marker and properties
//! without a property marker are not mapped; that is not an error.
//!
//! The descriptor format (marker kinds and their fields) is part of the public
//! contract and is stable across releases.

use std::any::Any;
use std::fmt;

use contour_types::TypeKey;
use serde::{Deserialize, Serialize};

use crate::error::MapperResult;
use crate::schema::PropertyRole;
use crate::value::PropertyValues;

/// A Rust type that can be mapped to and from content records.
///
/// `describe` supplies the declarative metadata scanned once at registry
/// build time. `from_values` and `to_values` move values between the type's
/// fields and a [`PropertyValues`] bag keyed by property name.
pub trait Mapped: Any + Send + Sync + Sized {
    /// Declarative metadata for this type.
    fn describe() -> TypeDescriptor;

    /// Build an instance from values read by the bound handlers.
    fn from_values(values: &mut PropertyValues) -> MapperResult<Self>;

    /// Export the instance's mapped properties.
    fn to_values(&self, values: &mut PropertyValues);
}

/// Class-level marker. Both identifiers are strings so that malformed input
/// can be reported at load time; blank means "none".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMarker {
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub branch_id: String,
}

impl ClassMarker {
    /// A marker without template or branch correlation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A marker correlated with `template_id`.
    pub fn template(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            branch_id: String::new(),
        }
    }

    /// Set the branch identifier.
    pub fn with_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = branch_id.into();
        self
    }
}

/// Property-level marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyMarker {
    /// The record's identifier.
    Id,
    /// The record's language.
    Language,
    /// The record's version number.
    Version,
    /// An ordinary field, stored under `field_name` or the property name.
    Field {
        field_name: Option<String>,
        read_only: bool,
    },
    /// The record's structural parent.
    Parent { lazy: bool },
    /// An item whose identifier is stored in a field.
    Reference {
        field_name: Option<String>,
        lazy: bool,
        writable: bool,
    },
    /// The record's direct children.
    Children { lazy: bool },
}

impl PropertyMarker {
    /// An ordinary writable field named after the property.
    pub fn field() -> Self {
        Self::Field {
            field_name: None,
            read_only: false,
        }
    }

    /// An ordinary writable field stored under `name`.
    pub fn field_named(name: impl Into<String>) -> Self {
        Self::Field {
            field_name: Some(name.into()),
            read_only: false,
        }
    }

    /// A lazy parent relationship.
    pub fn parent() -> Self {
        Self::Parent { lazy: true }
    }

    /// A lazy, read-only reference stored in the field named after the property.
    pub fn reference() -> Self {
        Self::Reference {
            field_name: None,
            lazy: true,
            writable: false,
        }
    }

    /// A lazy, read-only reference stored in the field `name`.
    pub fn reference_in(name: impl Into<String>) -> Self {
        Self::Reference {
            field_name: Some(name.into()),
            lazy: true,
            writable: false,
        }
    }

    /// A lazy children relationship.
    pub fn children() -> Self {
        Self::Children { lazy: true }
    }

    /// Switch a relationship marker to eager loading. No effect on others.
    pub fn eager(mut self) -> Self {
        match &mut self {
            Self::Parent { lazy } | Self::Reference { lazy, .. } | Self::Children { lazy } => {
                *lazy = false;
            }
            _ => {}
        }
        self
    }

    /// Mark a field read-only. No effect on other markers.
    pub fn read_only(mut self) -> Self {
        if let Self::Field { read_only, .. } = &mut self {
            *read_only = true;
        }
        self
    }

    /// Allow writes through a reference marker. No effect on others.
    pub fn writable(mut self) -> Self {
        if let Self::Reference { writable, .. } = &mut self {
            *writable = true;
        }
        self
    }

    /// The structural role a property with this marker plays.
    pub fn role(&self) -> PropertyRole {
        match self {
            Self::Id => PropertyRole::Id,
            Self::Language => PropertyRole::Language,
            Self::Version => PropertyRole::Version,
            _ => PropertyRole::Ordinary,
        }
    }

    /// Returns `true` for parent, reference and children markers.
    pub fn is_relationship(&self) -> bool {
        matches!(
            self,
            Self::Parent { .. } | Self::Reference { .. } | Self::Children { .. }
        )
    }

    /// Returns `true` for lazily loaded relationships.
    pub fn is_lazy(&self) -> bool {
        match self {
            Self::Parent { lazy } | Self::Reference { lazy, .. } | Self::Children { lazy } => *lazy,
            _ => false,
        }
    }

    /// Store field name override, if the marker carries one.
    pub fn field_name_override(&self) -> Option<&str> {
        match self {
            Self::Field { field_name, .. } | Self::Reference { field_name, .. } => {
                field_name.as_deref()
            }
            _ => None,
        }
    }

    /// Short name of the marker kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Language => "language",
            Self::Version => "version",
            Self::Field { .. } => "field",
            Self::Parent { .. } => "parent",
            Self::Reference { .. } => "reference",
            Self::Children { .. } => "children",
        }
    }
}

impl fmt::Display for PropertyMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

/// Declared value type of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Boolean,
    Guid,
    Language,
    Version,
    DateTime,
    Image,
    /// A single mapped object.
    Object(TypeKey),
    /// A list of mapped objects.
    ObjectList(TypeKey),
}

impl ValueKind {
    /// A single related object of type `T`.
    pub fn object<T: 'static>() -> Self {
        Self::Object(TypeKey::of::<T>())
    }

    /// A list of related objects of type `T`.
    pub fn list_of<T: 'static>() -> Self {
        Self::ObjectList(TypeKey::of::<T>())
    }

    /// The related type for object kinds.
    pub fn related_type(&self) -> Option<TypeKey> {
        match self {
            Self::Object(key) | Self::ObjectList(key) => Some(*key),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Integer => f.write_str("integer"),
            Self::Boolean => f.write_str("boolean"),
            Self::Guid => f.write_str("guid"),
            Self::Language => f.write_str("language"),
            Self::Version => f.write_str("version"),
            Self::DateTime => f.write_str("date-time"),
            Self::Image => f.write_str("image"),
            Self::Object(key) => write!(f, "{}", key.short_name()),
            Self::ObjectList(key) => write!(f, "list of {}", key.short_name()),
        }
    }
}

/// Static metadata of one property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDeclaration {
    pub name: String,
    pub kind: ValueKind,
    pub marker: Option<PropertyMarker>,
}

impl PropertyDeclaration {
    /// A property carrying `marker`.
    pub fn new(name: impl Into<String>, kind: ValueKind, marker: PropertyMarker) -> Self {
        Self {
            name: name.into(),
            kind,
            marker: Some(marker),
        }
    }

    /// A property with no marker; it is never mapped.
    pub fn unmarked(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            marker: None,
        }
    }

    /// Store field name: the marker override or the property name.
    pub fn field_name(&self) -> &str {
        self.marker
            .as_ref()
            .and_then(PropertyMarker::field_name_override)
            .unwrap_or(&self.name)
    }
}

/// Everything a mapped type declares about itself.
#[derive(Clone, Debug, Default)]
pub struct TypeDescriptor {
    pub class: Option<ClassMarker>,
    pub properties: Vec<PropertyDeclaration>,
    /// Descriptor of the type whose declarations this one inherits.
    pub base: Option<fn() -> TypeDescriptor>,
}

impl TypeDescriptor {
    /// A descriptor with no class marker. The type is never mapped.
    pub fn unmarked() -> Self {
        Self::default()
    }

    /// A descriptor carrying `marker`.
    pub fn class(marker: ClassMarker) -> Self {
        Self {
            class: Some(marker),
            ..Self::default()
        }
    }

    /// Declare a marked property.
    pub fn property(mut self, name: &str, kind: ValueKind, marker: PropertyMarker) -> Self {
        self.properties
            .push(PropertyDeclaration::new(name, kind, marker));
        self
    }

    /// Declare a property without a marker.
    pub fn unmapped(mut self, name: &str, kind: ValueKind) -> Self {
        self.properties.push(PropertyDeclaration::unmarked(name, kind));
        self
    }

    /// Inherit the declarations of `B`.
    pub fn inherits<B: Mapped>(mut self) -> Self {
        self.base = Some(B::describe as fn() -> TypeDescriptor);
        self
    }

    /// Own declarations followed by inherited ones, in declaration order.
    ///
    /// An own declaration shadows an inherited one with the same name.
    pub fn all_properties(&self) -> Vec<PropertyDeclaration> {
        let mut all = self.properties.clone();
        let mut base = self.base;
        while let Some(describe) = base {
            let inherited = describe();
            for property in inherited.properties {
                if !all.iter().any(|p| p.name == property.name) {
                    all.push(property);
                }
            }
            base = inherited.base;
        }
        all
    }
}

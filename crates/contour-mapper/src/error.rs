use contour_store::StoreError;
use contour_types::Guid;

use crate::schema::PropertyRole;

/// A configuration defect found while discovering types or binding handlers.
///
/// Every variant tied to a mapped type names the type, and the property where
/// one is involved, so the misconfiguration can be located from the message
/// alone.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A class marker carries a malformed template or branch identifier.
    #[error("type '{type_name}': invalid {field} '{value}': {reason}")]
    InvalidIdentifier {
        type_name: String,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Two properties of one type claim the same structural role.
    #[error("type '{type_name}': properties '{first}' and '{second}' both declare the {role} role")]
    DuplicateRole {
        type_name: String,
        role: PropertyRole,
        first: String,
        second: String,
    },

    /// A relationship points at a type the registry never discovered.
    #[error("type '{type_name}', property '{property}': related type '{related}' is not a mapped type")]
    UnresolvedRelatedType {
        type_name: String,
        property: String,
        related: String,
    },

    /// No registered handler accepts the property.
    #[error("type '{type_name}', property '{property}': no field handler accepts a {marker} marker on a {kind} value")]
    NoHandler {
        type_name: String,
        property: String,
        marker: String,
        kind: String,
    },

    /// The selected handler rejected the binding while configuring.
    #[error("type '{type_name}', property '{property}': handler '{handler}' cannot bind: {reason}")]
    IncompatibleHandler {
        type_name: String,
        property: String,
        handler: String,
        reason: String,
    },

    /// A source group string is not of the form `"<prefix>, <catalog>"`.
    #[error("invalid source group '{0}': expected \"<type path prefix>, <catalog>\"")]
    InvalidSourceGroup(String),

    /// A source group names a catalog that was never supplied.
    #[error("unknown type catalog '{0}'")]
    UnknownCatalog(String),

    /// The mapper configuration document could not be read.
    #[error("invalid mapper configuration: {0}")]
    InvalidConfig(String),
}

impl ConfigError {
    /// The mapped type this error belongs to, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::InvalidIdentifier { type_name, .. }
            | Self::DuplicateRole { type_name, .. }
            | Self::UnresolvedRelatedType { type_name, .. }
            | Self::NoHandler { type_name, .. }
            | Self::IncompatibleHandler { type_name, .. } => Some(type_name),
            Self::InvalidSourceGroup(_) | Self::UnknownCatalog(_) | Self::InvalidConfig(_) => None,
        }
    }
}

/// Errors surfaced by registry lookups and mapping operations.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// A strict load collected one or more configuration errors.
    #[error("configuration failed: {}", summarize(.errors))]
    Configuration { errors: Vec<ConfigError> },

    /// A single configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The type was never discovered as a mapped type.
    #[error("type '{type_name}' is not a mapped type")]
    NotMapped { type_name: String },

    /// The type was discovered but rejected during configuration.
    #[error("type '{type_name}' was rejected during configuration: {}", summarize(.errors))]
    InvalidType {
        type_name: String,
        errors: Vec<ConfigError>,
    },

    /// A relationship could not be resolved at read time.
    #[error("mapping error in '{type_name}.{property}': {reason}")]
    Mapping {
        type_name: String,
        property: String,
        reason: String,
    },

    /// A write was attempted through a read-only mapping.
    #[error("unsupported operation on '{type_name}.{property}': {reason}")]
    Unsupported {
        type_name: String,
        property: String,
        reason: String,
    },

    /// Eager materialization revisited an item already in progress.
    #[error("cyclic reference: {type_name} {id} is already being materialized")]
    CyclicReference { type_name: String, id: Guid },

    /// A reference built outside any mapping context was asked to load.
    #[error("reference to {type_name} {id} is detached and cannot be resolved")]
    Detached { type_name: String, id: Guid },

    /// A property value did not have the shape its Rust field expects.
    #[error("property '{property}': expected {expected}, found {found}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The record store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

fn summarize(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

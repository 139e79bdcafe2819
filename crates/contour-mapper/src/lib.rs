//! Typed object mapping for content records.
//!
//! Contour maps records from a content store onto Rust types and back. Types
//! describe themselves through [`Mapped::describe`]; the [`Registry`] scans
//! the registered [`TypeCatalog`]s once, binds a field handler from the
//! [`HandlerChain`] to every marked property, and rejects invalid
//! configuration before any record is read. Relationships resolve through
//! [`Lazy`] references that load on first access.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use contour_mapper::{
//!     CatalogLoader, ClassMarker, HandlerChain, LoadPolicy, Mapped, MapperResult,
//!     MappingService, PropertyMarker, PropertyValues, Registry, SourceGroup, TypeCatalog,
//!     TypeDescriptor, ValueKind,
//! };
//! use contour_store::{InMemoryRecordStore, Record, RecordStore};
//! use contour_types::Guid;
//!
//! struct Page {
//!     id: Guid,
//!     title: String,
//! }
//!
//! impl Mapped for Page {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::class(ClassMarker::new())
//!             .property("Id", ValueKind::Guid, PropertyMarker::Id)
//!             .property("Title", ValueKind::Text, PropertyMarker::field())
//!     }
//!
//!     fn from_values(values: &mut PropertyValues) -> MapperResult<Self> {
//!         Ok(Page {
//!             id: values.take("Id")?,
//!             title: values.take("Title")?,
//!         })
//!     }
//!
//!     fn to_values(&self, values: &mut PropertyValues) {
//!         values.put("Id", &self.id);
//!         values.put("Title", &self.title);
//!     }
//! }
//!
//! let loader = CatalogLoader::new([TypeCatalog::new("site").with::<Page>()])
//!     .group(SourceGroup::new("", "site"));
//! let registry = Registry::build(
//!     &[&loader],
//!     &HandlerChain::with_default_handlers(),
//!     LoadPolicy::Strict,
//! )
//! .unwrap();
//!
//! let store = InMemoryRecordStore::new();
//! let id = Guid::generate();
//! store
//!     .add_item(Record::new(id, Guid::nil(), "home").with_field("Title", "Welcome"))
//!     .unwrap();
//!
//! let service = MappingService::new(Arc::new(registry), Arc::new(store));
//! let page: Page = service.get_item(&id).unwrap().unwrap();
//! assert_eq!(page.id, id);
//! assert_eq!(page.title, "Welcome");
//! ```

pub mod catalog;
pub mod chain;
pub mod config;
pub mod context;
pub mod declaration;
pub mod error;
pub mod fields;
pub mod handler;
pub mod handlers;
pub mod lazy;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod service;
pub mod value;

#[cfg(test)]
mod fixtures;

// Re-exports for convenience.
pub use catalog::{CandidateType, SourceGroup, TypeCatalog};
pub use chain::HandlerChain;
pub use config::MapperConfig;
pub use context::MappingContext;
pub use declaration::{
    ClassMarker, Mapped, PropertyDeclaration, PropertyMarker, TypeDescriptor, ValueKind,
};
pub use error::{ConfigError, MapperError, MapperResult};
pub use fields::Image;
pub use handler::{BoundField, FieldHandler, HandlerTarget, KnownTypes};
pub use lazy::{Instance, Lazy, RelatedValue, Resolver};
pub use loader::{CatalogLoader, ConfigurationLoader, DiscoveredType, Discovery, Rejection};
pub use registry::{LoadPolicy, Registry};
pub use schema::{ClassSchema, Factory, PropertyBinding, PropertyRole};
pub use service::MappingService;
pub use value::{FromValue, PropertyValues, ToValue, Value};

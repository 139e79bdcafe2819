//! Foundation types for Contour.
//!
//! This crate provides the identity and type-handle primitives shared by the
//! record store and the mapper. Every other Contour crate depends on
//! `contour-types`.
//!
//! # Key Types
//!
//! - [`Guid`]: Item, template and branch identifier with a nil sentinel
//! - [`Language`]: Content language code carried by every record version
//! - [`TypeKey`]: Opaque, comparable handle for a mapped Rust type

pub mod error;
pub mod id;
pub mod language;
pub mod type_key;

pub use error::TypeError;
pub use id::Guid;
pub use language::Language;
pub use type_key::TypeKey;

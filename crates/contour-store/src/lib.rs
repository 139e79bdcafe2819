//! Content store contract for Contour.
//!
//! The mapper never talks to a concrete content store. It consumes the
//! [`RecordStore`] trait defined here, reads named fields from a [`Record`],
//! and writes them only through an open [`EditScope`].
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Field values are raw strings; interpretation belongs to field handlers.
//! 2. Fields can only be written inside an edit scope. Every scope ends in
//!    exactly one commit or cancel; dropping an open scope cancels it.
//! 3. An edit scope mutably borrows its record, so scopes cannot nest.
//! 4. Protected records can only be edited or saved while an access override
//!    is active. Overrides are scoped guards released on every exit path.
//! 5. All backend errors are propagated, never silently ignored.

pub mod access;
pub mod error;
pub mod memory;
pub mod record;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use access::{AccessPolicy, SecurityOverride};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use record::{EditScope, Record};
pub use traits::RecordStore;

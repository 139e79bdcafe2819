//! The [`RecordStore`] trait defining the content store contract.
//!
//! Any backend (in-memory, remote content service, database) implements this
//! trait to serve records to the mapper.

use contour_types::Guid;

use crate::access::AccessPolicy;
use crate::error::{StoreError, StoreResult};
use crate::record::{EditScope, Record};

/// Content store backend.
///
/// Implementations must be thread-safe (`Send + Sync`). The mapper treats
/// every call as a synchronous black box that may fail; timeouts and retries
/// belong to the implementation.
pub trait RecordStore: Send + Sync {
    /// Read a record by identifier.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    fn get_item(&self, id: &Guid) -> StoreResult<Option<Record>>;

    /// List the direct children of a record in a stable order.
    fn children(&self, parent: &Guid) -> StoreResult<Vec<Record>>;

    /// Insert a new record. Fails if the identifier is taken or the declared
    /// parent does not exist.
    fn add_item(&self, record: Record) -> StoreResult<()>;

    /// Persist an existing record. Protected records require an active
    /// access override.
    fn save_item(&self, record: &Record) -> StoreResult<()>;

    /// The access policy governing edits and saves.
    fn access(&self) -> &AccessPolicy;

    /// Open an edit scope on `record` after checking access.
    fn begin_edit<'r>(&self, record: &'r mut Record) -> StoreResult<EditScope<'r>> {
        self.access().check_edit(record)?;
        Ok(EditScope::open(record))
    }

    /// Read a record that must exist.
    fn require_item(&self, id: &Guid) -> StoreResult<Record> {
        self.get_item(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Direct children created from `template`.
    ///
    /// Default implementation filters [`RecordStore::children`]. Backends may
    /// override with an indexed lookup.
    fn children_with_template(&self, parent: &Guid, template: &Guid) -> StoreResult<Vec<Record>> {
        Ok(self
            .children(parent)?
            .into_iter()
            .filter(|r| r.template_id == *template)
            .collect())
    }
}

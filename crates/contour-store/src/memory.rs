//! In-memory record store for testing and embedding.
//!
//! [`InMemoryRecordStore`] keeps every record in a `BTreeMap` protected by a
//! `RwLock`. It implements the full [`RecordStore`] trait and is suitable for
//! unit tests, fixtures, and short-lived processes.

use std::collections::BTreeMap;
use std::sync::RwLock;

use contour_types::Guid;

use crate::access::AccessPolicy;
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::traits::RecordStore;

/// An in-memory implementation of [`RecordStore`].
///
/// Records are cloned on read and write. Data is lost when the store is
/// dropped.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<Guid, Record>>,
    access: AccessPolicy,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`, in order.
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> StoreResult<Self> {
        let store = Self::new();
        for record in records {
            store.add_item(record)?;
        }
        Ok(store)
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get_item(&self, id: &Guid) -> StoreResult<Option<Record>> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(records.get(id).cloned())
    }

    fn children(&self, parent: &Guid) -> StoreResult<Vec<Record>> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut children: Vec<Record> = records
            .values()
            .filter(|r| r.parent_id.as_ref() == Some(parent))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    fn add_item(&self, record: Record) -> StoreResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        if let Some(parent) = record.parent_id {
            if !records.contains_key(&parent) {
                return Err(StoreError::NotFound(parent));
            }
        }
        tracing::trace!(id = %record.id, name = %record.name, "record added");
        records.insert(record.id, record);
        Ok(())
    }

    fn save_item(&self, record: &Record) -> StoreResult<()> {
        self.access.check_edit(record)?;
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }

    fn access(&self) -> &AccessPolicy {
        &self.access
    }
}

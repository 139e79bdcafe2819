//! Records and edit scopes.
//!
//! A [`Record`] is one version of a content item: structural metadata
//! (identifier, template, parent, language, version) plus a bag of named raw
//! field values. Records are plain values; a store hands out copies and
//! accepts them back through [`RecordStore::save_item`].
//!
//! [`RecordStore::save_item`]: crate::traits::RecordStore::save_item

use std::collections::BTreeMap;

use contour_types::{Guid, Language};
use serde::{Deserialize, Serialize};

/// One version of a content item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Item identifier.
    pub id: Guid,
    /// Template the item was created from.
    pub template_id: Guid,
    /// Structural parent, `None` for a root item.
    pub parent_id: Option<Guid>,
    /// Item name (path segment).
    pub name: String,
    /// Language of this version.
    pub language: Language,
    /// Version number within the language.
    pub version: i32,
    /// Protected records require an access override to edit or save.
    pub protected: bool,
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Create a root record with no fields, language `en`, version 1.
    pub fn new(id: Guid, template_id: Guid, name: impl Into<String>) -> Self {
        Self {
            id,
            template_id,
            parent_id: None,
            name: name.into(),
            language: Language::default(),
            version: 1,
            protected: false,
            fields: BTreeMap::new(),
        }
    }

    /// Set the structural parent.
    pub fn with_parent(mut self, parent: Guid) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Set a raw field value at construction time.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set the language of this version.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the version number.
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Mark the record as protected.
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// Read a raw field value. Returns `None` if the field is absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// All raw fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An open edit transaction on a single record.
///
/// Obtained from [`RecordStore::begin_edit`]. Writes are staged and become
/// visible on the record only after [`EditScope::commit`]. Reads through the
/// scope see staged values. A scope that is dropped without an explicit
/// terminal call is cancelled.
///
/// [`RecordStore::begin_edit`]: crate::traits::RecordStore::begin_edit
#[derive(Debug)]
pub struct EditScope<'r> {
    record: &'r mut Record,
    staged: BTreeMap<String, String>,
    open: bool,
}

impl<'r> EditScope<'r> {
    pub(crate) fn open(record: &'r mut Record) -> Self {
        let staged = record.fields.clone();
        Self {
            record,
            staged,
            open: true,
        }
    }

    /// The record as last committed.
    pub fn record(&self) -> &Record {
        &*self.record
    }

    /// Read a field, including staged writes.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.staged.get(name).map(String::as_str)
    }

    /// Stage a raw field value.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.staged.insert(name.to_string(), value.into());
    }

    /// Returns `true` if staged values differ from the committed record.
    pub fn is_dirty(&self) -> bool {
        self.staged != self.record.fields
    }

    /// Apply staged writes to the record and close the scope.
    pub fn commit(mut self) {
        self.record.fields = std::mem::take(&mut self.staged);
        self.open = false;
    }

    /// Discard staged writes and close the scope.
    pub fn cancel(mut self) {
        self.staged.clear();
        self.open = false;
    }
}

impl Drop for EditScope<'_> {
    fn drop(&mut self) {
        if self.open {
            tracing::debug!(record = %self.record.id, "edit scope dropped while open, changes discarded");
        }
    }
}

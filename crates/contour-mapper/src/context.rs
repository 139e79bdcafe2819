//! Per-call mapping state.

use std::cell::RefCell;
use std::sync::Arc;

use contour_store::{EditScope, Record, RecordStore};
use contour_types::{Guid, TypeKey};

use crate::declaration::Mapped;
use crate::error::{MapperError, MapperResult};
use crate::lazy::{Instance, Resolver};
use crate::registry::Registry;
use crate::schema::ClassSchema;
use crate::value::PropertyValues;

/// State for one mapping call: the registry, the store, and the set of items
/// being materialized.
///
/// A context is created per call and is not shared between threads. The
/// in-progress set makes eager relationships that lead back to an item
/// already being built fail with [`MapperError::CyclicReference`].
pub struct MappingContext {
    registry: Arc<Registry>,
    store: Arc<dyn RecordStore>,
    in_progress: RefCell<Vec<(TypeKey, Guid)>>,
}

/// Marks one item as in progress until dropped.
struct InProgress<'c> {
    ctx: &'c MappingContext,
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.ctx.in_progress.borrow_mut().pop();
    }
}

impl MappingContext {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            registry,
            store,
            in_progress: RefCell::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// A handle that outlives this context, for lazy references.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(Arc::clone(&self.registry), Arc::clone(&self.store))
    }

    fn enter(&self, key: TypeKey, id: Guid) -> MapperResult<InProgress<'_>> {
        let mut in_progress = self.in_progress.borrow_mut();
        if in_progress.contains(&(key, id)) {
            return Err(MapperError::CyclicReference {
                type_name: key.to_string(),
                id,
            });
        }
        in_progress.push((key, id));
        Ok(InProgress { ctx: self })
    }

    /// Run every binding of `schema` against `record`.
    pub fn read_values(&self, schema: &ClassSchema, record: &Record) -> MapperResult<PropertyValues> {
        let mut values = PropertyValues::new();
        for binding in schema.properties() {
            values.insert(binding.name(), binding.read(record, self)?);
        }
        Ok(values)
    }

    /// Build a type-erased instance of `schema` from `record`.
    pub fn instantiate(&self, schema: &ClassSchema, record: &Record) -> MapperResult<Instance> {
        let _guard = self.enter(schema.key(), record.id)?;
        let mut values = self.read_values(schema, record)?;
        schema.instantiate(&mut values)
    }

    /// Fetch item `id` and build it as `schema`'s type. `None` if the item
    /// does not exist.
    pub fn materialize(&self, schema: &ClassSchema, id: &Guid) -> MapperResult<Option<Instance>> {
        match self.store.get_item(id)? {
            Some(record) => self.instantiate(schema, &record).map(Some),
            None => Ok(None),
        }
    }

    /// Build a `T` from `record`.
    pub fn map_typed<T: Mapped>(&self, record: &Record) -> MapperResult<T> {
        let schema = self.registry.schema_for::<T>()?;
        let _guard = self.enter(schema.key(), record.id)?;
        let mut values = self.read_values(schema, record)?;
        T::from_values(&mut values)
    }

    /// Write `values` through every writable binding of `schema`.
    ///
    /// Properties missing from `values` are written as empty.
    pub fn write_values(
        &self,
        schema: &ClassSchema,
        values: &PropertyValues,
        scope: &mut EditScope<'_>,
    ) -> MapperResult<()> {
        for binding in schema.properties().iter().filter(|b| b.writable()) {
            let value = values.get(binding.name()).cloned().unwrap_or_default();
            binding.write(scope, &value, self)?;
        }
        Ok(())
    }
}

//! The mapping service: the public entry point for reading and writing
//! mapped objects.

use std::sync::Arc;

use contour_store::{EditScope, Record, RecordStore};
use contour_types::Guid;

use crate::catalog::TypeCatalog;
use crate::chain::HandlerChain;
use crate::config::MapperConfig;
use crate::context::MappingContext;
use crate::declaration::Mapped;
use crate::error::{MapperError, MapperResult};
use crate::registry::Registry;
use crate::schema::ClassSchema;
use crate::value::{FromValue, PropertyValues};

/// Maps records from a [`RecordStore`] onto registered types and back.
#[derive(Clone)]
pub struct MappingService {
    registry: Arc<Registry>,
    store: Arc<dyn RecordStore>,
}

impl MappingService {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn RecordStore>) -> Self {
        Self { registry, store }
    }

    /// Build the registry described by `config` over `catalogs`.
    pub fn from_config(
        config: &MapperConfig,
        catalogs: impl IntoIterator<Item = TypeCatalog>,
        chain: &HandlerChain,
        store: Arc<dyn RecordStore>,
    ) -> MapperResult<Self> {
        let loader = config.loader(catalogs)?;
        let registry = Registry::build(&[&loader], chain, config.policy)?;
        Ok(Self::new(Arc::new(registry), store))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// A fresh context for one mapping call.
    pub fn context(&self) -> MappingContext {
        MappingContext::new(Arc::clone(&self.registry), Arc::clone(&self.store))
    }

    /// Build a `T` from `record`.
    pub fn map_to_object<T: Mapped>(&self, record: &Record) -> MapperResult<T> {
        self.context().map_typed(record)
    }

    /// Write `value`'s writable properties into the record behind `scope`.
    ///
    /// The caller owns the scope and decides whether to commit.
    pub fn map_to_record<T: Mapped>(&self, value: &T, scope: &mut EditScope<'_>) -> MapperResult<()> {
        let schema = self.registry.schema_for::<T>()?;
        let values = export(value);
        self.context().write_values(schema, &values, scope)
    }

    /// Load item `id` as a `T`. `None` if the item does not exist.
    pub fn get_item<T: Mapped>(&self, id: &Guid) -> MapperResult<Option<T>> {
        match self.store.get_item(id)? {
            Some(record) => self.map_to_object(&record).map(Some),
            None => Ok(None),
        }
    }

    /// Children of `parent` created from `T`'s template, or every child when
    /// `T` has no template.
    pub fn children_of<T: Mapped>(&self, parent: &Guid) -> MapperResult<Vec<T>> {
        let template = self.registry.schema_for::<T>()?.template_id();
        let records = if template.is_nil() {
            self.store.children(parent)?
        } else {
            self.store.children_with_template(parent, &template)?
        };
        let ctx = self.context();
        records.iter().map(|r| ctx.map_typed(r)).collect()
    }

    /// Persist `value` onto the item named by its id property.
    ///
    /// Runs with access checks overridden, inside an edit scope that is
    /// committed only if every property was written.
    pub fn save<T: Mapped>(&self, value: &T) -> MapperResult<()> {
        let schema = self.registry.schema_for::<T>()?;
        let values = export(value);
        let id = identity(schema, &values)?;

        let mut record = self.store.require_item(&id)?;
        let _override = self.store.access().override_scope();
        let mut scope = self.store.begin_edit(&mut record)?;
        self.context().write_values(schema, &values, &mut scope)?;
        scope.commit();
        self.store.save_item(&record)?;
        tracing::debug!(type_name = %schema.key(), %id, "item saved");
        Ok(())
    }

    /// Create a child of `parent` from `T`'s template, populate it from
    /// `value`, and return the new item mapped as a `T`.
    pub fn create_child<T: Mapped>(&self, parent: &Guid, name: &str, value: &T) -> MapperResult<T> {
        let schema = self.registry.schema_for::<T>()?;
        if schema.template_id().is_nil() {
            return Err(MapperError::Unsupported {
                type_name: schema.key().to_string(),
                property: name.to_string(),
                reason: "type has no template to create items from".into(),
            });
        }
        self.store.require_item(parent)?;

        let values = export(value);
        let mut record = Record::new(Guid::generate(), schema.template_id(), name).with_parent(*parent);
        let mut scope = self.store.begin_edit(&mut record)?;
        self.context().write_values(schema, &values, &mut scope)?;
        scope.commit();
        self.store.add_item(record.clone())?;
        tracing::debug!(type_name = %schema.key(), id = %record.id, %parent, "item created");
        self.map_to_object(&record)
    }
}

fn export<T: Mapped>(value: &T) -> PropertyValues {
    let mut values = PropertyValues::new();
    value.to_values(&mut values);
    values
}

fn identity(schema: &ClassSchema, values: &PropertyValues) -> MapperResult<Guid> {
    let unsupported = |reason: &str| MapperError::Unsupported {
        type_name: schema.key().to_string(),
        property: schema
            .id_property()
            .map(|p| p.name().to_string())
            .unwrap_or_default(),
        reason: reason.to_string(),
    };
    let binding = schema
        .id_property()
        .ok_or_else(|| unsupported("type has no id property"))?;
    let id = values
        .get(binding.name())
        .cloned()
        .and_then(Guid::from_value)
        .unwrap_or_default();
    if id.is_nil() {
        return Err(unsupported("instance has no id"));
    }
    Ok(id)
}

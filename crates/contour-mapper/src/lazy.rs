//! Lazy references to related objects.
//!
//! A related object read through a lazy relationship is not loaded until it
//! is first accessed. The reference captures the related identity, the target
//! schema and a [`Resolver`] holding the registry and store, so it can load
//! long after the mapping call that produced it has returned.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use contour_store::{RecordStore, StoreError};
use contour_types::{Guid, TypeKey};

use crate::context::MappingContext;
use crate::declaration::Mapped;
use crate::error::{MapperError, MapperResult};
use crate::registry::Registry;
use crate::schema::ClassSchema;

/// A type-erased mapped instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Handle used to load related items outside the original mapping call.
#[derive(Clone)]
pub struct Resolver {
    registry: Arc<Registry>,
    store: Arc<dyn RecordStore>,
}

impl Resolver {
    pub(crate) fn new(registry: Arc<Registry>, store: Arc<dyn RecordStore>) -> Self {
        Self { registry, store }
    }

    /// Load item `id` as `schema`'s type in a fresh mapping context.
    pub fn load(&self, schema: &ClassSchema, id: Guid) -> MapperResult<Instance> {
        tracing::debug!(type_name = %schema.key(), %id, "resolving lazy reference");
        let ctx = MappingContext::new(Arc::clone(&self.registry), Arc::clone(&self.store));
        ctx.materialize(schema, &id)?
            .ok_or(MapperError::Store(StoreError::NotFound(id)))
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("mapped_types", &self.registry.len())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
enum RelatedState {
    Pending {
        schema: Arc<ClassSchema>,
        resolver: Resolver,
    },
    Loaded(Instance),
    Detached,
}

/// A related object whose type is known only at run time.
///
/// This is what relationship handlers produce; typed code receives it as a
/// [`Lazy<T>`].
#[derive(Clone)]
pub struct RelatedValue {
    id: Guid,
    target: TypeKey,
    state: RelatedState,
}

impl RelatedValue {
    /// A reference that loads through `resolver` on first access.
    pub fn pending(id: Guid, schema: Arc<ClassSchema>, resolver: Resolver) -> Self {
        Self {
            id,
            target: schema.key(),
            state: RelatedState::Pending { schema, resolver },
        }
    }

    /// A reference to an instance that is already materialized.
    pub fn loaded(id: Guid, target: TypeKey, instance: Instance) -> Self {
        Self {
            id,
            target,
            state: RelatedState::Loaded(instance),
        }
    }

    /// A bare identity with no way to load it.
    pub fn detached(id: Guid, target: TypeKey) -> Self {
        Self {
            id,
            target,
            state: RelatedState::Detached,
        }
    }

    pub fn id(&self) -> Guid {
        self.id
    }

    /// The related type.
    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, RelatedState::Loaded(_))
    }

    /// The related instance, loading it if pending. Pending values are not
    /// cached; wrap in [`Lazy`] for load-once semantics.
    pub fn resolve(&self) -> MapperResult<Instance> {
        match &self.state {
            RelatedState::Loaded(instance) => Ok(Arc::clone(instance)),
            RelatedState::Pending { schema, resolver } => resolver.load(schema, self.id),
            RelatedState::Detached => Err(MapperError::Detached {
                type_name: self.target.to_string(),
                id: self.id,
            }),
        }
    }
}

impl fmt::Debug for RelatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            RelatedState::Pending { .. } => "pending",
            RelatedState::Loaded(_) => "loaded",
            RelatedState::Detached => "detached",
        };
        f.debug_struct("RelatedValue")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("state", &state)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Lazy<T>
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Pending {
    schema: Arc<ClassSchema>,
    resolver: Resolver,
}

// Load state shared by every clone of one reference.
struct Shared<T> {
    cell: OnceLock<Arc<T>>,
    loading: Mutex<()>,
}

impl<T> Shared<T> {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            cell: OnceLock::new(),
            loading: Mutex::new(()),
        })
    }
}

/// A typed reference to a related object, loaded at most once.
///
/// Produced by lazy relationships in the pending state and by eager ones in
/// the loaded state. Application code can build a loaded or detached value
/// to assign a writable reference.
///
/// Clones share their load state: whichever clone is accessed first loads
/// the object, and concurrent callers wait for that load instead of starting
/// their own.
pub struct Lazy<T> {
    id: Guid,
    pending: Option<Pending>,
    shared: Arc<Shared<T>>,
}

impl<T: Mapped> Lazy<T> {
    /// A reference to an instance already in hand.
    pub fn loaded(id: Guid, value: T) -> Self {
        let lazy = Self::detached(id);
        let _ = lazy.shared.cell.set(Arc::new(value));
        lazy
    }

    /// A reference that only carries an identity.
    pub fn detached(id: Guid) -> Self {
        Self {
            id,
            pending: None,
            shared: Shared::empty(),
        }
    }

    /// Identity of the related item. Never triggers a load.
    pub fn id(&self) -> Guid {
        self.id
    }

    /// Returns `true` once the related object is materialized.
    pub fn is_loaded(&self) -> bool {
        self.shared.cell.get().is_some()
    }

    /// The related object, loading it on first access.
    pub fn get(&self) -> MapperResult<&T> {
        if let Some(value) = self.shared.cell.get() {
            return Ok(value.as_ref());
        }
        let Some(pending) = &self.pending else {
            return Err(MapperError::Detached {
                type_name: TypeKey::of::<T>().to_string(),
                id: self.id,
            });
        };

        let _loading = self
            .shared
            .loading
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = self.shared.cell.get() {
            return Ok(value.as_ref());
        }
        let instance = pending.resolver.load(&pending.schema, self.id)?;
        let found = pending.schema.key();
        let value = instance
            .downcast::<T>()
            .map_err(|_| MapperError::TypeMismatch {
                property: found.short_name().to_string(),
                expected: std::any::type_name::<T>(),
                found: found.path(),
            })?;
        Ok(self.shared.cell.get_or_init(|| value).as_ref())
    }

    /// Type-erased form of this reference.
    pub fn to_related(&self) -> RelatedValue {
        let target = TypeKey::of::<T>();
        if let Some(value) = self.shared.cell.get() {
            let instance: Instance = Arc::clone(value) as Instance;
            return RelatedValue::loaded(self.id, target, instance);
        }
        match &self.pending {
            Some(p) => RelatedValue {
                id: self.id,
                target,
                state: RelatedState::Pending {
                    schema: Arc::clone(&p.schema),
                    resolver: p.resolver.clone(),
                },
            },
            None => RelatedValue::detached(self.id, target),
        }
    }

    /// Typed view of `related`. `None` if it targets another type.
    pub fn from_related(related: RelatedValue) -> Option<Self> {
        if !related.target.is::<T>() {
            return None;
        }
        let mut lazy = Self::detached(related.id);
        match related.state {
            RelatedState::Pending { schema, resolver } => {
                lazy.pending = Some(Pending { schema, resolver });
            }
            RelatedState::Loaded(instance) => {
                let value = instance.downcast::<T>().ok()?;
                let _ = lazy.shared.cell.set(value);
            }
            RelatedState::Detached => {}
        }
        Some(lazy)
    }
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            pending: self.pending.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.shared.cell.get().is_some() {
            "loaded"
        } else if self.pending.is_some() {
            "pending"
        } else {
            "detached"
        };
        f.debug_struct("Lazy")
            .field("type", &std::any::type_name::<T>())
            .field("id", &self.id)
            .field("state", &state)
            .finish()
    }
}

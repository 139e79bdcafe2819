use std::sync::Arc;

use contour_types::TypeKey;

use crate::declaration::PropertyDeclaration;
use crate::error::ConfigError;
use crate::handler::{BoundField, FieldHandler, HandlerTarget};
use crate::handlers::{
    ChildrenHandler, DateTimeHandler, IdHandler, ImageHandler, LanguageHandler, ParentHandler,
    ReferenceHandler, ScalarHandler, VersionHandler,
};

// ---------------------------------------------------------------------------
// HandlerChain
// ---------------------------------------------------------------------------

/// An ordered list of field handlers consulted for every mapped property.
///
/// Resolution is **first-match-wins** in registration order. Several handlers
/// may accept the same declared value type, so a specialized handler must be
/// registered before the generic one it refines. Ordering is entirely in the
/// caller's hands.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn FieldHandler>>,
}

impl HandlerChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain with the built-in handlers:
    /// Id -> Language -> Version -> Parent -> Reference -> Children ->
    /// Image -> DateTime -> Scalar
    pub fn with_default_handlers() -> Self {
        let mut chain = Self::new();
        chain.register(Arc::new(IdHandler));
        chain.register(Arc::new(LanguageHandler));
        chain.register(Arc::new(VersionHandler));
        chain.register(Arc::new(ParentHandler));
        chain.register(Arc::new(ReferenceHandler));
        chain.register(Arc::new(ChildrenHandler));
        chain.register(Arc::new(ImageHandler));
        chain.register(Arc::new(DateTimeHandler));
        chain.register(Arc::new(ScalarHandler));
        chain
    }

    /// Append a handler to the end of the chain.
    pub fn register(&mut self, handler: Arc<dyn FieldHandler>) {
        self.handlers.push(handler);
    }

    /// Insert a handler at `index`, ahead of everything registered after it.
    ///
    /// An index past the end appends.
    pub fn insert(&mut self, index: usize, handler: Arc<dyn FieldHandler>) {
        let index = index.min(self.handlers.len());
        self.handlers.insert(index, handler);
    }

    /// Number of handlers in the chain.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in resolution order.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Select the first handler whose predicate accepts `property`.
    pub fn resolve(
        &self,
        owner: &TypeKey,
        property: &PropertyDeclaration,
    ) -> Result<&Arc<dyn FieldHandler>, ConfigError> {
        self.handlers
            .iter()
            .find(|h| h.can_handle(property))
            .ok_or_else(|| ConfigError::NoHandler {
                type_name: owner.to_string(),
                property: property.name.clone(),
                marker: property
                    .marker
                    .as_ref()
                    .map(|m| m.kind_name().to_string())
                    .unwrap_or_else(|| "missing".into()),
                kind: property.kind.to_string(),
            })
    }

    /// Resolve and configure the handler for `target`.
    ///
    /// Returns the handler name alongside the bound field.
    pub fn bind(
        &self,
        target: &HandlerTarget<'_>,
    ) -> Result<(String, Arc<dyn BoundField>), ConfigError> {
        let handler = self.resolve(&target.owner, target.property)?;
        let bound = handler.configure(target)?;
        tracing::debug!(
            owner = %target.owner,
            property = %target.property.name,
            handler = handler.name(),
            "property bound"
        );
        Ok((handler.name().to_string(), bound))
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

//! The context resolver capability
//!
//! Provides [`ContextResolver`] and the in-memory [`StaticResolver`].

use crate::error::{ContextError, ContextResult};
use std::collections::BTreeMap;

/// Connection parameters taken from a context
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedContext {
    /// Server URI of the context's cluster
    pub uri: String,
    /// Default namespace of the context, empty when unset
    pub namespace: String,
}

impl ResolvedContext {
    /// Create resolved context
    #[inline]
    #[must_use]
    pub fn new(uri: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            namespace: namespace.into(),
        }
    }
}

/// Resolve a cluster context into connection parameters
///
/// `None` selects the currently active context; `Some(id)` selects the
/// named one.
pub trait ContextResolver {
    /// Resolve a context
    ///
    /// # Errors
    /// [`ContextError::NotFound`] for an unknown identifier, any other
    /// variant for lower-level failures.
    fn resolve(&self, context: Option<&str>) -> ContextResult<ResolvedContext>;
}

impl<T: ContextResolver + ?Sized> ContextResolver for &T {
    fn resolve(&self, context: Option<&str>) -> ContextResult<ResolvedContext> {
        (**self).resolve(context)
    }
}

impl<T: ContextResolver + ?Sized> ContextResolver for Box<T> {
    fn resolve(&self, context: Option<&str>) -> ContextResult<ResolvedContext> {
        (**self).resolve(context)
    }
}

/// Resolver over a fixed set of contexts
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    contexts: BTreeMap<String, ResolvedContext>,
    current: Option<String>,
}

impl StaticResolver {
    /// Create resolver with no contexts
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a named context
    #[must_use]
    pub fn with_context(
        mut self,
        name: impl Into<String>,
        uri: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        self.contexts
            .insert(name.into(), ResolvedContext::new(uri, namespace));
        self
    }

    /// With the active context
    #[must_use]
    pub fn with_current(mut self, name: impl Into<String>) -> Self {
        self.current = Some(name.into());
        self
    }
}

impl ContextResolver for StaticResolver {
    fn resolve(&self, context: Option<&str>) -> ContextResult<ResolvedContext> {
        let name = match context {
            Some(name) => name,
            None => self
                .current
                .as_deref()
                .ok_or_else(|| ContextError::resolution("", "no current context is set"))?,
        };

        self.contexts
            .get(name)
            .cloned()
            .ok_or_else(|| ContextError::not_found(name))
    }
}

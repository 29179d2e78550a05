//! Registry operations
//!
//! Provides [`Registry`] with the `add`, `remove`, `list` and `set`
//! operations.
//!
//! # Ordering
//! 1. Validate names and flags
//! 2. Resolve the cluster context, if one is needed
//! 3. Take the whole-tree lock
//! 4. Mutate the store
//!
//! Steps 1 and 2 have no side effects, so a rejected request leaves the tree
//! untouched.

use crate::config::{RegistryConfig, DEFAULT_API_SPEC};
use crate::error::{RegistryError, RegistryResult};
use crate::report::EnvironmentReport;
use envreg_context::{ContextResolver, KubeconfigResolver};
use envreg_name::EnvironmentName;
use envreg_store::{EnvironmentSpec, EnvironmentStore, FsEnvironmentStore, TreeLock};

/// Inputs of [`Registry::add`]
///
/// Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddRequest {
    /// Name of the new environment
    pub name: String,
    /// Explicit cluster URI; excludes `context`
    pub uri: Option<String>,
    /// Namespace; defaults to the resolved context's namespace
    pub namespace: Option<String>,
    /// Context to resolve when no URI is given; `None` means current
    pub context: Option<String>,
    /// API spec; defaults to the registry's default
    pub api_spec: Option<String>,
}

impl AddRequest {
    /// Create request for a name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With URI
    #[inline]
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// With namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// With context
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// With API spec
    #[inline]
    #[must_use]
    pub fn with_api_spec(mut self, api_spec: impl Into<String>) -> Self {
        self.api_spec = Some(api_spec.into());
        self
    }
}

/// Inputs of [`Registry::set`]
///
/// Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetRequest {
    /// Current name of the environment
    pub name: String,
    /// New name; the directory moves when it differs
    pub new_name: Option<String>,
    /// New URI; excludes `context`
    pub uri: Option<String>,
    /// New namespace
    pub namespace: Option<String>,
    /// Context whose URI replaces the current one
    pub context: Option<String>,
}

impl SetRequest {
    /// Create request for a name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With new name
    #[inline]
    #[must_use]
    pub fn with_new_name(mut self, new_name: impl Into<String>) -> Self {
        self.new_name = Some(new_name.into());
        self
    }

    /// With URI
    #[inline]
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// With namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// With context
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Registry over a store and a context resolver
#[derive(Debug, Clone)]
pub struct Registry<S, R> {
    store: S,
    resolver: R,
    default_api_spec: String,
    locking: bool,
}

/// Registry over the filesystem tree and kubeconfig files
pub type FsRegistry = Registry<FsEnvironmentStore, KubeconfigResolver>;

impl FsRegistry {
    /// Registry scoped to the configured application root
    #[must_use]
    pub fn open(config: &RegistryConfig) -> Self {
        let store = FsEnvironmentStore::with_layout(&config.app_root, config.layout.clone());
        let resolver = KubeconfigResolver::discover(config.kubeconfig.clone());
        Registry::new(store, resolver)
            .with_default_api_spec(config.default_api_spec.clone())
            .with_locking(config.locking)
    }
}

impl<S: EnvironmentStore, R: ContextResolver> Registry<S, R> {
    /// Create registry
    #[must_use]
    pub fn new(store: S, resolver: R) -> Self {
        Self {
            store,
            resolver,
            default_api_spec: DEFAULT_API_SPEC.to_string(),
            locking: true,
        }
    }

    /// With default API spec for `add`
    #[inline]
    #[must_use]
    pub fn with_default_api_spec(mut self, api_spec: impl Into<String>) -> Self {
        self.default_api_spec = api_spec.into();
        self
    }

    /// With locking on or off
    #[inline]
    #[must_use]
    pub fn with_locking(mut self, locking: bool) -> Self {
        self.locking = locking;
        self
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn guard(&self) -> RegistryResult<TreeLock> {
        if self.locking {
            Ok(self.store.lock()?)
        } else {
            Ok(TreeLock::noop())
        }
    }

    /// Add a new environment
    ///
    /// Without a URI the context (or the current context) is resolved; its
    /// namespace is used only when no namespace was given.
    ///
    /// # Errors
    /// `InvalidName`, `ConflictingFlags`, `Context`, or `Store` (e.g.
    /// duplicate).
    pub fn add(&self, request: &AddRequest) -> RegistryResult<()> {
        let name = EnvironmentName::normalize(&request.name)?;
        let uri_flag = filled(&request.uri);
        let context_flag = filled(&request.context);
        if uri_flag.is_some() && context_flag.is_some() {
            return Err(RegistryError::ConflictingFlags);
        }

        let mut namespace = filled(&request.namespace).unwrap_or_default().to_string();
        let uri = match uri_flag {
            Some(uri) => uri.to_string(),
            None => {
                let resolved = self.resolver.resolve(context_flag)?;
                if namespace.is_empty() {
                    namespace = resolved.namespace;
                }
                resolved.uri
            }
        };
        let api_spec = filled(&request.api_spec).unwrap_or(self.default_api_spec.as_str());
        let spec = EnvironmentSpec::new(uri, namespace, api_spec);

        let _lock = self.guard()?;
        self.store.create(&name, &spec)?;
        tracing::info!("Added environment '{}' pointing at {}", name, spec.uri);
        Ok(())
    }

    /// Remove an environment and any ancestors it leaves empty
    ///
    /// # Errors
    /// `InvalidName`, or `Store` (e.g. not found).
    pub fn remove(&self, name: &str) -> RegistryResult<()> {
        let name = EnvironmentName::normalize(name)?;

        let _lock = self.guard()?;
        self.store.delete(&name)?;
        tracing::info!("Removed environment '{}'", name);
        Ok(())
    }

    /// All environments, ordered by name
    ///
    /// # Errors
    /// `Store` when the tree cannot be read.
    pub fn list(&self) -> RegistryResult<Vec<EnvironmentReport>> {
        let entries = self.store.list()?;
        Ok(entries
            .iter()
            .map(|(name, spec)| EnvironmentReport::from_entry(name, spec))
            .collect())
    }

    /// Rename an environment and/or change its URI and namespace
    ///
    /// A context replaces the URI only; its namespace is not applied. The
    /// rename happens first; if the following spec update fails the
    /// environment stays under its new name with its old spec.
    ///
    /// # Errors
    /// `InvalidName`, `ConflictingFlags`, `Context`, or `Store`.
    pub fn set(&self, request: &SetRequest) -> RegistryResult<()> {
        let name = EnvironmentName::normalize(&request.name)?;
        let context_flag = filled(&request.context);
        if filled(&request.uri).is_some() && context_flag.is_some() {
            return Err(RegistryError::ConflictingFlags);
        }

        let uri = match context_flag {
            Some(context) => Some(self.resolver.resolve(Some(context))?.uri),
            None => filled(&request.uri).map(str::to_string),
        };
        let namespace = filled(&request.namespace).map(str::to_string);

        let new_name = match filled(&request.new_name) {
            Some(raw) => Some(EnvironmentName::normalize(raw)?).filter(|n| *n != name),
            None => None,
        };

        if new_name.is_none() && uri.is_none() && namespace.is_none() {
            tracing::debug!("Nothing to change for environment '{}'", name);
            return Ok(());
        }

        let _lock = self.guard()?;

        let target = match new_name {
            Some(new_name) => {
                self.store.rename(&name, &new_name)?;
                new_name
            }
            None => name,
        };

        if uri.is_some() || namespace.is_some() {
            let mutate = |mut spec: EnvironmentSpec| {
                if let Some(uri) = &uri {
                    spec.uri = uri.clone();
                }
                if let Some(namespace) = &namespace {
                    spec.namespace = namespace.clone();
                }
                spec
            };
            if let Err(e) = self.store.update_spec(&target, &mutate) {
                tracing::warn!(
                    "Spec update for '{}' failed, rename (if any) is kept: {}",
                    target,
                    e
                );
                return Err(e.into());
            }
        }

        tracing::info!("Updated environment '{}'", target);
        Ok(())
    }
}

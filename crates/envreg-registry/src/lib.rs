//! envreg Registry
//!
//! The four lifecycle operations on environments: add, remove, list, set.
//!
//! # Overview
//!
//! Each operation validates and resolves its inputs first, then takes the
//! whole-tree lock and performs its store mutation. Validation failures
//! never touch the tree.
//!
//! # Example
//!
//! ```rust
//! use envreg_context::StaticResolver;
//! use envreg_registry::{AddRequest, Registry};
//! use envreg_store::MemoryEnvironmentStore;
//!
//! let resolver = StaticResolver::new()
//!     .with_context("west", "https://10.0.0.1:6443", "staging")
//!     .with_current("west");
//! let registry = Registry::new(MemoryEnvironmentStore::new(), resolver);
//!
//! registry.add(&AddRequest::new("us-west/staging")).unwrap();
//!
//! let envs = registry.list().unwrap();
//! assert_eq!(envs[0].uri, "https://10.0.0.1:6443");
//! assert_eq!(envs[0].namespace, "staging");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod ops;
pub mod report;

// Re-exports
pub use config::{RegistryConfig, APP_ROOT_ENV, DEFAULT_API_SPEC, KUBECONFIG_OVERRIDE_ENV};
pub use error::{RegistryError, RegistryResult};
pub use ops::{AddRequest, FsRegistry, Registry, SetRequest};
pub use report::{format_report, EnvironmentReport};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for registry operations
    pub use crate::{
        AddRequest, EnvironmentReport, Registry, RegistryConfig, RegistryError, RegistryResult,
        SetRequest,
    };
    pub use envreg_context::{ContextResolver, KubeconfigResolver, StaticResolver};
    pub use envreg_name::EnvironmentName;
    pub use envreg_store::{
        EnvironmentSpec, EnvironmentStore, FsEnvironmentStore, MemoryEnvironmentStore,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

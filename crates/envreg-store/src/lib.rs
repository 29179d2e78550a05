//! envreg Environment Store
//!
//! Persists environments as a tree keyed by name segments.
//!
//! # Core Concepts
//!
//! - [`EnvironmentSpec`]: The record persisted per environment
//! - [`EnvironmentStore`]: Structural mutations with rollback and pruning
//! - [`FsEnvironmentStore`]: `environments/<seg>/.../spec.json` on disk
//! - [`MemoryEnvironmentStore`]: Arena-backed tree with the same semantics
//! - [`TreeLock`]: Whole-tree exclusive lock held for one operation
//!
//! # Example
//!
//! ```rust
//! use envreg_name::EnvironmentName;
//! use envreg_store::{EnvironmentSpec, EnvironmentStore, MemoryEnvironmentStore};
//!
//! let store = MemoryEnvironmentStore::new();
//! let name = EnvironmentName::normalize("us-west/staging").unwrap();
//! let spec = EnvironmentSpec::new("https://host:6443", "", "version:v1.7.0");
//!
//! store.create(&name, &spec).unwrap();
//! assert!(store.exists(&name));
//!
//! store.delete(&name).unwrap();
//! assert!(store.list().unwrap().is_empty());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod filesystem;
pub mod lock;
pub mod memory;
pub mod spec;
pub mod store;

// Re-exports
pub use error::{StoreError, StoreResult};
pub use filesystem::{FsEnvironmentStore, StoreLayout};
pub use lock::TreeLock;
pub use memory::MemoryEnvironmentStore;
pub use spec::EnvironmentSpec;
pub use store::{EnvironmentStore, SpecMutation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

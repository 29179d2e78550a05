//! envreg Context Resolution
//!
//! Turns an optional cluster context identifier into the connection
//! parameters an environment records.
//!
//! # Overview
//!
//! - **ContextResolver**: the capability the registry depends on
//! - **KubeconfigResolver**: reads kubeconfig files the way kubectl does
//! - **StaticResolver**: fixed, in-memory contexts
//!
//! # Example
//!
//! ```rust
//! use envreg_context::{ContextResolver, StaticResolver};
//!
//! let resolver = StaticResolver::new()
//!     .with_context("staging-west", "https://10.0.0.1:6443", "staging")
//!     .with_current("staging-west");
//!
//! let ctx = resolver.resolve(None).unwrap();
//! assert_eq!(ctx.uri, "https://10.0.0.1:6443");
//! assert_eq!(ctx.namespace, "staging");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod kubeconfig;
pub mod resolver;

// Re-exports
pub use error::{ContextError, ContextResult};
pub use kubeconfig::{KubeconfigResolver, KUBECONFIG_ENV};
pub use resolver::{ContextResolver, ResolvedContext, StaticResolver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

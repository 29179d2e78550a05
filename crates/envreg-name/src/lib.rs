//! envreg Environment Names
//!
//! Validated, hierarchical names for deployment environments.
//!
//! # Core Concepts
//!
//! - [`EnvironmentName`]: Ordered, non-empty sequence of path segments
//! - [`NameError`]: Why a raw name was rejected, with the offending segment
//!
//! # Example
//!
//! ```rust
//! use envreg_name::EnvironmentName;
//!
//! let name = EnvironmentName::normalize("us-west/staging").unwrap();
//! assert_eq!(name.segments(), &["us-west", "staging"]);
//! assert_eq!(name.to_string(), "us-west/staging");
//!
//! assert!(EnvironmentName::normalize("../escape").is_err());
//! ```

#![warn(missing_docs)]

mod name;

pub use name::{EnvironmentName, NameError, SEPARATOR};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

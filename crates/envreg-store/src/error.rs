//! Error types for environment stores
//!
//! Every error names the environment or path it concerns so callers can
//! print it as-is.

use std::path::PathBuf;

/// Errors from store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Name is taken, or would change the role of an existing directory
    #[error("{}", describe_duplicate(.name, .conflict))]
    Duplicate {
        /// Name that was requested
        name: String,
        /// Existing environment it collides with
        conflict: String,
    },

    /// No environment with that name
    #[error("environment '{name}' does not exist")]
    NotFound {
        /// Requested name
        name: String,
    },

    /// Underlying filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Spec file exists but cannot be decoded
    #[error("malformed spec file {path}: {source}")]
    MalformedSpec {
        /// Spec file
        path: PathBuf,
        /// Decoding error
        #[source]
        source: serde_json::Error,
    },

    /// Spec violates a persistence invariant
    #[error("invalid spec for environment '{name}': {reason}")]
    InvalidSpec {
        /// Environment the spec belongs to
        name: String,
        /// Violated invariant
        reason: String,
    },
}

fn describe_duplicate(name: &str, conflict: &str) -> String {
    if name == conflict {
        format!("environment '{name}' already exists")
    } else {
        format!("environment '{name}' conflicts with existing environment '{conflict}'")
    }
}

impl StoreError {
    /// Create duplicate error
    pub fn duplicate(name: impl ToString, conflict: impl ToString) -> Self {
        Self::Duplicate {
            name: name.to_string(),
            conflict: conflict.to_string(),
        }
    }

    /// Create not-found error
    pub fn not_found(name: impl ToString) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }

    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create invalid spec error
    pub fn invalid_spec(name: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for [`StoreError::Duplicate`]
    #[inline]
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// True for [`StoreError::NotFound`]
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

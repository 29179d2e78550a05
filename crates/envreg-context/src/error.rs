//! Error types for context resolution
//!
//! Every variant is final: resolution is never retried.

use std::path::PathBuf;

/// Errors while resolving a cluster context
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Named context is not defined anywhere
    #[error("context '{context}' does not exist in the kubeconfig file")]
    NotFound {
        /// Requested context
        context: String,
    },

    /// Context exists (or was implied) but could not be turned into a URI
    #[error("failed to resolve context '{context}': {reason}")]
    Resolution {
        /// Context being resolved, empty for the current context
        context: String,
        /// What went wrong
        reason: String,
    },

    /// IO error reading a kubeconfig file
    #[error("io error reading {path}: {source}")]
    Io {
        /// Kubeconfig file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Kubeconfig file is not valid YAML for the expected shape
    #[error("malformed kubeconfig {path}: {source}")]
    Parse {
        /// Kubeconfig file
        path: PathBuf,
        /// Decoding error
        #[source]
        source: serde_yaml::Error,
    },
}

impl ContextError {
    /// Create not-found error
    pub fn not_found(context: impl Into<String>) -> Self {
        Self::NotFound {
            context: context.into(),
        }
    }

    /// Create resolution error
    pub fn resolution(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for an unknown context identifier
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for context operations
pub type ContextResult<T> = Result<T, ContextError>;

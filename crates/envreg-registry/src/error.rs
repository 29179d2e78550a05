//! Error types for registry operations
//!
//! Wraps the name, context and store errors so callers see one type.

use envreg_context::ContextError;
use envreg_name::NameError;
use envreg_store::StoreError;

/// Main registry error type
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Environment name failed validation
    #[error("invalid environment name: {0}")]
    InvalidName(#[from] NameError),

    /// `uri` and `context` were both given
    #[error(
        "flags 'context' and 'uri' are mutually exclusive, because 'context' has a URI. \
         Try setting 'uri', 'namespace' to the desired values"
    )]
    ConflictingFlags,

    /// Context could not be resolved
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Store mutation or read failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// True when the named environment does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    /// True when the name collides with an existing environment
    #[inline]
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_duplicate())
    }
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

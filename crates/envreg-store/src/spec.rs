//! Persisted environment record
//!
//! Provides [`EnvironmentSpec`], serialized as `spec.json`.

use serde::{Deserialize, Serialize};

/// Connection parameters recorded for one environment
///
/// Serialized with the keys `uri`, `namespace` and `apiSpecVersion`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    /// Target cluster URI, never empty once persisted
    pub uri: String,

    /// Default namespace for operations in this environment
    #[serde(default)]
    pub namespace: String,

    /// API/version schema the cached libraries were generated from
    #[serde(default)]
    pub api_spec_version: String,
}

impl EnvironmentSpec {
    /// Create spec
    #[inline]
    #[must_use]
    pub fn new(
        uri: impl Into<String>,
        namespace: impl Into<String>,
        api_spec_version: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            namespace: namespace.into(),
            api_spec_version: api_spec_version.into(),
        }
    }

    /// With a different URI
    #[inline]
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// With a different namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Check persistence invariants
    ///
    /// # Errors
    /// Returns a human-readable reason when the spec must not be written.
    pub fn validate(&self) -> Result<(), String> {
        if self.uri.is_empty() {
            return Err("uri must not be empty".to_string());
        }
        Ok(())
    }
}

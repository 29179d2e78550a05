//! Registry configuration
//!
//! Every operation is scoped to an explicit application root; nothing is
//! looked up from the working directory implicitly.

use envreg_store::StoreLayout;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// API spec recorded when `add` is not given one
pub const DEFAULT_API_SPEC: &str = "version:v1.7.0";

/// Environment variable overriding the application root
pub const APP_ROOT_ENV: &str = "ENVREG_APP_ROOT";

/// Environment variable naming a kubeconfig file to use instead of discovery
pub const KUBECONFIG_OVERRIDE_ENV: &str = "ENVREG_KUBECONFIG";

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Application root; the environment tree lives below it
    pub app_root: PathBuf,
    /// Directory and file names inside the application root
    pub layout: StoreLayout,
    /// Kubeconfig file; `None` discovers it like kubectl
    pub kubeconfig: Option<PathBuf>,
    /// API spec for `add` when none is given
    pub default_api_spec: String,
    /// Take the whole-tree lock around mutations
    pub locking: bool,
}

impl RegistryConfig {
    /// Create configuration for an application root
    #[inline]
    #[must_use]
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `ENVREG_APP_ROOT` and `ENVREG_KUBECONFIG`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup(APP_ROOT_ENV).filter(|v| !v.is_empty()) {
            config.app_root = PathBuf::from(root);
        }
        if let Some(path) = lookup(KUBECONFIG_OVERRIDE_ENV).filter(|v| !v.is_empty()) {
            config.kubeconfig = Some(PathBuf::from(path));
        }
        config
    }

    /// With application root
    #[inline]
    #[must_use]
    pub fn with_app_root(mut self, app_root: impl Into<PathBuf>) -> Self {
        self.app_root = app_root.into();
        self
    }

    /// With explicit kubeconfig file
    #[inline]
    #[must_use]
    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// With default API spec
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

    /// With store layout
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: StoreLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The environments root directory
    #[must_use]
    pub fn environments_root(&self) -> PathBuf {
        self.app_root.join(&self.layout.environments_dir)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("."),
            layout: StoreLayout::default(),
            kubeconfig: None,
            default_api_spec: DEFAULT_API_SPEC.to_string(),
            locking: true,
        }
    }
}

//! Kubeconfig-backed context resolution
//!
//! Provides [`KubeconfigResolver`], which reads the same files kubectl
//! reads: an explicit path, else every entry of `$KUBECONFIG`, else
//! `~/.kube/config`. Multiple files are merged with first-definition-wins
//! semantics.

use crate::error::{ContextError, ContextResult};
use crate::resolver::{ContextResolver, ResolvedContext};
use serde::Deserialize;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs};

/// Environment variable listing kubeconfig files
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// The subset of a kubeconfig file this resolver reads
#[derive(Debug, Default, Deserialize)]
struct Kubeconfig {
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
    #[serde(default)]
    contexts: Option<Vec<NamedContext>>,
    #[serde(default)]
    clusters: Option<Vec<NamedCluster>>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    #[serde(default)]
    context: ContextEntry,
}

#[derive(Debug, Default, Deserialize)]
struct ContextEntry {
    #[serde(default)]
    cluster: String,
    #[serde(default)]
    namespace: String,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    #[serde(default)]
    cluster: ClusterEntry,
}

#[derive(Debug, Default, Deserialize)]
struct ClusterEntry {
    #[serde(default)]
    server: String,
}

impl Kubeconfig {
    fn parse(path: &Path, contents: &str) -> ContextResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|source| ContextError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fold `other` into `self`; definitions already present win
    fn merge(&mut self, other: Self) {
        let has_current = self
            .current_context
            .as_deref()
            .is_some_and(|c| !c.is_empty());
        if !has_current {
            if let Some(current) = other.current_context.filter(|c| !c.is_empty()) {
                self.current_context = Some(current);
            }
        }

        let contexts = self.contexts.get_or_insert_with(Vec::new);
        for ctx in other.contexts.unwrap_or_default() {
            if !contexts.iter().any(|c| c.name == ctx.name) {
                contexts.push(ctx);
            }
        }

        let clusters = self.clusters.get_or_insert_with(Vec::new);
        for cluster in other.clusters.unwrap_or_default() {
            if !clusters.iter().any(|c| c.name == cluster.name) {
                clusters.push(cluster);
            }
        }
    }

    fn context(&self, name: &str) -> Option<&ContextEntry> {
        self.contexts
            .iter()
            .flatten()
            .find(|c| c.name == name)
            .map(|c| &c.context)
    }

    fn cluster(&self, name: &str) -> Option<&ClusterEntry> {
        self.clusters
            .iter()
            .flatten()
            .find(|c| c.name == name)
            .map(|c| &c.cluster)
    }
}

/// Resolver reading kubeconfig files
#[derive(Debug, Clone)]
pub struct KubeconfigResolver {
    paths: Vec<PathBuf>,
}

impl KubeconfigResolver {
    /// Resolver over an explicit list of files, merged in order
    #[inline]
    #[must_use]
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Locate kubeconfig files the way kubectl does
    ///
    /// `explicit` wins; otherwise `$KUBECONFIG`, otherwise
    /// `$HOME/.kube/config`.
    #[must_use]
    pub fn discover(explicit: Option<PathBuf>) -> Self {
        Self::from_paths(candidate_paths(
            explicit,
            env::var_os(KUBECONFIG_ENV),
            dirs::home_dir(),
        ))
    }

    /// Files this resolver reads, in merge order
    #[inline]
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn load(&self) -> ContextResult<Kubeconfig> {
        let mut merged = Kubeconfig::default();
        let mut loaded = 0usize;

        for path in &self.paths {
            let contents = match fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("Skipping missing kubeconfig {}", path.display());
                    continue;
                }
                Err(e) => return Err(ContextError::io_error(path, e)),
            };
            merged.merge(Kubeconfig::parse(path, &contents)?);
            loaded += 1;
        }

        if loaded == 0 {
            let searched: Vec<String> = self
                .paths
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            return Err(ContextError::resolution(
                "",
                format!("no kubeconfig file found (searched: [{}])", searched.join(", ")),
            ));
        }

        Ok(merged)
    }
}

impl ContextResolver for KubeconfigResolver {
    fn resolve(&self, context: Option<&str>) -> ContextResult<ResolvedContext> {
        let config = self.load()?;

        let name = match context {
            Some(name) => name.to_string(),
            None => config
                .current_context
                .clone()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    ContextError::resolution("", "no current context is set in the kubeconfig file")
                })?,
        };

        let entry = config
            .context(&name)
            .ok_or_else(|| ContextError::not_found(&name))?;

        tracing::info!(
            "Using context '{}' from kubeconfig {:?}",
            name,
            self.paths
        );

        let cluster = config.cluster(&entry.cluster).ok_or_else(|| {
            ContextError::resolution(&name, format!("no cluster named '{}' exists", entry.cluster))
        })?;

        if cluster.server.is_empty() {
            return Err(ContextError::resolution(
                &name,
                format!("cluster '{}' has no server URI", entry.cluster),
            ));
        }

        Ok(ResolvedContext::new(&cluster.server, &entry.namespace))
    }
}

fn candidate_paths(
    explicit: Option<PathBuf>,
    kubeconfig_env: Option<OsString>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path];
    }

    if let Some(value) = kubeconfig_env.filter(|v| !v.is_empty()) {
        let paths: Vec<PathBuf> = env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !paths.is_empty() {
            return paths;
        }
    }

    home.map(|h| vec![h.join(".kube").join("config")])
        .unwrap_or_default()
}

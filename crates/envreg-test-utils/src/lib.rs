//! Testing utilities for envreg workspace
//!
//! Shared fixtures: a throwaway application root, a fixed set of cluster
//! contexts, tree snapshots, and stores that fail on demand.

#![allow(missing_docs)]

use envreg_context::StaticResolver;
use envreg_name::EnvironmentName;
use envreg_registry::{Registry, RegistryConfig};
use envreg_store::{
    EnvironmentSpec, EnvironmentStore, FsEnvironmentStore, SpecMutation, StoreError, StoreResult,
    TreeLock,
};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;

pub const WEST_URI: &str = "https://10.0.0.1:6443";
pub const EAST_URI: &str = "https://10.1.0.1:6443";

/// Contexts `west` (namespace `staging`, current) and `east` (no namespace)
pub fn fixture_resolver() -> StaticResolver {
    StaticResolver::new()
        .with_context("west", WEST_URI, "staging")
        .with_context("east", EAST_URI, "")
        .with_current("west")
}

pub fn name(raw: &str) -> EnvironmentName {
    EnvironmentName::normalize(raw).unwrap()
}

/// Application root in a temporary directory
pub struct TempApp {
    dir: TempDir,
}

impl TempApp {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> RegistryConfig {
        RegistryConfig::new(self.dir.path())
    }

    pub fn store(&self) -> FsEnvironmentStore {
        FsEnvironmentStore::new(self.dir.path())
    }

    pub fn registry(&self) -> Registry<FsEnvironmentStore, StaticResolver> {
        Registry::new(self.store(), fixture_resolver())
    }

    /// Registry whose spec updates always fail
    pub fn failing_update_registry(
        &self,
    ) -> Registry<FailingUpdateStore<FsEnvironmentStore>, StaticResolver> {
        Registry::new(FailingUpdateStore::new(self.store()), fixture_resolver())
    }

    /// Every directory and file under `environments/`
    pub fn snapshot(&self) -> BTreeMap<String, Option<Vec<u8>>> {
        snapshot(&self.dir.path().join("environments"))
    }

    pub fn read_spec(&self, raw: &str) -> EnvironmentSpec {
        self.store().get(&name(raw)).unwrap()
    }
}

impl Default for TempApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Relative path of every entry below `root`; directories map to `None`,
/// files to their contents
pub fn snapshot(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
    let mut out = BTreeMap::new();
    if root.is_dir() {
        walk(root, root, &mut out);
    }
    out
}

fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Option<Vec<u8>>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let rel = path
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        if path.is_dir() {
            out.insert(format!("{rel}/"), None);
            walk(root, &path, out);
        } else {
            out.insert(rel, Some(fs::read(&path).unwrap()));
        }
    }
}

/// Store wrapper whose `update_spec` always fails with an IO error
#[derive(Debug, Clone)]
pub struct FailingUpdateStore<S> {
    inner: S,
}

impl<S> FailingUpdateStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: EnvironmentStore> EnvironmentStore for FailingUpdateStore<S> {
    fn exists(&self, name: &EnvironmentName) -> bool {
        self.inner.exists(name)
    }

    fn get(&self, name: &EnvironmentName) -> StoreResult<EnvironmentSpec> {
        self.inner.get(name)
    }

    fn create(&self, name: &EnvironmentName, spec: &EnvironmentSpec) -> StoreResult<()> {
        self.inner.create(name, spec)
    }

    fn delete(&self, name: &EnvironmentName) -> StoreResult<()> {
        self.inner.delete(name)
    }

    fn rename(&self, old: &EnvironmentName, new: &EnvironmentName) -> StoreResult<()> {
        self.inner.rename(old, new)
    }

    fn update_spec(&self, name: &EnvironmentName, _mutate: SpecMutation<'_>) -> StoreResult<()> {
        Err(StoreError::io(
            name.to_relative_path(),
            io::Error::new(io::ErrorKind::PermissionDenied, "spec is read-only"),
        ))
    }

    fn list(&self) -> StoreResult<Vec<(EnvironmentName, EnvironmentSpec)>> {
        self.inner.list()
    }

    fn lock(&self) -> StoreResult<TreeLock> {
        self.inner.lock()
    }
}

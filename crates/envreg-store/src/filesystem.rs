//! Filesystem-backed environment store
//!
//! Layout under an application root:
//!
//! ```text
//! environments/
//!   default/
//!     .metadata/
//!     spec.json
//!   us-west/
//!     staging/
//!       .metadata/
//!       spec.json
//! ```
//!
//! A directory holding the spec file is a leaf. Every other directory below
//! the root is intermediate and exists only to host leaves.

use crate::error::{StoreError, StoreResult};
use crate::lock::TreeLock;
use crate::spec::EnvironmentSpec;
use crate::store::{EnvironmentStore, SpecMutation};
use envreg_name::EnvironmentName;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File and directory names used by [`FsEnvironmentStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    /// Root directory of the tree, relative to the application root
    pub environments_dir: String,
    /// Spec file inside each leaf
    pub spec_file: String,
    /// Generated-artifact directory inside each leaf
    pub metadata_dir: String,
    /// Lock file, relative to the application root
    pub lock_file: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            environments_dir: "environments".to_string(),
            spec_file: "spec.json".to_string(),
            metadata_dir: ".metadata".to_string(),
            lock_file: ".envreg.lock".to_string(),
        }
    }
}

/// Environment store rooted at `<app_root>/environments`
#[derive(Debug, Clone)]
pub struct FsEnvironmentStore {
    app_root: PathBuf,
    root: PathBuf,
    layout: StoreLayout,
    #[cfg(test)]
    faults: Faults,
}

/// Directory operations forced to fail in tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
struct Faults {
    move_dir: bool,
    remove_dir: Option<PathBuf>,
}

impl FsEnvironmentStore {
    /// Store with the default layout
    #[inline]
    #[must_use]
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self::with_layout(app_root, StoreLayout::default())
    }

    /// Store with a custom layout
    #[must_use]
    pub fn with_layout(app_root: impl Into<PathBuf>, layout: StoreLayout) -> Self {
        let app_root = app_root.into();
        let root = app_root.join(&layout.environments_dir);
        Self {
            app_root,
            root,
            layout,
            #[cfg(test)]
            faults: Faults::default(),
        }
    }

    /// The environments root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of an environment (whether or not it exists)
    #[inline]
    #[must_use]
    pub fn env_dir(&self, name: &EnvironmentName) -> PathBuf {
        self.root.join(name.to_relative_path())
    }

    /// Spec file of an environment (whether or not it exists)
    #[inline]
    #[must_use]
    pub fn spec_path(&self, name: &EnvironmentName) -> PathBuf {
        self.env_dir(name).join(&self.layout.spec_file)
    }

    fn is_leaf(&self, dir: &Path) -> bool {
        dir.join(&self.layout.spec_file).is_file()
    }

    fn read_spec(&self, dir: &Path) -> StoreResult<EnvironmentSpec> {
        let path = dir.join(&self.layout.spec_file);
        let contents = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        serde_json::from_str(&contents).map_err(|source| StoreError::MalformedSpec { path, source })
    }

    /// Replace the spec file through a temporary file in the same directory
    fn write_spec(&self, dir: &Path, spec: &EnvironmentSpec) -> StoreResult<()> {
        let path = dir.join(&self.layout.spec_file);
        let mut json = serde_json::to_vec_pretty(spec).map_err(|source| {
            StoreError::MalformedSpec {
                path: path.clone(),
                source,
            }
        })?;
        json.push(b'\n');

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;

        Ok(())
    }

    /// Reject names whose directory would collide with the existing tree
    fn check_vacant(&self, name: &EnvironmentName) -> StoreResult<()> {
        for ancestor in name.ancestors() {
            if self.is_leaf(&self.env_dir(&ancestor)) {
                return Err(StoreError::duplicate(name, &ancestor));
            }
        }

        let dir = self.env_dir(name);
        if self.is_leaf(&dir) {
            return Err(StoreError::duplicate(name, name));
        }

        // Leftover directories without a leaf below them do not count
        if dir.is_dir() {
            let mut prefix = name.segments().to_vec();
            if let Some(descendant) = self.first_leaf(&dir, &mut prefix)? {
                return Err(StoreError::duplicate(name, descendant));
            }
        }

        Ok(())
    }

    /// Create `dir` and any missing parents up to and including the root
    ///
    /// Returns the topmost directory this call created, if any.
    fn create_dirs(&self, dir: &Path) -> StoreResult<Option<PathBuf>> {
        let mut topmost = None;
        let mut current = dir.to_path_buf();
        while current.starts_with(&self.root) && !current.exists() {
            topmost = Some(current.clone());
            if current == self.root || !current.pop() {
                break;
            }
        }

        if let Err(e) = fs::create_dir_all(dir) {
            if let Some(top) = &topmost {
                remove_best_effort(top);
            }
            return Err(StoreError::io(dir, e));
        }

        Ok(topmost)
    }

    /// Remove now-empty directories from `start` upwards, excluding the root
    ///
    /// Stops at the first non-empty directory. A failing step ends the walk
    /// and keeps whatever was already removed.
    fn prune_from(&self, start: &Path) {
        let mut current = start.to_path_buf();
        while current != self.root && current.starts_with(&self.root) {
            match dir_is_empty(&current) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    tracing::warn!("Stopped pruning at {}: {}", current.display(), e);
                    break;
                }
            }

            if let Err(e) = self.remove_empty_dir(&current) {
                tracing::warn!("Failed to prune {}: {}", current.display(), e);
                break;
            }
            tracing::debug!("Pruned empty directory {}", current.display());

            if !current.pop() {
                break;
            }
        }
    }

    /// Subdirectories of `dir` in name order, skipping dot-entries
    fn child_dirs(&self, dir: &Path) -> StoreResult<Vec<(String, PathBuf)>> {
        let mut entries = fs::read_dir(dir)
            .and_then(|iter| iter.collect::<io::Result<Vec<_>>>())
            .map_err(|e| StoreError::io(dir, e))?;
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = entry.path();
            let Ok(segment) = entry.file_name().into_string() else {
                tracing::warn!("Skipping non UTF-8 entry {}", path.display());
                continue;
            };
            if segment.starts_with('.') || !path.is_dir() {
                continue;
            }
            out.push((segment, path));
        }
        Ok(out)
    }

    /// Depth-first collection of leaves below `dir`
    ///
    /// Leaves are not descended into.
    fn walk(
        &self,
        dir: &Path,
        prefix: &mut Vec<String>,
        out: &mut Vec<(EnvironmentName, EnvironmentSpec)>,
    ) -> StoreResult<()> {
        for (segment, path) in self.child_dirs(dir)? {
            prefix.push(segment);
            if self.is_leaf(&path) {
                match EnvironmentName::from_segments(prefix.iter().cloned()) {
                    Ok(name) => out.push((name, self.read_spec(&path)?)),
                    Err(e) => {
                        tracing::warn!("Skipping environment at {}: {}", path.display(), e);
                    }
                }
            } else {
                self.walk(&path, prefix, out)?;
            }
            prefix.pop();
        }

        Ok(())
    }

    /// First leaf below `dir` in walk order, without reading its spec
    fn first_leaf(
        &self,
        dir: &Path,
        prefix: &mut Vec<String>,
    ) -> StoreResult<Option<EnvironmentName>> {
        for (segment, path) in self.child_dirs(dir)? {
            prefix.push(segment);
            let found = if self.is_leaf(&path) {
                EnvironmentName::from_segments(prefix.iter().cloned()).ok()
            } else {
                self.first_leaf(&path, prefix)?
            };
            prefix.pop();
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    fn move_dir(&self, from: &Path, to: &Path) -> io::Result<()> {
        #[cfg(test)]
        {
            if self.faults.move_dir {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "move denied"));
            }
        }
        fs::rename(from, to)
    }

    fn remove_empty_dir(&self, dir: &Path) -> io::Result<()> {
        #[cfg(test)]
        {
            if self.faults.remove_dir.as_deref() == Some(dir) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "remove denied"));
            }
        }
        fs::remove_dir(dir)
    }
}

impl EnvironmentStore for FsEnvironmentStore {
    fn exists(&self, name: &EnvironmentName) -> bool {
        self.is_leaf(&self.env_dir(name))
    }

    fn get(&self, name: &EnvironmentName) -> StoreResult<EnvironmentSpec> {
        if !self.exists(name) {
            return Err(StoreError::not_found(name));
        }
        self.read_spec(&self.env_dir(name))
    }

    fn create(&self, name: &EnvironmentName, spec: &EnvironmentSpec) -> StoreResult<()> {
        spec.validate()
            .map_err(|reason| StoreError::invalid_spec(name, reason))?;
        self.check_vacant(name)?;

        let dir = self.env_dir(name);
        let created = self.create_dirs(&dir)?;

        let populated = self.write_spec(&dir, spec).and_then(|()| {
            let metadata = dir.join(&self.layout.metadata_dir);
            match fs::create_dir(&metadata) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
                Err(e) => Err(StoreError::io(&metadata, e)),
            }
        });

        if let Err(err) = populated {
            tracing::warn!("Rolling back creation of '{}': {}", name, err);
            match created {
                Some(top) => remove_best_effort(&top),
                None => {
                    // The leaf directory was already there; undo our files only
                    let _ = fs::remove_file(dir.join(&self.layout.spec_file));
                    let _ = fs::remove_dir(dir.join(&self.layout.metadata_dir));
                }
            }
            return Err(err);
        }

        tracing::info!("Created environment '{}' at {}", name, dir.display());
        Ok(())
    }

    fn delete(&self, name: &EnvironmentName) -> StoreResult<()> {
        if !self.exists(name) {
            return Err(StoreError::not_found(name));
        }

        let dir = self.env_dir(name);
        fs::remove_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tracing::info!("Deleted environment '{}'", name);

        if let Some(parent) = dir.parent() {
            self.prune_from(parent);
        }
        Ok(())
    }

    fn rename(&self, old: &EnvironmentName, new: &EnvironmentName) -> StoreResult<()> {
        if !self.exists(old) {
            return Err(StoreError::not_found(old));
        }
        self.check_vacant(new)?;

        let src = self.env_dir(old);
        let dst = self.env_dir(new);

        let created = match dst.parent() {
            Some(parent) => self.create_dirs(parent)?,
            None => None,
        };

        // Leftover directory at the destination holds no leaf; clear it
        if dst.is_dir() {
            if let Err(e) = fs::remove_dir_all(&dst) {
                if let Some(top) = &created {
                    remove_best_effort(top);
                }
                return Err(StoreError::io(&dst, e));
            }
        }

        if let Err(e) = self.move_dir(&src, &dst) {
            if let Some(top) = &created {
                remove_best_effort(top);
            }
            return Err(StoreError::io(&dst, e));
        }
        tracing::info!("Renamed environment '{}' to '{}'", old, new);

        if let Some(parent) = src.parent() {
            self.prune_from(parent);
        }
        Ok(())
    }

    fn update_spec(&self, name: &EnvironmentName, mutate: SpecMutation<'_>) -> StoreResult<()> {
        let current = self.get(name)?;
        let updated = mutate(current);
        updated
            .validate()
            .map_err(|reason| StoreError::invalid_spec(name, reason))?;

        self.write_spec(&self.env_dir(name), &updated)?;
        tracing::info!("Updated spec of environment '{}'", name);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<(EnvironmentName, EnvironmentSpec)>> {
        let mut out = Vec::new();
        if !self.root.is_dir() {
            return Ok(out);
        }

        self.walk(&self.root, &mut Vec::new(), &mut out)?;
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn lock(&self) -> StoreResult<TreeLock> {
        fs::create_dir_all(&self.app_root).map_err(|e| StoreError::io(&self.app_root, e))?;
        TreeLock::acquire(&self.app_root.join(&self.layout.lock_file))
    }
}

fn dir_is_empty(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

fn remove_best_effort(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        tracing::warn!("Failed to clean up {}: {}", dir.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn name(raw: &str) -> EnvironmentName {
        EnvironmentName::normalize(raw).unwrap()
    }

    fn spec(uri: &str) -> EnvironmentSpec {
        EnvironmentSpec::new(uri, "", "version:v1.7.0")
    }

    fn store() -> (TempDir, FsEnvironmentStore) {
        let dir = TempDir::new().unwrap();
        let store = FsEnvironmentStore::new(dir.path());
        (dir, store)
    }

    fn faulty(store: &FsEnvironmentStore, faults: Faults) -> FsEnvironmentStore {
        FsEnvironmentStore {
            faults,
            ..store.clone()
        }
    }

    /// Every entry below `root`, directories with a trailing `/`
    fn tree(root: &Path) -> Vec<String> {
        fn visit(root: &Path, dir: &Path, out: &mut Vec<String>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                let rel = path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                if path.is_dir() {
                    out.push(format!("{rel}/"));
                    visit(root, &path, out);
                } else {
                    out.push(rel);
                }
            }
        }

        let mut out = Vec::new();
        if root.is_dir() {
            visit(root, root, &mut out);
        }
        out.sort();
        out
    }

    fn names(store: &FsEnvironmentStore) -> Vec<String> {
        store
            .list()
            .unwrap()
            .into_iter()
            .map(|(n, _)| n.to_string())
            .collect()
    }

    #[test]
    fn create_writes_spec_and_metadata() {
        let (_dir, store) = store();
        let n = name("us-west/staging");
        store.create(&n, &spec("https://host:6443")).unwrap();

        let leaf = store.root().join("us-west").join("staging");
        assert!(leaf.join("spec.json").is_file());
        assert!(leaf.join(".metadata").is_dir());

        let raw = fs::read_to_string(leaf.join("spec.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "uri": "https://host:6443",
                "namespace": "",
                "apiSpecVersion": "version:v1.7.0",
            })
        );
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn create_rejects_empty_uri() {
        let (_dir, store) = store();
        let err = store.create(&name("a"), &spec("")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSpec { .. }));
        assert!(!store.root().exists());
    }

    #[test]
    fn create_duplicate() {
        let (_dir, store) = store();
        store.create(&name("a/b"), &spec("https://1")).unwrap();
        let err = store.create(&name("a/b"), &spec("https://2")).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.get(&name("a/b")).unwrap().uri, "https://1");
    }

    #[test]
    fn create_below_existing_leaf_is_rejected() {
        let (_dir, store) = store();
        store.create(&name("a"), &spec("https://1")).unwrap();
        let err = store.create(&name("a/b"), &spec("https://2")).unwrap_err();
        match err {
            StoreError::Duplicate { name, conflict } => {
                assert_eq!(name, "a/b");
                assert_eq!(conflict, "a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!store.root().join("a").join("b").exists());
    }

    #[test]
    fn create_over_intermediate_is_rejected() {
        let (_dir, store) = store();
        store.create(&name("a/b"), &spec("https://1")).unwrap();
        let err = store.create(&name("a"), &spec("https://2")).unwrap_err();
        match err {
            StoreError::Duplicate { conflict, .. } => assert_eq!(conflict, "a/b"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!store.root().join("a").join("spec.json").exists());
    }

    #[test]
    fn create_reuses_stale_empty_directory() {
        let (_dir, store) = store();
        fs::create_dir_all(store.root().join("stale")).unwrap();
        store.create(&name("stale"), &spec("https://1")).unwrap();
        assert!(store.exists(&name("stale")));
    }

    #[test]
    fn create_rolls_back_directories_on_failure() {
        let (_dir, store) = store();
        store.create(&name("keep"), &spec("https://1")).unwrap();

        // A file named like the metadata directory's parent blocks directory creation
        let layout = StoreLayout {
            metadata_dir: "spec.json/.metadata".to_string(),
            ..StoreLayout::default()
        };
        let broken = FsEnvironmentStore::with_layout(store.app_root.clone(), layout);
        let err = broken.create(&name("x/y/z"), &spec("https://2")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        assert!(!store.root().join("x").exists());
        assert_eq!(names(&store), vec!["keep"]);
    }

    #[test]
    fn create_on_fresh_root_rolls_back_root() {
        let dir = TempDir::new().unwrap();
        let layout = StoreLayout {
            metadata_dir: "spec.json/.metadata".to_string(),
            ..StoreLayout::default()
        };
        let broken = FsEnvironmentStore::with_layout(dir.path(), layout);

        let err = broken.create(&name("x"), &spec("https://1")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!broken.root().exists());
    }

    #[test]
    fn create_over_leftover_directories_without_leaves() {
        let (_dir, store) = store();
        fs::create_dir_all(store.root().join("a").join("b")).unwrap();
        fs::create_dir_all(store.root().join("c").join(".cache")).unwrap();
        assert!(!store.exists(&name("a")));
        assert!(names(&store).is_empty());

        store.create(&name("a"), &spec("https://1")).unwrap();
        store.create(&name("c"), &spec("https://2")).unwrap();

        assert_eq!(names(&store), vec!["a", "c"]);
        assert_eq!(store.get(&name("a")).unwrap().uri, "https://1");
    }

    #[test]
    fn delete_prunes_empty_ancestors() {
        let (_dir, store) = store();
        store.create(&name("us-west/staging"), &spec("https://1")).unwrap();
        store.delete(&name("us-west/staging")).unwrap();

        assert!(!store.root().join("us-west").exists());
        assert!(store.root().is_dir());
        assert!(names(&store).is_empty());
    }

    #[test]
    fn delete_keeps_parent_with_siblings() {
        let (_dir, store) = store();
        store.create(&name("us-west/staging"), &spec("https://1")).unwrap();
        store.create(&name("us-west/prod"), &spec("https://2")).unwrap();
        store.delete(&name("us-west/staging")).unwrap();

        assert!(store.root().join("us-west").is_dir());
        assert_eq!(names(&store), vec!["us-west/prod"]);
    }

    #[test]
    fn delete_missing() {
        let (_dir, store) = store();
        let err = store.delete(&name("ghost")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_intermediate_is_not_found() {
        let (_dir, store) = store();
        store.create(&name("a/b"), &spec("https://1")).unwrap();
        assert!(store.delete(&name("a")).unwrap_err().is_not_found());
        assert!(store.exists(&name("a/b")));
    }

    #[test]
    fn rename_moves_metadata_and_prunes() {
        let (_dir, store) = store();
        store.create(&name("a/b"), &spec("https://1")).unwrap();
        let artifact = store.env_dir(&name("a/b")).join(".metadata").join("swagger.json");
        fs::write(&artifact, "{}").unwrap();

        store.rename(&name("a/b"), &name("c")).unwrap();

        assert_eq!(names(&store), vec!["c"]);
        assert!(!store.root().join("a").exists());
        assert!(store.root().join("c").join(".metadata").join("swagger.json").is_file());
        assert_eq!(store.get(&name("c")).unwrap().uri, "https://1");
    }

    #[test]
    fn rename_keeps_old_parent_with_siblings() {
        let (_dir, store) = store();
        store.create(&name("a/b"), &spec("https://1")).unwrap();
        store.create(&name("a/c"), &spec("https://2")).unwrap();
        store.rename(&name("a/b"), &name("d/e/f")).unwrap();
        assert_eq!(names(&store), vec!["a/c", "d/e/f"]);
    }

    #[test]
    fn rename_over_leftover_directory() {
        let (_dir, store) = store();
        store.create(&name("src"), &spec("https://1")).unwrap();
        fs::create_dir_all(store.root().join("dst").join("stale").join("deeper")).unwrap();

        store.rename(&name("src"), &name("dst")).unwrap();

        assert_eq!(names(&store), vec!["dst"]);
        assert_eq!(
            tree(store.root()),
            vec!["dst/", "dst/.metadata/", "dst/spec.json"]
        );
    }

    #[test]
    fn rename_move_failure_keeps_source() {
        let (_dir, store) = store();
        store.create(&name("a"), &spec("https://1")).unwrap();
        let before = tree(store.root());

        let broken = faulty(
            &store,
            Faults {
                move_dir: true,
                ..Faults::default()
            },
        );
        let err = broken.rename(&name("a"), &name("x/y/z")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        assert_eq!(tree(store.root()), before);
        assert_eq!(store.get(&name("a")).unwrap().uri, "https://1");
    }

    #[test]
    fn delete_stops_pruning_at_failing_directory() {
        let (_dir, store) = store();
        store.create(&name("a/b/c"), &spec("https://1")).unwrap();

        let broken = faulty(
            &store,
            Faults {
                remove_dir: Some(store.root().join("a")),
                ..Faults::default()
            },
        );
        broken.delete(&name("a/b/c")).unwrap();

        assert_eq!(tree(store.root()), vec!["a/"]);
        assert!(names(&store).is_empty());

        // The leftover does not block the name
        store.create(&name("a"), &spec("https://2")).unwrap();
        assert_eq!(names(&store), vec!["a"]);
    }

    #[test]
    fn rename_stops_pruning_at_failing_directory() {
        let (_dir, store) = store();
        store.create(&name("a/b/c"), &spec("https://1")).unwrap();

        let broken = faulty(
            &store,
            Faults {
                remove_dir: Some(store.root().join("a").join("b")),
                ..Faults::default()
            },
        );
        broken.rename(&name("a/b/c"), &name("d")).unwrap();

        assert_eq!(
            tree(store.root()),
            vec!["a/", "a/b/", "d/", "d/.metadata/", "d/spec.json"]
        );
        assert_eq!(names(&store), vec!["d"]);
    }

    #[test]
    fn rename_conflicts() {
        let (_dir, store) = store();
        store.create(&name("a"), &spec("https://1")).unwrap();
        store.create(&name("b/c"), &spec("https://2")).unwrap();

        assert!(store.rename(&name("ghost"), &name("x")).unwrap_err().is_not_found());
        assert!(store.rename(&name("a"), &name("b/c")).unwrap_err().is_duplicate());
        // Into its own subtree
        assert!(store.rename(&name("a"), &name("a/x")).unwrap_err().is_duplicate());
        // Onto an intermediate directory
        assert!(store.rename(&name("a"), &name("b")).unwrap_err().is_duplicate());

        assert_eq!(names(&store), vec!["a", "b/c"]);
    }

    #[test]
    fn update_spec_replaces_fields() {
        let (_dir, store) = store();
        let n = name("prod");
        store.create(&n, &spec("https://1")).unwrap();

        store
            .update_spec(&n, &|s| s.with_namespace("prod"))
            .unwrap();
        assert_eq!(
            store.get(&n).unwrap(),
            EnvironmentSpec::new("https://1", "prod", "version:v1.7.0")
        );

        // No temporary files left next to the spec
        let leftovers: Vec<_> = fs::read_dir(store.env_dir(&n))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|f| f != "spec.json" && f != ".metadata")
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn update_spec_rejects_empty_uri() {
        let (_dir, store) = store();
        let n = name("prod");
        store.create(&n, &spec("https://1")).unwrap();
        let err = store.update_spec(&n, &|s| s.with_uri("")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSpec { .. }));
        assert_eq!(store.get(&n).unwrap().uri, "https://1");
    }

    #[test]
    fn update_spec_missing() {
        let (_dir, store) = store();
        let err = store.update_spec(&name("nope"), &|s| s).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn list_is_sorted_and_skips_hidden_entries() {
        let (_dir, store) = store();
        for raw in ["b", "a/z", "a-b", "a/a"] {
            store.create(&name(raw), &spec("https://x")).unwrap();
        }
        fs::create_dir_all(store.root().join(".cache").join("junk")).unwrap();
        fs::write(store.root().join("README"), "not an environment").unwrap();

        assert_eq!(names(&store), vec!["a-b", "a/a", "a/z", "b"]);
    }

    #[test]
    fn list_without_root_is_empty() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_reports_malformed_spec() {
        let (_dir, store) = store();
        store.create(&name("bad"), &spec("https://x")).unwrap();
        fs::write(store.spec_path(&name("bad")), "{not json").unwrap();
        let err = store.list().unwrap_err();
        assert!(matches!(err, StoreError::MalformedSpec { .. }));
    }

    #[test]
    fn lock_creates_lock_file_outside_tree() {
        let (dir, store) = store();
        let guard = store.lock().unwrap();
        assert!(guard.is_held());
        assert!(dir.path().join(".envreg.lock").is_file());
        drop(guard);
        assert!(names(&store).is_empty());
    }
}

//! Whole-tree exclusive lock
//!
//! Provides [`TreeLock`], an RAII guard over an `fs2` advisory lock.

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive lock over an environment tree
///
/// Released when dropped, on every exit path.
#[derive(Debug)]
pub struct TreeLock {
    held: Option<(File, PathBuf)>,
}

impl TreeLock {
    /// Lock that guards nothing, for stores without shared state on disk
    #[inline]
    #[must_use]
    pub fn noop() -> Self {
        Self { held: None }
    }

    /// Block until the lock file at `path` is exclusively locked
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the file cannot be opened or locked.
    pub fn acquire(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;

        FileExt::lock_exclusive(&file).map_err(|e| StoreError::io(path, e))?;
        tracing::debug!("Acquired tree lock {}", path.display());

        Ok(Self {
            held: Some((file, path.to_path_buf())),
        })
    }

    /// Whether a real lock is held
    #[inline]
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }
}

impl Drop for TreeLock {
    fn drop(&mut self) {
        if let Some((file, path)) = self.held.take() {
            match FileExt::unlock(&file) {
                Ok(()) => tracing::debug!("Released tree lock {}", path.display()),
                Err(e) => tracing::warn!("Failed to release tree lock {}: {}", path.display(), e),
            }
        }
    }
}

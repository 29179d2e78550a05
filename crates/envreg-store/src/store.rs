//! The environment store contract
//!
//! Provides [`EnvironmentStore`], implemented by the filesystem and
//! in-memory stores.

use crate::error::StoreResult;
use crate::lock::TreeLock;
use crate::spec::EnvironmentSpec;
use envreg_name::EnvironmentName;

/// Field changes applied by [`EnvironmentStore::update_spec`]
pub type SpecMutation<'a> = &'a dyn Fn(EnvironmentSpec) -> EnvironmentSpec;

/// Tree of environments keyed by name
///
/// # Invariants
/// - names are unique; a leaf never hosts descendants
/// - intermediate nodes exist only above at least one leaf once a
///   `delete` or `rename` has pruned them
/// - a failed `create` or `rename` leaves no node it created behind
pub trait EnvironmentStore {
    /// True iff a leaf with a persisted spec exists at exactly this name
    fn exists(&self, name: &EnvironmentName) -> bool;

    /// Read the spec of an existing environment
    ///
    /// # Errors
    /// [`StoreError::NotFound`](crate::StoreError::NotFound) if absent.
    fn get(&self, name: &EnvironmentName) -> StoreResult<EnvironmentSpec>;

    /// Create a new environment
    ///
    /// # Errors
    /// [`StoreError::Duplicate`](crate::StoreError::Duplicate) if the name
    /// exists, crosses an existing leaf, or already hosts descendants.
    fn create(&self, name: &EnvironmentName, spec: &EnvironmentSpec) -> StoreResult<()>;

    /// Delete an environment and prune ancestors left empty
    ///
    /// # Errors
    /// [`StoreError::NotFound`](crate::StoreError::NotFound) if absent.
    fn delete(&self, name: &EnvironmentName) -> StoreResult<()>;

    /// Move an environment, with everything below it, to a new name
    ///
    /// # Errors
    /// `NotFound` if `old` is absent, `Duplicate` if `new` is taken under
    /// the same rules as [`create`](Self::create).
    fn rename(&self, old: &EnvironmentName, new: &EnvironmentName) -> StoreResult<()>;

    /// Replace the spec of an environment with `mutate(current)`
    ///
    /// # Errors
    /// `NotFound` if absent, `InvalidSpec` if the result is not persistable.
    fn update_spec(&self, name: &EnvironmentName, mutate: SpecMutation<'_>) -> StoreResult<()>;

    /// Snapshot of every environment, ordered by canonical name
    fn list(&self) -> StoreResult<Vec<(EnvironmentName, EnvironmentSpec)>>;

    /// Take the whole-tree exclusive lock for one operation
    fn lock(&self) -> StoreResult<TreeLock>;
}

impl<T: EnvironmentStore + ?Sized> EnvironmentStore for &T {
    fn exists(&self, name: &EnvironmentName) -> bool {
        (**self).exists(name)
    }

    fn get(&self, name: &EnvironmentName) -> StoreResult<EnvironmentSpec> {
        (**self).get(name)
    }

    fn create(&self, name: &EnvironmentName, spec: &EnvironmentSpec) -> StoreResult<()> {
        (**self).create(name, spec)
    }

    fn delete(&self, name: &EnvironmentName) -> StoreResult<()> {
        (**self).delete(name)
    }

    fn rename(&self, old: &EnvironmentName, new: &EnvironmentName) -> StoreResult<()> {
        (**self).rename(old, new)
    }

    fn update_spec(&self, name: &EnvironmentName, mutate: SpecMutation<'_>) -> StoreResult<()> {
        (**self).update_spec(name, mutate)
    }

    fn list(&self) -> StoreResult<Vec<(EnvironmentName, EnvironmentSpec)>> {
        (**self).list()
    }

    fn lock(&self) -> StoreResult<TreeLock> {
        (**self).lock()
    }
}

impl<T: EnvironmentStore + ?Sized> EnvironmentStore for Box<T> {
    fn exists(&self, name: &EnvironmentName) -> bool {
        (**self).exists(name)
    }

    fn get(&self, name: &EnvironmentName) -> StoreResult<EnvironmentSpec> {
        (**self).get(name)
    }

    fn create(&self, name: &EnvironmentName, spec: &EnvironmentSpec) -> StoreResult<()> {
        (**self).create(name, spec)
    }

    fn delete(&self, name: &EnvironmentName) -> StoreResult<()> {
        (**self).delete(name)
    }

    fn rename(&self, old: &EnvironmentName, new: &EnvironmentName) -> StoreResult<()> {
        (**self).rename(old, new)
    }

    fn update_spec(&self, name: &EnvironmentName, mutate: SpecMutation<'_>) -> StoreResult<()> {
        (**self).update_spec(name, mutate)
    }

    fn list(&self) -> StoreResult<Vec<(EnvironmentName, EnvironmentSpec)>> {
        (**self).list()
    }

    fn lock(&self) -> StoreResult<TreeLock> {
        (**self).lock()
    }
}

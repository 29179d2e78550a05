//! In-memory environment store
//!
//! Provides [`MemoryEnvironmentStore`], an arena of nodes keyed by segment
//! with parent back-references. Freed slots are reused. Semantics match
//! [`FsEnvironmentStore`](crate::FsEnvironmentStore), including pruning of
//! intermediate nodes left without descendants.

use crate::error::{StoreError, StoreResult};
use crate::lock::TreeLock;
use crate::spec::EnvironmentSpec;
use crate::store::{EnvironmentStore, SpecMutation};
use envreg_name::EnvironmentName;
use parking_lot::RwLock;
use std::collections::BTreeMap;

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
struct Node {
    segment: String,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    spec: Option<EnvironmentSpec>,
}

impl Node {
    fn new(segment: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            segment: segment.into(),
            parent,
            children: BTreeMap::new(),
            spec: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Arena {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
}

impl Arena {
    fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new("", None))],
            free: Vec::new(),
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn child(&self, id: NodeId, segment: &str) -> Option<NodeId> {
        self.node(id)?.children.get(segment).copied()
    }

    fn find(&self, segments: &[String]) -> Option<NodeId> {
        segments
            .iter()
            .try_fold(ROOT, |id, seg| self.child(id, seg))
    }

    fn find_leaf(&self, name: &EnvironmentName) -> Option<NodeId> {
        self.find(name.segments())
            .filter(|&id| self.node(id).is_some_and(|n| n.spec.is_some()))
    }

    /// Walk to `segments`, creating missing nodes
    fn ensure_path(&mut self, segments: &[String]) -> NodeId {
        let mut id = ROOT;
        for seg in segments {
            id = match self.child(id, seg) {
                Some(next) => next,
                None => {
                    let next = self.alloc(Node::new(seg.clone(), Some(id)));
                    if let Some(parent) = self.node_mut(id) {
                        parent.children.insert(seg.clone(), next);
                    }
                    next
                }
            };
        }
        id
    }

    /// Unlink a node from its parent, keeping the subtree allocated
    fn detach(&mut self, id: NodeId) {
        let link = self.node(id).and_then(|n| Some((n.parent?, n.segment.clone())));
        if let Some((parent, segment)) = link {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.remove(&segment);
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Detach and free a node and everything below it
    fn remove_subtree(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next).and_then(Option::take) {
                stack.extend(node.children.into_values());
                self.free.push(next);
            }
        }
    }

    /// Free empty intermediate nodes from `start` upwards, excluding the root
    fn prune(&mut self, start: NodeId) {
        let mut id = start;
        while id != ROOT {
            let Some(node) = self.node(id) else { break };
            if node.spec.is_some() || !node.children.is_empty() {
                break;
            }
            let parent = node.parent;
            self.remove_subtree(id);
            tracing::debug!("Pruned empty node {}", id);
            match parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
    }

    fn collect(
        &self,
        id: NodeId,
        prefix: &mut Vec<String>,
        out: &mut Vec<(EnvironmentName, EnvironmentSpec)>,
    ) {
        let Some(node) = self.node(id) else { return };
        if let Some(spec) = &node.spec {
            if let Ok(name) = EnvironmentName::from_segments(prefix.iter().cloned()) {
                out.push((name, spec.clone()));
            }
            return;
        }
        for (segment, &child) in &node.children {
            prefix.push(segment.clone());
            self.collect(child, prefix, out);
            prefix.pop();
        }
    }

    fn check_vacant(&self, name: &EnvironmentName) -> StoreResult<()> {
        let mut id = ROOT;
        for (depth, seg) in name.segments().iter().enumerate() {
            let Some(next) = self.child(id, seg) else {
                return Ok(());
            };
            id = next;
            let is_last = depth + 1 == name.depth();
            if !is_last && self.node(id).is_some_and(|n| n.spec.is_some()) {
                let conflict = name.segments()[..=depth].join("/");
                return Err(StoreError::duplicate(name, conflict));
            }
        }

        let Some(node) = self.node(id) else {
            return Ok(());
        };
        if node.spec.is_some() {
            return Err(StoreError::duplicate(name, name));
        }
        if !node.children.is_empty() {
            let mut prefix = name.segments().to_vec();
            let mut found = Vec::new();
            self.collect(id, &mut prefix, &mut found);
            let conflict = found
                .first()
                .map(|(n, _)| n.to_string())
                .unwrap_or_else(|| name.to_string());
            return Err(StoreError::duplicate(name, conflict));
        }
        Ok(())
    }

    fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }
}

/// Environment store held entirely in memory
#[derive(Debug)]
pub struct MemoryEnvironmentStore {
    arena: RwLock<Arena>,
}

impl MemoryEnvironmentStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(Arena::new()),
        }
    }

    /// Number of live nodes, including the root
    ///
    /// Intermediate nodes count, so this exposes whether pruning happened.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.read().live_nodes()
    }
}

impl Default for MemoryEnvironmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryEnvironmentStore {
    fn clone(&self) -> Self {
        Self {
            arena: RwLock::new(self.arena.read().clone()),
        }
    }
}

impl EnvironmentStore for MemoryEnvironmentStore {
    fn exists(&self, name: &EnvironmentName) -> bool {
        self.arena.read().find_leaf(name).is_some()
    }

    fn get(&self, name: &EnvironmentName) -> StoreResult<EnvironmentSpec> {
        let arena = self.arena.read();
        arena
            .find_leaf(name)
            .and_then(|id| arena.node(id))
            .and_then(|n| n.spec.clone())
            .ok_or_else(|| StoreError::not_found(name))
    }

    fn create(&self, name: &EnvironmentName, spec: &EnvironmentSpec) -> StoreResult<()> {
        spec.validate()
            .map_err(|reason| StoreError::invalid_spec(name, reason))?;

        let mut arena = self.arena.write();
        arena.check_vacant(name)?;

        let id = arena.ensure_path(name.segments());
        if let Some(node) = arena.node_mut(id) {
            node.spec = Some(spec.clone());
        }
        tracing::info!("Created environment '{}' in memory", name);
        Ok(())
    }

    fn delete(&self, name: &EnvironmentName) -> StoreResult<()> {
        let mut arena = self.arena.write();
        let id = arena
            .find_leaf(name)
            .ok_or_else(|| StoreError::not_found(name))?;

        let parent = arena.node(id).and_then(|n| n.parent);
        arena.remove_subtree(id);
        if let Some(parent) = parent {
            arena.prune(parent);
        }
        tracing::info!("Deleted environment '{}' from memory", name);
        Ok(())
    }

    fn rename(&self, old: &EnvironmentName, new: &EnvironmentName) -> StoreResult<()> {
        let mut arena = self.arena.write();
        let id = arena
            .find_leaf(old)
            .ok_or_else(|| StoreError::not_found(old))?;
        arena.check_vacant(new)?;

        let old_parent = arena.node(id).and_then(|n| n.parent);
        let parent_segments = &new.segments()[..new.depth() - 1];
        let new_parent = arena.ensure_path(parent_segments);

        // A stale empty node at the destination is replaced
        if let Some(stale) = arena.child(new_parent, new.last()) {
            arena.remove_subtree(stale);
        }

        arena.detach(id);
        if let Some(node) = arena.node_mut(id) {
            node.segment = new.last().to_string();
            node.parent = Some(new_parent);
        }
        if let Some(parent) = arena.node_mut(new_parent) {
            parent.children.insert(new.last().to_string(), id);
        }

        if let Some(parent) = old_parent {
            arena.prune(parent);
        }
        tracing::info!("Renamed environment '{}' to '{}' in memory", old, new);
        Ok(())
    }

    fn update_spec(&self, name: &EnvironmentName, mutate: SpecMutation<'_>) -> StoreResult<()> {
        let mut arena = self.arena.write();
        let id = arena
            .find_leaf(name)
            .ok_or_else(|| StoreError::not_found(name))?;

        let current = arena
            .node(id)
            .and_then(|n| n.spec.clone())
            .ok_or_else(|| StoreError::not_found(name))?;
        let updated = mutate(current);
        updated
            .validate()
            .map_err(|reason| StoreError::invalid_spec(name, reason))?;

        if let Some(node) = arena.node_mut(id) {
            node.spec = Some(updated);
        }
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<(EnvironmentName, EnvironmentSpec)>> {
        let arena = self.arena.read();
        let mut out = Vec::new();
        arena.collect(ROOT, &mut Vec::new(), &mut out);
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn lock(&self) -> StoreResult<TreeLock> {
        Ok(TreeLock::noop())
    }
}

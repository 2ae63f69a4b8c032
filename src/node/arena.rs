use std::collections::TryReserveError;

use bytes::Bytes;
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::debug;

use super::node::{Node, NodeId, NodeKind};
use crate::path;

/// Owns every node of a tree and hands out [`NodeId`] handles.
///
/// Freed slots are recycled, so a handle is only meaningful until the node
/// behind it is destroyed.
#[derive(Debug, Default, Clone)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    vacant: Vec<usize>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a directory one segment below `parent`.
    ///
    /// The parent link is recorded on the new node but the parent's children
    /// are left untouched; [`NodeArena::link_child`] does that.
    pub fn create_directory(
        &mut self,
        segment: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId, NodeError> {
        let parent_path = match parent {
            Some(id) => Some(self.get(id).context(StaleHandleSnafu { id })?.path()),
            None => None,
        };
        let full_path = path::join(parent_path, segment).context(MemorySnafu)?;
        self.allocate(Node::directory(full_path, parent))
    }

    /// Creates a detached file at its final path.
    pub fn create_file(
        &mut self,
        path: String,
        contents: Option<Bytes>,
        length: usize,
    ) -> Result<NodeId, NodeError> {
        self.allocate(Node::file(path, contents, length))
    }

    fn allocate(&mut self, node: Node) -> Result<NodeId, NodeError> {
        if let Some(index) = self.vacant.pop() {
            self.slots[index] = Some(node);
            return Ok(NodeId(index));
        }

        self.slots.try_reserve(1).context(MemorySnafu)?;
        self.slots.push(Some(node));
        Ok(NodeId(self.slots.len() - 1))
    }

    /// Frees the subtree rooted at `id` and returns how many nodes were freed.
    ///
    /// The former parent's child list is not touched, so callers unlink first.
    pub fn destroy(&mut self, id: NodeId) -> usize {
        let mut freed = 0;
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            let Some(node) = self.slots.get_mut(current.0).and_then(Option::take) else {
                continue;
            };
            if let NodeKind::Directory { children } = node.kind {
                pending.extend(children);
            }
            self.vacant.push(current.0);
            freed += 1;
        }

        debug!("Destroyed {} node(s) rooted at {}", freed, id);
        freed
    }

    /// Looks up the child of `parent` whose path is exactly `path`.
    pub fn find_child(&self, parent: NodeId, path: &str) -> Option<NodeId> {
        let children = self.get(parent)?.children();
        self.search_children(children, path)
            .ok()
            .map(|index| children[index])
    }

    fn search_children(&self, children: &[NodeId], path: &str) -> Result<usize, usize> {
        children.binary_search_by(|child| {
            let child_path = self.get(*child).map(Node::path).unwrap_or_default();
            child_path.as_bytes().cmp(path.as_bytes())
        })
    }

    /// Hangs `child` under `parent` at its sorted position.
    pub fn link_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let parent_node = self.get(parent).context(StaleHandleSnafu { id: parent })?;
        let child_node = self.get(child).context(StaleHandleSnafu { id: child })?;

        let mismatch = || ParentChildMismatchSnafu {
            parent: parent_node.path(),
            child: child_node.path(),
        };

        let NodeKind::Directory { children } = &parent_node.kind else {
            return mismatch().fail();
        };

        let one_segment_below = child_node
            .path()
            .strip_prefix(parent_node.path())
            .and_then(|rest| rest.strip_prefix(path::SEPARATOR))
            .is_some_and(|segment| !segment.is_empty() && !segment.contains(path::SEPARATOR));
        ensure!(one_segment_below, mismatch());
        ensure!(
            child_node.parent.is_none_or(|current| current == parent),
            mismatch()
        );

        let position = match self.search_children(children, child_node.path()) {
            Ok(_) => {
                return AlreadyInTreeSnafu {
                    parent: parent_node.path(),
                    child: child_node.path(),
                }
                .fail();
            }
            Err(position) => position,
        };

        if let Some(Node {
            kind: NodeKind::Directory { children },
            ..
        }) = self.get_mut(parent)
        {
            children.try_reserve(1).context(MemorySnafu)?;
            children.insert(position, child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }

        Ok(())
    }

    /// Removes `child` from the children of `parent` without destroying it.
    pub fn unlink_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let parent_node = self.get(parent).context(StaleHandleSnafu { id: parent })?;
        let child_node = self.get(child).context(StaleHandleSnafu { id: child })?;

        let position = self
            .search_children(parent_node.children(), child_node.path())
            .ok()
            .filter(|index| parent_node.children()[*index] == child)
            .context(NotFoundSnafu {
                parent: parent_node.path(),
                child: child_node.path(),
            })?;

        if let Some(Node {
            kind: NodeKind::Directory { children },
            ..
        }) = self.get_mut(parent)
        {
            children.remove(position);
        }

        Ok(())
    }

    /// Appends a child handle with no checks and no parent update, for building
    /// corrupt trees in tests.
    #[cfg(test)]
    pub(crate) fn push_child_unchecked(&mut self, parent: NodeId, child: NodeId) {
        if let Some(Node {
            kind: NodeKind::Directory { children },
            ..
        }) = self.get_mut(parent)
        {
            children.push(child);
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NodeError {
    #[snafu(display("'{}' already holds a child at '{}'", parent, child))]
    AlreadyInTree { parent: String, child: String },
    #[snafu(display("'{}' cannot be linked as a child of '{}'", child, parent))]
    ParentChildMismatch { parent: String, child: String },
    #[snafu(display("'{}' is not a child of '{}'", child, parent))]
    NotFound { parent: String, child: String },
    #[snafu(display("No node behind handle {}", id))]
    StaleHandle { id: NodeId },
    #[snafu(display("Failed to allocate memory for a node"))]
    MemoryError { source: TryReserveError },
}

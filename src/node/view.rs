use bytes::Bytes;

use super::arena::NodeArena;
use super::node::{EntryKind, Node, NodeId};

/// Read-only handle to a node together with the arena it lives in.
///
/// Observers such as the validator walk the tree through this type instead of
/// reaching into the store's bookkeeping.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    arena: &'a NodeArena,
    id: NodeId,
    node: &'a Node,
}

impl<'a> NodeRef<'a> {
    pub fn new(arena: &'a NodeArena, id: NodeId) -> Option<Self> {
        let node = arena.get(id)?;
        Some(Self { arena, id, node })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn path(&self) -> &'a str {
        self.node.path()
    }

    pub fn kind(&self) -> EntryKind {
        self.node.entry_kind()
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.node.parent()
    }

    /// The parent node, or `None` for a root or a dangling parent handle.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        NodeRef::new(self.arena, self.node.parent()?)
    }

    pub fn num_children(&self) -> usize {
        self.node.children().len()
    }

    pub fn child_id(&self, index: usize) -> Option<NodeId> {
        self.node.children().get(index).copied()
    }

    /// The child at `index` in sorted order, `None` if out of range or dangling.
    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        NodeRef::new(self.arena, self.child_id(index)?)
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let arena = self.arena;
        self.node
            .children()
            .iter()
            .filter_map(move |id| NodeRef::new(arena, *id))
    }

    pub fn contents(&self) -> Option<&'a Bytes> {
        self.node.contents()
    }

    pub fn length(&self) -> Option<usize> {
        self.node.length()
    }
}

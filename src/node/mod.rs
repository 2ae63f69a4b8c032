//! Tree nodes and the arena that owns them.
//!
//! A node is either a directory holding a sorted list of child handles or a
//! file holding an opaque content handle and a length. Nodes never own each
//! other directly: the arena owns every node and a directory's child list is
//! the only owning edge. Parent links are plain handles.

mod arena;
mod node;
mod view;

pub use arena::{NodeArena, NodeError};
pub use node::{EntryKind, Node, NodeId, NodeKind};
pub use view::NodeRef;

use std::cmp::Ordering;

use bytes::Bytes;
use derive_more::Display;

/// Handle to a node slot inside a [`NodeArena`](super::NodeArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("#{_0}")]
pub struct NodeId(pub(super) usize);

/// Kind of a node without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EntryKind {
    #[display("directory")]
    Directory,
    #[display("file")]
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Children sorted by path. Files and sub-directories share one namespace.
    Directory { children: Vec<NodeId> },
    /// `length` is caller-supplied metadata and is never checked against `contents`.
    File {
        contents: Option<Bytes>,
        length: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(super) path: String,
    pub(super) parent: Option<NodeId>,
    pub(super) kind: NodeKind,
}

impl Node {
    pub(super) fn directory(path: String, parent: Option<NodeId>) -> Self {
        Self {
            path,
            parent,
            kind: NodeKind::Directory {
                children: Vec::new(),
            },
        }
    }

    pub(super) fn file(path: String, contents: Option<Bytes>, length: usize) -> Self {
        Self {
            path,
            parent: None,
            kind: NodeKind::File { contents, length },
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn entry_kind(&self) -> EntryKind {
        match self.kind {
            NodeKind::Directory { .. } => EntryKind::Directory,
            NodeKind::File { .. } => EntryKind::File,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Child handles in sorted order. Always empty for files.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    pub fn contents(&self) -> Option<&Bytes> {
        match &self.kind {
            NodeKind::File { contents, .. } => contents.as_ref(),
            NodeKind::Directory { .. } => None,
        }
    }

    /// Stored length of a file, `None` for directories.
    pub fn length(&self) -> Option<usize> {
        match self.kind {
            NodeKind::File { length, .. } => Some(length),
            NodeKind::Directory { .. } => None,
        }
    }

    /// Swaps in new contents and length, handing back the previous contents.
    ///
    /// Returns `None` when the node is a directory; use [`Node::is_file`] to tell
    /// that apart from a file whose previous contents were absent.
    pub fn replace_contents(
        &mut self,
        new_contents: Option<Bytes>,
        new_length: usize,
    ) -> Option<Option<Bytes>> {
        match &mut self.kind {
            NodeKind::File { contents, length } => {
                *length = new_length;
                Some(std::mem::replace(contents, new_contents))
            }
            NodeKind::Directory { .. } => None,
        }
    }

    /// Byte-wise path order. Equal paths order files before directories.
    pub fn compare(&self, other: &Node) -> Ordering {
        self.path
            .as_bytes()
            .cmp(other.path.as_bytes())
            .then_with(|| match (self.entry_kind(), other.entry_kind()) {
                (EntryKind::File, EntryKind::Directory) => Ordering::Less,
                (EntryKind::Directory, EntryKind::File) => Ordering::Greater,
                _ => Ordering::Equal,
            })
    }
}

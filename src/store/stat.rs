use derive_more::Display;

use crate::node::EntryKind;

/// What [`Store::stat`](super::Store::stat) reports for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stat {
    #[display("directory")]
    Directory,
    #[display("file:{length}")]
    File { length: usize },
}

impl Stat {
    pub fn kind(&self) -> EntryKind {
        match self {
            Stat::Directory => EntryKind::Directory,
            Stat::File { .. } => EntryKind::File,
        }
    }

    pub fn length(&self) -> Option<usize> {
        match self {
            Stat::Directory => None,
            Stat::File { length } => Some(*length),
        }
    }
}

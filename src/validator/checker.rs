use std::collections::HashSet;

use snafu::Snafu;
use tracing::error;

use crate::node::{EntryKind, NodeId, NodeRef};
use crate::store::Store;

/// Checks the invariants local to one node: a non-empty path, exactly one
/// segment below its parent, and strictly sorted children.
pub fn check_node(node: NodeRef<'_>) -> Result<(), Violation> {
    let own = node.path();
    if own.is_empty() {
        return Err(Violation::EmptyPath { id: node.id() });
    }

    if let Some(parent_id) = node.parent_id() {
        let Some(parent) = node.parent() else {
            return Err(Violation::DanglingParent {
                path: own.to_string(),
                parent: parent_id,
            });
        };
        let parent_path = parent.path();

        let own_bytes = own.as_bytes();
        let parent_bytes = parent_path.as_bytes();
        let shares_prefix = own_bytes.len() > parent_bytes.len() + 1
            && &own_bytes[..parent_bytes.len()] == parent_bytes
            && own_bytes[parent_bytes.len()] == b'/';
        if !shares_prefix {
            return Err(Violation::ParentNotPrefix {
                parent: parent_path.to_string(),
                child: own.to_string(),
            });
        }
        if own_bytes[parent_bytes.len() + 1..].contains(&b'/') {
            return Err(Violation::NotOneSegmentBelow {
                parent: parent_path.to_string(),
                child: own.to_string(),
            });
        }
    }

    if node.kind() == EntryKind::File && node.num_children() > 0 {
        return Err(Violation::FileWithChildren {
            path: own.to_string(),
        });
    }

    let mut previous: Option<&str> = None;
    for index in 0..node.num_children() {
        let Some(child) = node.child(index) else {
            return Err(Violation::DanglingChild {
                parent: own.to_string(),
                index,
            });
        };
        if let Some(previous) = previous {
            if previous >= child.path() {
                return Err(Violation::ChildrenNotSorted {
                    parent: own.to_string(),
                    previous: previous.to_string(),
                    current: child.path().to_string(),
                });
            }
        }
        previous = Some(child.path());
    }

    Ok(())
}

/// Checks the whole tree: lifecycle consistency, a parentless root, every
/// node via [`check_node`], back-links from children, and the node count.
///
/// Walks in pre-order and stops at the first violation.
pub fn check_tree(
    initialized: bool,
    root: Option<NodeRef<'_>>,
    reported_count: usize,
) -> Result<(), Violation> {
    if !initialized {
        if reported_count != 0 {
            return Err(Violation::CountWhileUninitialized {
                count: reported_count,
            });
        }
        if let Some(root) = root {
            return Err(Violation::RootWhileUninitialized {
                root: root.path().to_string(),
            });
        }
    }

    if let Some(root) = root {
        if root.parent_id().is_some() {
            return Err(Violation::RootHasParent {
                root: root.path().to_string(),
            });
        }
    }

    let mut visited = 0;
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut stack: Vec<NodeRef<'_>> = root.into_iter().collect();

    while let Some(node) = stack.pop() {
        if !seen.insert(node.id()) {
            return Err(Violation::Cycle {
                path: node.path().to_string(),
            });
        }
        visited += 1;
        check_node(node)?;

        let mut children = Vec::with_capacity(node.num_children());
        for index in 0..node.num_children() {
            let Some(child) = node.child(index) else {
                return Err(Violation::DanglingChild {
                    parent: node.path().to_string(),
                    index,
                });
            };
            if child.parent_id() != Some(node.id()) {
                return Err(Violation::ParentLinkMismatch {
                    parent: node.path().to_string(),
                    child: child.path().to_string(),
                });
            }
            children.push(child);
        }
        stack.extend(children.into_iter().rev());
    }

    if visited != reported_count {
        return Err(Violation::CountMismatch {
            reported: reported_count,
            actual: visited,
        });
    }

    Ok(())
}

pub fn check_store(store: &Store) -> Result<(), Violation> {
    check_tree(store.is_initialized(), store.root(), store.count())
}

pub fn is_node_valid(node: NodeRef<'_>) -> bool {
    report(check_node(node))
}

pub fn is_tree_valid(initialized: bool, root: Option<NodeRef<'_>>, reported_count: usize) -> bool {
    report(check_tree(initialized, root, reported_count))
}

pub fn is_store_valid(store: &Store) -> bool {
    report(check_store(store))
}

fn report(verdict: Result<(), Violation>) -> bool {
    match verdict {
        Ok(()) => true,
        Err(violation) => {
            error!("Tree invariant violated: {}", violation);
            false
        }
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum Violation {
    #[snafu(display("Node {} has an empty path", id))]
    EmptyPath { id: NodeId },
    #[snafu(display("Parent {} of '{}' does not exist", parent, path))]
    DanglingParent { path: String, parent: NodeId },
    #[snafu(display("'{}' is not a prefix of its child '{}'", parent, child))]
    ParentNotPrefix { parent: String, child: String },
    #[snafu(display("'{}' is more than one segment below its parent '{}'", child, parent))]
    NotOneSegmentBelow { parent: String, child: String },
    #[snafu(display("File '{}' has children", path))]
    FileWithChildren { path: String },
    #[snafu(display("Child {} of '{}' does not exist", index, parent))]
    DanglingChild { parent: String, index: usize },
    #[snafu(display(
        "Children of '{}' are not in sorted order: '{}' before '{}'",
        parent,
        previous,
        current
    ))]
    ChildrenNotSorted {
        parent: String,
        previous: String,
        current: String,
    },
    #[snafu(display("'{}' is listed under '{}' but points at another parent", child, parent))]
    ParentLinkMismatch { parent: String, child: String },
    #[snafu(display("'{}' is reachable more than once", path))]
    Cycle { path: String },
    #[snafu(display("Not initialized, but count is {}", count))]
    CountWhileUninitialized { count: usize },
    #[snafu(display("Not initialized, but root '{}' is present", root))]
    RootWhileUninitialized { root: String },
    #[snafu(display("Root '{}' has a parent", root))]
    RootHasParent { root: String },
    #[snafu(display("Count is {} but {} node(s) are reachable", reported, actual))]
    CountMismatch { reported: usize, actual: usize },
}

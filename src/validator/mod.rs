//! Independent invariant checker for a [`Store`](crate::store::Store).
//!
//! Nothing here reuses the store's path helpers or traversal: every invariant
//! is re-derived from the nodes themselves, so a bug in the mutation code
//! cannot hide behind the same bug in the checker.

mod checker;

pub use checker::{
    Violation, check_node, check_store, check_tree, is_node_valid, is_store_valid, is_tree_valid,
};

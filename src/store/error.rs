use std::collections::TryReserveError;

use snafu::Snafu;

use crate::node::NodeError;
use crate::path::PathError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum StoreError {
    #[snafu(display("Store is not initialized"))]
    NotInitialized,
    #[snafu(display("Store is already initialized"))]
    AlreadyInitialized,
    #[snafu(display("'{}' is already in the tree", path))]
    AlreadyInTree { path: String },
    #[snafu(display("'{}' does not lie under the root '{}'", path, root))]
    ConflictingPath { path: String, root: String },
    #[snafu(display("'{}' is not a directory", path))]
    NotADirectory { path: String },
    #[snafu(display("'{}' is not a file", path))]
    NotAFile { path: String },
    #[snafu(display("'{}' does not exist", path))]
    NoSuchPath { path: String },
    #[snafu(display("Failed to link the nodes of '{}'", path))]
    ParentChildError { path: String, source: NodeError },
    #[snafu(display("Ran out of memory while inserting '{}'", path))]
    MemoryError {
        path: String,
        source: TryReserveError,
    },
    #[snafu(display("Malformed path"))]
    InvalidPath { source: PathError },
}

impl StoreError {
    /// Stable snake_case label, used by the script runner to match expectations.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotInitialized => "not_initialized",
            StoreError::AlreadyInitialized => "already_initialized",
            StoreError::AlreadyInTree { .. } => "already_in_tree",
            StoreError::ConflictingPath { .. } => "conflicting_path",
            StoreError::NotADirectory { .. } => "not_a_directory",
            StoreError::NotAFile { .. } => "not_a_file",
            StoreError::NoSuchPath { .. } => "no_such_path",
            StoreError::ParentChildError { .. } => "parent_child_error",
            StoreError::MemoryError { .. } => "memory_error",
            StoreError::InvalidPath { .. } => "invalid_path",
        }
    }

    /// Splits a node-level failure into memory exhaustion and linkage errors.
    pub(super) fn from_node(path: &str, error: NodeError) -> Self {
        match error {
            NodeError::MemoryError { source } => StoreError::MemoryError {
                path: path.to_string(),
                source,
            },
            other => StoreError::ParentChildError {
                path: path.to_string(),
                source: other,
            },
        }
    }
}

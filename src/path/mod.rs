//! Slash-delimited path helpers shared by the node arena and the store.
//!
//! Paths are plain strings such as `a/b/c`. A normalized path has at least one
//! segment, no leading or trailing separator and no empty segments.

mod segments;

pub use segments::{PathError, depth, is_prefix_of, join, split_segments};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

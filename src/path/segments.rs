use std::collections::TryReserveError;

use snafu::{Snafu, ensure};

use super::SEPARATOR;

/// Splits a path into its segments, rejecting anything that is not normalized.
pub fn split_segments(path: &str) -> Result<Vec<&str>, PathError> {
    ensure!(!path.is_empty(), EmptyPathSnafu);

    let segments = path.split(SEPARATOR).collect::<Vec<_>>();
    if let Some(position) = segments.iter().position(|segment| segment.is_empty()) {
        return EmptySegmentSnafu { path, position }.fail();
    }

    Ok(segments)
}

/// True iff `candidate` equals `prefix` or lies somewhere below it.
///
/// `a/b` is a prefix of `a/b/c` but not of `a/bc`.
pub fn is_prefix_of(prefix: &str, candidate: &str) -> bool {
    match candidate.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Appends `segment` to `parent`, or returns the bare segment for a root.
///
/// The allocation is fallible so callers can report memory exhaustion
/// instead of aborting.
pub fn join(parent: Option<&str>, segment: &str) -> Result<String, TryReserveError> {
    let mut joined = String::new();
    match parent {
        Some(parent) => {
            joined.try_reserve_exact(parent.len() + SEPARATOR.len_utf8() + segment.len())?;
            joined.push_str(parent);
            joined.push(SEPARATOR);
        }
        None => joined.try_reserve_exact(segment.len())?,
    }
    joined.push_str(segment);
    Ok(joined)
}

/// Number of segments in a normalized path.
pub fn depth(path: &str) -> usize {
    path.matches(SEPARATOR).count() + 1
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum PathError {
    #[snafu(display("Path is empty"))]
    EmptyPath,
    #[snafu(display("Path '{}' has an empty segment at position {}", path, position))]
    EmptySegment { path: String, position: usize },
}

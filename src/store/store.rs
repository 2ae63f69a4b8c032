use bytes::Bytes;
use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, info};

use super::error::*;
use super::render::render_preorder;
use super::stat::Stat;
use crate::node::{EntryKind, NodeArena, NodeError, NodeId, NodeKind, NodeRef};
use crate::path;

/// What the last segment of an insertion becomes.
enum Leaf {
    Directory,
    File {
        contents: Option<Bytes>,
        length: usize,
    },
}

/// An in-memory hierarchy of directories and files addressed by path.
///
/// A fresh store is uninitialized; [`Store::init`] makes it live and
/// [`Store::destroy`] frees the tree and returns it to uninitialized.
#[derive(Debug, Default)]
pub struct Store {
    initialized: bool,
    arena: NodeArena,
    root: Option<NodeId>,
    count: usize,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) -> Result<(), StoreError> {
        ensure!(!self.initialized, AlreadyInitializedSnafu);

        self.initialized = true;
        self.root = None;
        self.count = 0;
        info!("Store initialized");
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<(), StoreError> {
        ensure!(self.initialized, NotInitializedSnafu);

        let freed = self
            .root
            .take()
            .map_or(0, |root| self.arena.destroy(root));
        self.arena = NodeArena::new();
        self.count = 0;
        self.initialized = false;
        info!("Store destroyed ({} node(s) freed)", freed);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of nodes as tracked by the store.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        NodeRef::new(&self.arena, self.root?)
    }

    /// The node stored at exactly `path`, if any.
    pub fn node(&self, path: &str) -> Option<NodeRef<'_>> {
        let id = self.lookup(path).ok()?;
        NodeRef::new(&self.arena, id)
    }

    pub fn insert_directory(&mut self, path: &str) -> Result<(), StoreError> {
        self.insert_path(path, Leaf::Directory)
    }

    pub fn insert_file(
        &mut self,
        path: &str,
        contents: Option<Bytes>,
        length: usize,
    ) -> Result<(), StoreError> {
        self.insert_path(path, Leaf::File { contents, length })
    }

    pub fn contains_directory(&self, path: &str) -> bool {
        self.node(path)
            .is_some_and(|node| node.kind() == EntryKind::Directory)
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.node(path)
            .is_some_and(|node| node.kind() == EntryKind::File)
    }

    /// Contents of the file at `path`. `Ok(None)` means the file has no contents.
    pub fn get_file_contents(&self, path: &str) -> Result<Option<Bytes>, StoreError> {
        let id = self.lookup(path)?;
        match self.arena.get(id).map(|node| node.kind()) {
            Some(NodeKind::File { contents, .. }) => Ok(contents.clone()),
            _ => NotAFileSnafu { path }.fail(),
        }
    }

    /// Swaps the contents and length of the file at `path`, returning the old contents.
    pub fn replace_file_contents(
        &mut self,
        path: &str,
        contents: Option<Bytes>,
        length: usize,
    ) -> Result<Option<Bytes>, StoreError> {
        let id = self.lookup(path)?;
        let previous = self
            .arena
            .get_mut(id)
            .and_then(|node| node.replace_contents(contents, length))
            .context(NotAFileSnafu { path })?;

        debug!("Replaced contents of '{}' (length {})", path, length);
        Ok(previous)
    }

    pub fn stat(&self, path: &str) -> Result<Stat, StoreError> {
        let id = self.lookup(path)?;
        match self.arena.get(id).map(|node| node.kind()) {
            Some(NodeKind::File { length, .. }) => Ok(Stat::File { length: *length }),
            _ => Ok(Stat::Directory),
        }
    }

    pub fn remove_directory(&mut self, path: &str) -> Result<(), StoreError> {
        let id = self.lookup(path)?;
        let is_directory = self.arena.get(id).is_some_and(|node| node.is_directory());
        ensure!(is_directory, NotADirectorySnafu { path });
        self.remove_node(path, id)
    }

    pub fn remove_file(&mut self, path: &str) -> Result<(), StoreError> {
        let id = self.lookup(path)?;
        let is_file = self.arena.get(id).is_some_and(|node| node.is_file());
        ensure!(is_file, NotAFileSnafu { path });
        self.remove_node(path, id)
    }

    /// Newline-terminated pre-order listing of every path, `None` when uninitialized.
    pub fn dump(&self) -> Option<String> {
        self.initialized
            .then(|| render_preorder(&self.arena, self.root))
    }

    /// Resolves `path` to the node stored exactly there.
    fn lookup(&self, path: &str) -> Result<NodeId, StoreError> {
        ensure!(self.initialized, NotInitializedSnafu);
        path::split_segments(path).context(InvalidPathSnafu)?;

        self.traverse(path)
            .filter(|id| self.arena.get(*id).is_some_and(|node| node.path() == path))
            .context(NoSuchPathSnafu { path })
    }

    /// Walks down from the root as far as the nodes match `path`.
    ///
    /// Returns the deepest node whose path is a prefix of `path`, or `None`
    /// when not even the root is.
    fn traverse(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root?;
        if !path::is_prefix_of(self.arena.get(current)?.path(), path) {
            return None;
        }

        loop {
            let node_path = self.arena.get(current)?.path();
            if node_path == path {
                return Some(current);
            }

            let start = node_path.len() + path::SEPARATOR.len_utf8();
            let end = path[start..]
                .find(path::SEPARATOR)
                .map_or(path.len(), |offset| start + offset);
            match self.arena.find_child(current, &path[..end]) {
                Some(child) => current = child,
                None => return Some(current),
            }
        }
    }

    fn root_path(&self) -> Option<&str> {
        self.arena.get(self.root?).map(|node| node.path())
    }

    fn insert_path(&mut self, path: &str, leaf: Leaf) -> Result<(), StoreError> {
        ensure!(self.initialized, NotInitializedSnafu);
        let segments = path::split_segments(path).context(InvalidPathSnafu)?;

        let anchor = match self.traverse(path) {
            Some(id) => Some(id),
            None => {
                if let Some(root) = self.root_path() {
                    return ConflictingPathSnafu { path, root }.fail();
                }
                None
            }
        };

        let matched_depth = match anchor.and_then(|id| self.arena.get(id)) {
            Some(node) => {
                ensure!(node.path() != path, AlreadyInTreeSnafu { path });
                if node.is_file() && matches!(leaf, Leaf::File { .. }) {
                    return NotADirectorySnafu { path: node.path() }.fail();
                }
                path::depth(node.path())
            }
            None => 0,
        };

        let created = self
            .insert_chain(anchor, &segments[matched_depth..], leaf)
            .map_err(|error| StoreError::from_node(path, error))?;
        self.count += created;

        debug!("Inserted '{}' ({} new node(s))", path, created);
        Ok(())
    }

    /// Creates one node per remaining segment and hangs the chain off `anchor`,
    /// or installs it as the root when there is no anchor.
    ///
    /// On failure every node created here is destroyed again and the tree is
    /// left as it was.
    fn insert_chain(
        &mut self,
        anchor: Option<NodeId>,
        rest: &[&str],
        leaf: Leaf,
    ) -> Result<usize, NodeError> {
        let mut head = None;
        if let Err(error) = self.grow_chain(anchor, rest, leaf, &mut head) {
            if let Some(head) = head {
                self.arena.destroy(head);
            }
            return Err(error);
        }

        let Some(head) = head else {
            return Ok(0);
        };
        match anchor {
            Some(anchor) => {
                if let Err(error) = self.arena.link_child(anchor, head) {
                    self.arena.destroy(head);
                    return Err(error);
                }
            }
            None => self.root = Some(head),
        }

        Ok(rest.len())
    }

    fn grow_chain(
        &mut self,
        anchor: Option<NodeId>,
        rest: &[&str],
        leaf: Leaf,
        head: &mut Option<NodeId>,
    ) -> Result<(), NodeError> {
        let Some((last, intermediate)) = rest.split_last() else {
            return Ok(());
        };

        let mut previous = anchor;
        for segment in intermediate {
            let id = self.arena.create_directory(segment, previous)?;
            self.extend_chain(head, previous, id)?;
            previous = Some(id);
        }

        let id = match leaf {
            Leaf::Directory => self.arena.create_directory(last, previous)?,
            Leaf::File { contents, length } => {
                let parent_path = previous
                    .and_then(|id| self.arena.get(id))
                    .map(|node| node.path());
                let file_path = path::join(parent_path, last)
                    .map_err(|source| NodeError::MemoryError { source })?;
                self.arena.create_file(file_path, contents, length)?
            }
        };
        self.extend_chain(head, previous, id)
    }

    /// Makes `id` the head of a new chain or links it below the chain's tail.
    fn extend_chain(
        &mut self,
        head: &mut Option<NodeId>,
        tail: Option<NodeId>,
        id: NodeId,
    ) -> Result<(), NodeError> {
        let Some(tail) = tail.filter(|_| head.is_some()) else {
            *head = Some(id);
            return Ok(());
        };

        if let Err(error) = self.arena.link_child(tail, id) {
            self.arena.destroy(id);
            return Err(error);
        }
        Ok(())
    }

    fn remove_node(&mut self, path: &str, id: NodeId) -> Result<(), StoreError> {
        match self.arena.get(id).and_then(|node| node.parent()) {
            Some(parent) => self
                .arena
                .unlink_child(parent, id)
                .map_err(|error| StoreError::from_node(path, error))?,
            None => self.root = None,
        }

        let destroyed = self.arena.destroy(id);
        self.count -= destroyed;
        debug!("Removed '{}' ({} node(s))", path, destroyed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::check_store;
    use proptest::prelude::*;
    use rstest::*;

    #[fixture]
    fn store() -> Store {
        let mut store = Store::new();
        store.init().unwrap();
        store
    }

    fn hi() -> Option<Bytes> {
        Some(Bytes::from_static(b"hi"))
    }

    #[test]
    fn fresh_store_is_uninitialized() {
        let store = Store::new();
        assert!(!store.is_initialized());
        assert_eq!(store.count(), 0);
        assert_eq!(store.dump(), None);
        assert!(store.root().is_none());
    }

    #[test]
    fn uninitialized_store_rejects_operations() {
        let mut store = Store::new();
        assert!(matches!(
            store.insert_directory("a"),
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(
            store.insert_file("a", None, 0),
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(store.stat("a"), Err(StoreError::NotInitialized)));
        assert!(matches!(
            store.get_file_contents("a"),
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(
            store.remove_directory("a"),
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(store.destroy(), Err(StoreError::NotInitialized)));
        assert!(!store.contains_directory("a"));
        assert!(!store.contains_file("a"));
    }

    #[rstest]
    fn init_twice_fails(mut store: Store) {
        assert!(matches!(store.init(), Err(StoreError::AlreadyInitialized)));
        assert!(store.is_initialized());
    }

    #[rstest]
    fn destroy_twice_fails(mut store: Store) {
        store.insert_directory("a/b").unwrap();
        store.destroy().unwrap();
        assert!(!store.is_initialized());
        assert_eq!(store.count(), 0);
        assert!(matches!(store.destroy(), Err(StoreError::NotInitialized)));
    }

    #[rstest]
    fn store_can_be_reinitialized_after_destroy(mut store: Store) {
        store.insert_directory("a/b").unwrap();
        store.destroy().unwrap();
        store.init().unwrap();

        assert_eq!(store.dump().as_deref(), Some(""));
        assert!(!store.contains_directory("a"));
        store.insert_directory("x").unwrap();
        assert_eq!(store.count(), 1);
    }

    #[rstest]
    fn walkthrough_of_common_operations(mut store: Store) {
        store.insert_directory("a/b/c").unwrap();
        assert_eq!(store.count(), 3);
        store.insert_file("a/d/A", hi(), 2).unwrap();
        assert_eq!(store.count(), 5);

        assert!(store.contains_directory("a"));
        assert!(store.contains_directory("a/d"));
        assert!(store.contains_file("a/d/A"));
        assert!(!store.contains_file("a/d"));
        assert!(!store.contains_directory("a/d/A"));

        assert!(matches!(
            store.insert_directory("x/y"),
            Err(StoreError::ConflictingPath { .. })
        ));

        store.remove_directory("a").unwrap();
        assert!(!store.contains_directory("a/b"));
        assert!(!store.contains_file("a/d/A"));
        assert_eq!(store.count(), 0);
        assert!(store.root().is_none());
        assert_eq!(check_store(&store), Ok(()));
    }

    #[rstest]
    fn insert_directory_twice_reports_already_in_tree(mut store: Store) {
        store.insert_directory("a/b").unwrap();
        assert!(store.contains_directory("a/b"));
        assert!(matches!(
            store.insert_directory("a/b"),
            Err(StoreError::AlreadyInTree { .. })
        ));
        assert_eq!(store.count(), 2);
    }

    #[rstest]
    fn occupied_path_rejects_either_kind(mut store: Store) {
        store.insert_directory("a/b/c").unwrap();
        store.insert_file("a/d/A", hi(), 2).unwrap();

        assert!(matches!(
            store.insert_directory("a/d/A"),
            Err(StoreError::AlreadyInTree { .. })
        ));
        assert!(matches!(
            store.insert_file("a/b", None, 0),
            Err(StoreError::AlreadyInTree { .. })
        ));
    }

    #[rstest]
    #[case("B")]
    #[case("a")]
    #[case("A/B")]
    fn file_root_precludes_further_directories(mut store: Store, #[case] path: &str) {
        store.insert_file("A", None, 0).unwrap();

        let result = store.insert_directory(path);
        assert!(result.is_err());
        assert_eq!(store.count(), 1);
        assert_eq!(store.dump().as_deref(), Some("A\n"));
    }

    #[rstest]
    #[case("B")]
    #[case("a")]
    #[case("b/B")]
    fn file_root_conflicts_with_other_roots(mut store: Store, #[case] path: &str) {
        store.insert_file("A", None, 0).unwrap();

        assert!(matches!(
            store.insert_file(path, None, 0),
            Err(StoreError::ConflictingPath { .. })
        ));
        assert!(matches!(
            store.insert_directory(path),
            Err(StoreError::ConflictingPath { .. })
        ));
    }

    #[rstest]
    fn directory_below_file_fails_without_side_effects(mut store: Store) {
        store.insert_directory("a").unwrap();
        store.insert_file("a/F", hi(), 2).unwrap();
        let before = store.dump();

        let result = store.insert_directory("a/F/x/y");
        assert!(matches!(result, Err(StoreError::ParentChildError { .. })));
        assert_eq!(store.count(), 2);
        assert_eq!(store.dump(), before);
        assert_eq!(check_store(&store), Ok(()));
    }

    #[rstest]
    fn file_below_file_reports_not_a_directory(mut store: Store) {
        store.insert_directory("a").unwrap();
        store.insert_file("a/F", hi(), 2).unwrap();

        let result = store.insert_file("a/F/G", None, 0);
        match result {
            Err(StoreError::NotADirectory { path }) => assert_eq!(path, "a/F"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(store.count(), 2);
    }

    #[rstest]
    #[case("")]
    #[case("/a")]
    #[case("a/")]
    #[case("a//b")]
    fn malformed_paths_are_rejected(mut store: Store, #[case] path: &str) {
        store.insert_directory("a").unwrap();

        assert!(matches!(
            store.insert_directory(path),
            Err(StoreError::InvalidPath { .. })
        ));
        assert!(matches!(store.stat(path), Err(StoreError::InvalidPath { .. })));
        assert!(!store.contains_directory(path));
        assert_eq!(store.count(), 1);
    }

    #[rstest]
    fn lookalike_prefixes_do_not_match(mut store: Store) {
        store.insert_directory("a/bc").unwrap();

        assert!(!store.contains_directory("a/b"));
        store.insert_directory("a/b").unwrap();
        assert!(store.contains_directory("a/b"));
        assert!(store.contains_directory("a/bc"));
        assert_eq!(store.dump().as_deref(), Some("a\na/b\na/bc\n"));
    }

    #[rstest]
    fn get_and_replace_file_contents(mut store: Store) {
        store.insert_file("a/f", hi(), 2).unwrap();

        assert_eq!(store.get_file_contents("a/f").unwrap(), hi());
        let previous = store
            .replace_file_contents("a/f", Some(Bytes::from_static(b"hello")), 5)
            .unwrap();
        assert_eq!(previous, hi());
        assert_eq!(
            store.get_file_contents("a/f").unwrap(),
            Some(Bytes::from_static(b"hello"))
        );
        assert_eq!(store.stat("a/f").unwrap(), Stat::File { length: 5 });

        let previous = store.replace_file_contents("a/f", None, 0).unwrap();
        assert_eq!(previous, Some(Bytes::from_static(b"hello")));
        assert_eq!(store.get_file_contents("a/f").unwrap(), None);
    }

    #[rstest]
    fn contents_of_directories_and_missing_paths_fail(mut store: Store) {
        store.insert_directory("a/b").unwrap();

        assert!(matches!(
            store.get_file_contents("a/b"),
            Err(StoreError::NotAFile { .. })
        ));
        assert!(matches!(
            store.replace_file_contents("a/b", hi(), 2),
            Err(StoreError::NotAFile { .. })
        ));
        assert!(matches!(
            store.get_file_contents("a/c"),
            Err(StoreError::NoSuchPath { .. })
        ));
    }

    #[rstest]
    fn stat_reports_kind_and_length(mut store: Store) {
        store.insert_directory("a/b").unwrap();
        store.insert_file("a/b/f", None, 42).unwrap();

        assert_eq!(store.stat("a").unwrap(), Stat::Directory);
        assert_eq!(store.stat("a/b/f").unwrap(), Stat::File { length: 42 });
        assert!(matches!(store.stat("a/x"), Err(StoreError::NoSuchPath { .. })));
        assert!(matches!(store.stat("b"), Err(StoreError::NoSuchPath { .. })));
    }

    #[rstest]
    fn removal_requires_the_right_kind(mut store: Store) {
        store.insert_directory("a/b").unwrap();
        store.insert_file("a/f", None, 0).unwrap();

        assert!(matches!(
            store.remove_directory("a/f"),
            Err(StoreError::NotADirectory { .. })
        ));
        assert!(matches!(
            store.remove_file("a/b"),
            Err(StoreError::NotAFile { .. })
        ));
        assert!(matches!(
            store.remove_file("a/g"),
            Err(StoreError::NoSuchPath { .. })
        ));
        assert_eq!(store.count(), 3);

        store.remove_file("a/f").unwrap();
        assert_eq!(store.count(), 2);
        assert!(!store.contains_file("a/f"));
    }

    #[rstest]
    fn removing_a_directory_removes_everything_below(mut store: Store) {
        store.insert_directory("a/b/c/d").unwrap();
        store.insert_file("a/b/f", None, 0).unwrap();
        store.insert_directory("a/x").unwrap();

        store.remove_directory("a/b").unwrap();
        assert_eq!(store.count(), 2);
        assert_eq!(store.dump().as_deref(), Some("a\na/x\n"));
        for gone in ["a/b", "a/b/c", "a/b/c/d"] {
            assert!(!store.contains_directory(gone));
        }
        assert!(!store.contains_file("a/b/f"));
        assert_eq!(check_store(&store), Ok(()));
    }

    #[rstest]
    fn removing_a_file_root_empties_the_store(mut store: Store) {
        store.insert_file("A", hi(), 2).unwrap();
        store.remove_file("A").unwrap();

        assert_eq!(store.count(), 0);
        assert_eq!(store.dump().as_deref(), Some(""));
        store.insert_directory("B").unwrap();
        assert!(store.contains_directory("B"));
    }

    #[rstest]
    fn dump_of_empty_store_is_empty(store: Store) {
        assert_eq!(store.dump().as_deref(), Some(""));
    }

    #[rstest]
    fn dump_of_a_single_chain(mut store: Store) {
        store.insert_directory("a/b/c").unwrap();
        assert_eq!(store.dump().as_deref(), Some("a\na/b\na/b/c\n"));
    }

    #[rstest]
    fn dump_lists_files_before_subdirectories(mut store: Store) {
        store.insert_directory("a/y/CHILD1DIR").unwrap();
        store.insert_file("a/y/CHILD2FILE", None, 0).unwrap();
        store.insert_file("a/y/CHILD1FILE", None, 0).unwrap();
        store.insert_directory("a/x").unwrap();
        store.insert_file("a/z", None, 0).unwrap();

        let expected = "a\na/z\na/x\na/y\na/y/CHILD1FILE\na/y/CHILD2FILE\na/y/CHILD1DIR\n";
        assert_eq!(store.dump().as_deref(), Some(expected));
    }

    #[rstest]
    fn node_view_resolves_exact_paths(mut store: Store) {
        store.insert_directory("a/b").unwrap();
        store.insert_file("a/b/f", hi(), 2).unwrap();

        let node = store.node("a/b").unwrap();
        assert_eq!(node.path(), "a/b");
        assert_eq!(node.num_children(), 1);
        assert_eq!(node.parent().unwrap().path(), "a");
        assert!(store.node("a/b/f/g").is_none());
        assert!(store.node("a//b").is_none());
    }

    #[derive(Debug, Clone)]
    enum Action {
        InsertDirectory(String),
        InsertFile(String),
        RemoveDirectory(String),
        RemoveFile(String),
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(vec!["a", "b", "ab", "c"]), 1..5)
            .prop_map(|segments| segments.join("/"))
    }

    fn action_strategy() -> impl Strategy<Value = Action> {
        prop_oneof![
            path_strategy().prop_map(Action::InsertDirectory),
            path_strategy().prop_map(Action::InsertFile),
            path_strategy().prop_map(Action::RemoveDirectory),
            path_strategy().prop_map(Action::RemoveFile),
        ]
    }

    proptest! {
        #[test]
        fn every_reachable_state_is_valid(
            actions in prop::collection::vec(action_strategy(), 1..40)
        ) {
            let mut store = Store::new();
            store.init().unwrap();

            for action in actions {
                let before = store.count();
                let result = match &action {
                    Action::InsertDirectory(path) => store.insert_directory(path),
                    Action::InsertFile(path) => store.insert_file(path, None, path.len()),
                    Action::RemoveDirectory(path) => store.remove_directory(path),
                    Action::RemoveFile(path) => store.remove_file(path),
                };
                if result.is_err() {
                    prop_assert_eq!(store.count(), before);
                }

                prop_assert_eq!(check_store(&store), Ok(()));
                let dump = store.dump().unwrap();
                prop_assert_eq!(dump.lines().count(), store.count());

                match &action {
                    Action::InsertDirectory(path) if result.is_ok() => {
                        prop_assert!(store.contains_directory(path));
                    }
                    Action::InsertFile(path) if result.is_ok() => {
                        prop_assert!(store.contains_file(path));
                    }
                    Action::RemoveDirectory(path) | Action::RemoveFile(path) if result.is_ok() => {
                        prop_assert!(store.node(path).is_none());
                    }
                    _ => {}
                }
            }
        }
    }
}

use crate::node::{NodeArena, NodeId};

/// Lists every path under `root`, one per line, in pre-order.
///
/// At each directory the file children come first, then the sub-directories,
/// each group in sorted order.
pub(super) fn render_preorder(arena: &NodeArena, root: Option<NodeId>) -> String {
    let mut rendered = String::new();
    let mut pending = root.into_iter().collect::<Vec<_>>();

    while let Some(id) = pending.pop() {
        let Some(node) = arena.get(id) else {
            continue;
        };
        rendered.push_str(node.path());
        rendered.push('\n');

        let (files, directories): (Vec<NodeId>, Vec<NodeId>) = node
            .children()
            .iter()
            .partition(|child| arena.get(**child).is_some_and(|n| n.is_file()));
        pending.extend(directories.into_iter().rev());
        pending.extend(files.into_iter().rev());
    }

    rendered
}

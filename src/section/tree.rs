//! Outline tree construction.

use crate::model::{Diagnostic, NodeId, OutlineEntry, OutlineTree};

/// Build the outline tree from flat entries in declaration order.
///
/// Keeps a stack of open ancestors indexed by depth. Each entry pops the
/// stack down to its parent's depth and is attached as that parent's last
/// child. An entry that jumps more than one level deeper than the current
/// node is attached one level below it and reported as `MalformedNesting`.
///
/// No entries yields a root without children and an `EmptyOutline`
/// diagnostic.
pub fn build_tree(entries: &[OutlineEntry]) -> (OutlineTree, Vec<Diagnostic>) {
    let mut tree = OutlineTree::new();
    let mut diagnostics = Vec::new();

    if entries.is_empty() {
        log::info!("document has no outline entries");
        diagnostics.push(Diagnostic::EmptyOutline);
        return (tree, diagnostics);
    }

    // stack[d] is the open node at depth d; stack[0] is the root
    let mut stack: Vec<NodeId> = vec![OutlineTree::ROOT];

    for entry in entries {
        let declared = entry.depth.max(1);
        let deepest_allowed = stack.len();
        let depth = declared.min(deepest_allowed);

        if depth < declared {
            log::warn!(
                "bookmark '{}' declared at depth {} clamped to {}",
                entry.title,
                declared,
                depth
            );
            diagnostics.push(Diagnostic::MalformedNesting {
                title: entry.title.clone(),
                declared_depth: declared,
                attached_depth: depth,
            });
        }

        stack.truncate(depth);
        let parent = stack[depth - 1];
        let id = tree.push_child(parent, entry.title.clone(), entry.page);
        stack.push(id);
    }

    (tree, diagnostics)
}

//! Section boundary resolution.
//!
//! A section starts at its bookmark's page and ends where the next section
//! in document order at the same or a shallower level starts: the next
//! sibling if there is one, otherwise whatever ends the parent. The last
//! sections of the document end at the page count.

use crate::model::{Diagnostic, NodeId, OutlineTree, ResolvedRange};

/// Attach a `ResolvedRange` to every node of the tree.
///
/// Ranges are half-open `[start_page, end_page)` and clamped to the page
/// count. Empty or inverted ranges are widened to one page, flagged as
/// degenerate and reported.
pub fn resolve_boundaries(tree: &mut OutlineTree, page_count: usize) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for id in tree.depth_first() {
        let (raw_end, boundary) = next_boundary(tree, id, page_count);
        let start_page = tree.node(id).page_anchor;
        let clamped_end = raw_end.min(page_count);

        let range = if clamped_end <= start_page {
            let section_id = tree.node(id).section_id.clone();
            log::warn!(
                "section {} has empty range [{}, {}), clamped to one page",
                section_id,
                start_page,
                raw_end
            );
            diagnostics.push(Diagnostic::DegenerateBoundary {
                section_id,
                start_page,
                raw_end_page: raw_end,
            });
            ResolvedRange {
                start_page,
                end_page: start_page + 1,
                degenerate: true,
                boundary,
            }
        } else {
            ResolvedRange {
                start_page,
                end_page: clamped_end,
                degenerate: false,
                boundary,
            }
        };

        tree.node_mut(id).range = Some(range);
    }

    diagnostics
}

/// Raw end page of a node and the node whose anchor defines it.
///
/// Walks up the ancestor chain until a node with a next sibling is found;
/// reaching the root means the section runs to the end of the document.
pub fn next_boundary(tree: &OutlineTree, id: NodeId, page_count: usize) -> (usize, Option<NodeId>) {
    let mut current = id;
    loop {
        if let Some(next) = tree.next_sibling(current) {
            return (tree.node(next).page_anchor, Some(next));
        }
        match tree.node(current).parent {
            Some(parent) if parent != OutlineTree::ROOT => current = parent,
            _ => return (page_count, None),
        }
    }
}

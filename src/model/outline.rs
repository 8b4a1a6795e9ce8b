//! Outline (bookmark) types.
//!
//! The outline is stored as an arena: every node lives in one `Vec` and refers
//! to its parent and children by index. Index 0 is a synthetic root that has
//! no title, no parent and depth 0.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Index of a node inside an [`OutlineTree`].
pub type NodeId = usize;

/// A flat bookmark entry as read from the document, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Bookmark title as declared (may be empty or duplicated)
    pub title: String,
    /// Declared nesting depth (1 = top level)
    pub depth: usize,
    /// Target page (0-indexed)
    pub page: usize,
}

impl OutlineEntry {
    /// Create a new outline entry.
    pub fn new(title: impl Into<String>, depth: usize, page: usize) -> Self {
        Self {
            title: title.into(),
            depth,
            page,
        }
    }
}

/// Page range attached to a node by boundary resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    /// First page of the section (0-indexed, inclusive)
    pub start_page: usize,
    /// Page where the section stops (0-indexed, exclusive)
    pub end_page: usize,
    /// Whether the raw range was empty or inverted and had to be clamped
    pub degenerate: bool,
    /// The node whose anchor terminates this range, if any
    pub boundary: Option<NodeId>,
}

impl ResolvedRange {
    /// Pages covered by the range.
    pub fn pages(&self) -> Range<usize> {
        self.start_page..self.end_page
    }

    /// Number of pages covered.
    pub fn len(&self) -> usize {
        self.end_page.saturating_sub(self.start_page)
    }

    /// Whether the range covers no pages.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One node of the outline tree.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    /// Bookmark title
    pub title: String,
    /// Target page (0-indexed)
    pub page_anchor: usize,
    /// Dotted sibling-ordinal path, e.g. `1.2.3` (empty for the root)
    pub section_id: String,
    /// Depth in the tree (root = 0)
    pub depth: usize,
    /// Parent node (None for the root)
    pub parent: Option<NodeId>,
    /// Children in declaration order
    pub children: Vec<NodeId>,
    /// Range assigned by boundary resolution
    pub range: Option<ResolvedRange>,
}

impl OutlineNode {
    fn root() -> Self {
        Self {
            title: String::new(),
            page_anchor: 0,
            section_id: String::new(),
            depth: 0,
            parent: None,
            children: Vec::new(),
            range: None,
        }
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Rooted outline tree backed by an arena of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineTree {
    nodes: Vec<OutlineNode>,
}

impl OutlineTree {
    /// Index of the synthetic root.
    pub const ROOT: NodeId = 0;

    /// Create a tree containing only the synthetic root.
    pub fn new() -> Self {
        Self {
            nodes: vec![OutlineNode::root()],
        }
    }

    /// The synthetic root.
    pub fn root(&self) -> &OutlineNode {
        &self.nodes[Self::ROOT]
    }

    /// Get a node by index.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &OutlineNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut OutlineNode {
        &mut self.nodes[id]
    }

    /// Number of bookmark nodes (the root is not counted).
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the outline has no bookmark nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a node as the last child of `parent` and return its index.
    ///
    /// The node's `section_id` is derived from the parent's id and the new
    /// node's 1-based ordinal among its siblings.
    pub fn push_child(
        &mut self,
        parent: NodeId,
        title: impl Into<String>,
        page_anchor: usize,
    ) -> NodeId {
        let id = self.nodes.len();
        let ordinal = self.nodes[parent].children.len() + 1;
        let parent_node = &self.nodes[parent];
        let section_id = if parent == Self::ROOT {
            ordinal.to_string()
        } else {
            format!("{}.{}", parent_node.section_id, ordinal)
        };
        let depth = parent_node.depth + 1;

        self.nodes.push(OutlineNode {
            title: title.into(),
            page_anchor,
            section_id,
            depth,
            parent: Some(parent),
            children: Vec::new(),
            range: None,
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// The node declared immediately after `id` under the same parent.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// The node visited just before `id` in depth-first order.
    ///
    /// That is the deepest last descendant of the previous sibling, or the
    /// parent when `id` is a first child. First-level nodes with no previous
    /// sibling have none.
    pub fn preceding(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == id)?;
        if pos == 0 {
            return Some(parent).filter(|&p| p != Self::ROOT);
        }
        let mut current = siblings[pos - 1];
        while let Some(&last) = self.nodes[current].children.last() {
            current = last;
        }
        Some(current)
    }

    /// All bookmark nodes in depth-first declaration order (root excluded).
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.root().children.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }

        order
    }

    /// Find a node by its dotted section id.
    pub fn find(&self, section_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .skip(1)
            .position(|n| n.section_id == section_id)
            .map(|pos| pos + 1)
    }

    /// Render an indented listing of the outline, one node per line.
    ///
    /// Pages are shown 1-indexed; resolved ranges are shown as `[first-last]`
    /// when available.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for id in self.depth_first() {
            let node = &self.nodes[id];
            out.push_str(&"  ".repeat(node.depth - 1));
            out.push_str(&format!(
                "{} {} (Page {})",
                node.section_id,
                node.title,
                node.page_anchor + 1
            ));
            if let Some(range) = node.range {
                out.push_str(&format!(" [{}-{}]", range.start_page + 1, range.end_page));
                if range.degenerate {
                    out.push_str(" *degenerate*");
                }
            }
            out.push('\n');
        }
        out
    }
}

impl Default for OutlineTree {
    fn default() -> Self {
        Self::new()
    }
}

//! Non-fatal corrections and skips recorded while parsing a document.

use serde::Serialize;
use std::fmt;

/// A recoverable condition that was absorbed instead of failing the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The document declares no bookmarks; nothing can be sectioned.
    EmptyOutline,

    /// A bookmark jumped more than one level deeper than its predecessor and
    /// was attached one level below the current node instead.
    MalformedNesting {
        /// Bookmark title
        title: String,
        /// Depth as declared in the source
        declared_depth: usize,
        /// Depth the node was attached at
        attached_depth: usize,
    },

    /// A resolved range had zero or negative span and was clamped to one page.
    DegenerateBoundary {
        /// Section id of the clamped node
        section_id: String,
        /// Start page (0-indexed)
        start_page: usize,
        /// Raw end page before clamping (0-indexed, exclusive)
        raw_end_page: usize,
    },

    /// A page contributed nothing: no text layer or extraction failed.
    PageSkipped {
        /// Page index (0-indexed)
        page_index: usize,
        /// Why the page was skipped
        reason: String,
    },

    /// A bookmark's destination could not be resolved to a page.
    MissingDestination {
        /// Bookmark title
        title: String,
        /// Declared depth
        depth: usize,
    },

    /// A section's title line could not be located on its anchor page.
    TitleNotFound {
        /// Section id
        section_id: String,
        /// Page searched (0-indexed)
        page_index: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyOutline => write!(f, "document has no outline entries"),
            Diagnostic::MalformedNesting {
                title,
                declared_depth,
                attached_depth,
            } => write!(
                f,
                "bookmark '{}' declared at depth {} attached at depth {}",
                title, declared_depth, attached_depth
            ),
            Diagnostic::DegenerateBoundary {
                section_id,
                start_page,
                raw_end_page,
            } => write!(
                f,
                "section {} resolved to empty range [{}, {}), clamped to one page",
                section_id, start_page, raw_end_page
            ),
            Diagnostic::PageSkipped { page_index, reason } => {
                write!(f, "page {} skipped: {}", page_index + 1, reason)
            }
            Diagnostic::MissingDestination { title, depth } => write!(
                f,
                "bookmark '{}' at depth {} has no resolvable destination",
                title, depth
            ),
            Diagnostic::TitleNotFound {
                section_id,
                page_index,
            } => write!(
                f,
                "title of section {} not found on page {}",
                section_id,
                page_index + 1
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_human_page_numbers() {
        let diag = Diagnostic::PageSkipped {
            page_index: 1,
            reason: "no text layer".to_string(),
        };
        assert_eq!(diag.to_string(), "page 2 skipped: no text layer");
    }

    #[test]
    fn test_serialize_tagged() {
        let diag = Diagnostic::DegenerateBoundary {
            section_id: "1.2".to_string(),
            start_page: 4,
            raw_end_page: 4,
        };
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"kind\":\"degenerate_boundary\""));
        assert!(json.contains("\"section_id\":\"1.2\""));
    }
}

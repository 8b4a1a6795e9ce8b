//! Page-level extraction results.
//!
//! Vertical coordinates in this module are measured from the top edge of the
//! page downward (`top` grows toward the bottom), which is the reading order.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in top-down page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge (distance from the top of the page)
    pub top: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge (distance from the top of the page)
    pub bottom: f32,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Whether a vertical position falls within the box's vertical span.
    pub fn covers_vertically(&self, y: f32, tolerance: f32) -> bool {
        y >= self.top - tolerance && y <= self.bottom + tolerance
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// One visually distinct row of free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLine {
    /// Line text, spans joined left to right
    pub text: String,
    /// Top of the line's glyphs
    pub top: f32,
    /// Page the line was read from (0-indexed)
    pub page_index: usize,
}

impl PageLine {
    /// Create a new page line.
    pub fn new(text: impl Into<String>, top: f32, page_index: usize) -> Self {
        Self {
            text: text.into(),
            top,
            page_index,
        }
    }
}

/// A detected table: its bounding box and row-major cell text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    /// Region bounds
    pub bbox: BBox,
    /// Rows of cell text, left to right
    pub rows: Vec<Vec<String>>,
    /// Page the table was read from (0-indexed)
    pub page_index: usize,
}

impl TableRegion {
    /// Create a new table region.
    pub fn new(bbox: BBox, rows: Vec<Vec<String>>, page_index: usize) -> Self {
        Self {
            bbox,
            rows,
            page_index,
        }
    }

    /// Render each row as one line: non-empty cells joined by a single space.
    pub fn row_lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.trim())
                    .filter(|cell| !cell.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Both extraction views of a single page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page index (0-indexed)
    pub page_index: usize,
    /// Free-text lines, top to bottom
    pub lines: Vec<PageLine>,
    /// Detected tables, top to bottom
    pub tables: Vec<TableRegion>,
}

impl PageContent {
    /// Create page content from both views.
    pub fn new(page_index: usize, lines: Vec<PageLine>, tables: Vec<TableRegion>) -> Self {
        Self {
            page_index,
            lines,
            tables,
        }
    }

    /// An empty result for a page that yielded nothing.
    pub fn empty(page_index: usize) -> Self {
        Self {
            page_index,
            ..Default::default()
        }
    }

    /// Whether the page produced no text at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_vertical_cover() {
        let bbox = BBox::new(50.0, 100.0, 500.0, 200.0);
        assert!(bbox.covers_vertically(100.0, 0.0));
        assert!(bbox.covers_vertically(150.0, 0.0));
        assert!(!bbox.covers_vertically(99.0, 0.0));
        assert!(bbox.covers_vertically(99.5, 1.0));
        assert!((bbox.height() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_row_lines_skip_empty_cells() {
        let table = TableRegion::new(
            BBox::new(0.0, 0.0, 100.0, 40.0),
            vec![
                vec!["项目".to_string(), "".to_string(), "2023年".to_string()],
                vec!["".to_string(), " ".to_string()],
                vec!["营业收入".to_string(), "1,000".to_string()],
            ],
            3,
        );
        assert_eq!(table.row_lines(), vec!["项目 2023年", "营业收入 1,000"]);
    }

    #[test]
    fn test_empty_page() {
        let page = PageContent::empty(7);
        assert_eq!(page.page_index, 7);
        assert!(page.is_empty());
    }
}

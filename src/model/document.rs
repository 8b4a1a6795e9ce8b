//! Document-level output types.
//!
//! These types serialize to the JSON contract consumed by the indexing
//! service:
//!
//! ```json
//! {
//!   "pdf_metadata": { "file_name": "...", "report_title": "...",
//!                     "company_name": "...", "company_stock_code": "600519.SH" },
//!   "outline": [
//!     { "content": "...",
//!       "metadata": { "section_id": "1.2", "section_title": "...", "page": 3 } }
//!   ]
//! }
//! ```

use super::Diagnostic;
use serde::{Deserialize, Serialize};

/// A report reconstructed into titled sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Document-level metadata
    pub pdf_metadata: PdfMetadata,

    /// Sections in depth-first outline order
    pub outline: Vec<Section>,

    /// Corrections and skips recorded while parsing (not serialized)
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedDocument {
    /// Create a document with metadata and no sections.
    pub fn new(pdf_metadata: PdfMetadata) -> Self {
        Self {
            pdf_metadata,
            outline: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.outline.len()
    }

    /// Look up a section by its dotted id.
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.outline
            .iter()
            .find(|s| s.metadata.section_id == section_id)
    }

    /// Whether any page was skipped during extraction.
    pub fn has_skipped_pages(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::PageSkipped { .. }))
    }
}

/// Document-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfMetadata {
    /// Input file name, including extension
    pub file_name: String,

    /// Report title (e.g. "贵州茅台酒股份有限公司2023年年度报告")
    pub report_title: String,

    /// Company short name
    pub company_name: String,

    /// Stock code in `<6 digits>.<SH|SZ|BJ>` form, or empty when unknown
    pub company_stock_code: String,
}

/// One titled section with its assembled body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Assembled text, one line per extracted line or table row
    pub content: String,

    /// Section addressing information
    pub metadata: SectionMetadata,
}

/// Addressing information for a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMetadata {
    /// Dotted hierarchical id, e.g. `2.1`
    pub section_id: String,

    /// Bookmark title
    pub section_title: String,

    /// Start page (1-indexed)
    pub page: u32,
}

impl Section {
    /// Create a section from its parts. `page_index` is 0-based.
    pub fn new(
        section_id: impl Into<String>,
        title: impl Into<String>,
        page_index: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata: SectionMetadata {
                section_id: section_id.into(),
                section_title: title.into(),
                page: page_index as u32 + 1,
            },
        }
    }

    /// Dotted section id.
    pub fn section_id(&self) -> &str {
        &self.metadata.section_id
    }

    /// Section title.
    pub fn title(&self) -> &str {
        &self.metadata.section_title
    }
}

//! # unreport
//!
//! Outline-driven section extraction for PDF annual reports.
//!
//! A report's bookmarks are rebuilt into a section tree, every section gets
//! the page range it spans, and each section's exact text (tables flattened
//! to one line per row) is cut out of those pages. The result serializes to
//! a fixed JSON contract of document metadata plus an ordered list of
//! sections.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unreport::{parse_file, render};
//!
//! fn main() -> unreport::Result<()> {
//!     let doc = parse_file("600519_贵州茅台_2023.pdf")?;
//!
//!     for section in &doc.outline {
//!         println!("{} {}", section.section_id(), section.title());
//!     }
//!
//!     let json = render::to_json(&doc, render::JsonFormat::Pretty)?;
//!     std::fs::write("600519_贵州茅台_2023.json", json)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Batch
//!
//! ```no_run
//! let report = unreport::parse_directory("reports/", "sections/")?;
//! println!("{} parsed, {} skipped", report.parsed_count(), report.skipped_count());
//! # Ok::<(), unreport::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Outline reconstruction**: bookmark depth repair and dotted section ids
//! - **Page boundaries**: contiguous, non-overlapping ranges per section
//! - **Title cuts**: sections start and stop at their title lines, not page edges
//! - **Tables**: ruled and whitespace-aligned tables replace their raw lines
//! - **Parallel extraction**: pages and files processed with Rayon

pub mod batch;
pub mod detect;
pub mod document;
pub mod error;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod render;
pub mod section;

pub use batch::{
    parse_directory, parse_directory_with_options, parse_directory_with_progress, BatchReport,
    FileReport, FileStatus,
};
pub use detect::{detect_header_from_bytes, detect_header_from_path, has_pdf_extension, PdfHeader};
pub use document::{
    parse_bytes, parse_file, parse_file_with_options, read_outline, DocumentAssembler,
};
pub use error::{Error, Result};
pub use model::{
    Diagnostic, OutlineEntry, OutlineNode, OutlineTree, PageContent, PageLine, ParsedDocument,
    PdfMetadata, Section, SectionMetadata, TableRegion,
};
pub use parser::{ErrorMode, PageMargins, PageSource, ParseOptions, PdfParser};
pub use render::JsonFormat;
pub use section::{NormalizedTitleMatcher, TitleMatcher};

use std::path::Path;

/// Parse a report and serialize it to JSON.
///
/// # Example
///
/// ```no_run
/// use unreport::{to_json, JsonFormat};
///
/// let json = to_json("600519_贵州茅台_2023.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("600519_贵州茅台_2023.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_json(&doc, format)
}

/// Builder for parsing reports.
///
/// # Example
///
/// ```no_run
/// use unreport::Unreport;
///
/// let json = Unreport::new()
///     .crop_margins()
///     .with_workers(4)
///     .parse("600519_贵州茅台_2023.pdf")?
///     .to_json()?;
/// # Ok::<(), unreport::Error>(())
/// ```
pub struct Unreport {
    options: ParseOptions,
    format: JsonFormat,
}

impl Unreport {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            format: JsonFormat::Pretty,
        }
    }

    /// Fail on bookmarks whose destination cannot be resolved.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    /// Disable parallel page extraction.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Limit the number of extraction worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.options = self.options.with_max_workers(workers);
        self
    }

    /// Drop running headers and footers.
    pub fn crop_margins(mut self) -> Self {
        self.options = self.options.with_margins(PageMargins::report_default());
        self
    }

    /// Emit compact JSON.
    pub fn compact(mut self) -> Self {
        self.format = JsonFormat::Compact;
        self
    }

    /// Parse a report file.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<UnreportResult> {
        let document = parse_file_with_options(path, self.options)?;
        Ok(UnreportResult {
            document,
            format: self.format,
        })
    }

    /// Parse a report held in memory.
    pub fn parse_bytes(self, data: &[u8], file_name: &str) -> Result<UnreportResult> {
        let document = parse_bytes(data, file_name, self.options)?;
        Ok(UnreportResult {
            document,
            format: self.format,
        })
    }

    /// Parse every PDF in a directory.
    pub fn parse_directory<P, Q>(self, input_dir: P, output_dir: Q) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        parse_directory_with_options(input_dir, output_dir, &self.options)
    }
}

impl Default for Unreport {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed report with its output format.
pub struct UnreportResult {
    /// The parsed document
    pub document: ParsedDocument,
    format: JsonFormat,
}

impl UnreportResult {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        render::to_json(&self.document, self.format)
    }

    /// Serialize and write to `path`.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        render::write_json(&self.document, path, self.format)
    }

    /// Non-fatal conditions met while parsing.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.document.diagnostics
    }

    /// Consume and return the document.
    pub fn into_document(self) -> ParsedDocument {
        self.document
    }
}

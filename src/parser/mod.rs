//! PDF parsing module.

mod extract;
mod layout;
mod options;
mod pdf_parser;
mod table_detector;

pub use extract::{extract_pages, ExtractedPages, PageExtractor, PageSource};
pub use layout::{group_spans_into_lines, LayoutAnalyzer, PageLayout, Rule, TextLine, TextSpan};
pub use options::{ErrorMode, PageMargins, ParseOptions};
pub use pdf_parser::{OutlineRead, PdfParser};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig};

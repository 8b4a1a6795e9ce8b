//! Page content extraction.
//!
//! Turns one page's layout into its two views: free-text lines and detected
//! tables, both in top-down coordinates. Multi-page extraction may run on a
//! rayon pool; results are keyed by page index so callers always read them
//! back in page order.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::error::Result;
use crate::model::{BBox, Diagnostic, PageContent, PageLine, TableRegion};

use super::layout::{group_spans_into_lines, PageLayout, TextSpan};
use super::options::{PageMargins, ParseOptions};
use super::table_detector::TableDetector;

/// Anything that can hand out pages of a document.
///
/// `PdfParser` is the production implementation; tests provide pages from
/// memory.
pub trait PageSource: Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extract lines and tables from one page (0-indexed).
    fn extract_page(&self, page_index: usize) -> Result<PageContent>;
}

/// Converts page layouts into `PageContent`.
pub struct PageExtractor {
    margins: PageMargins,
    detect_tables: bool,
    detector: TableDetector,
}

impl PageExtractor {
    /// Create an extractor configured from parse options.
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            margins: options.margins,
            detect_tables: options.detect_tables,
            detector: TableDetector::new(),
        }
    }

    /// Build both extraction views of a page.
    pub fn extract(&self, layout: &PageLayout, page_index: usize) -> PageContent {
        let spans: Vec<TextSpan> = layout
            .spans
            .iter()
            .filter(|span| self.inside_margins(layout, span))
            .cloned()
            .collect();

        let lines = group_spans_into_lines(&spans)
            .into_iter()
            .filter_map(|line| {
                let text = line.text().trim().to_string();
                (!text.is_empty()).then(|| PageLine::new(text, layout.to_top(line.top()), page_index))
            })
            .collect();

        let tables = if self.detect_tables {
            let (detected, _) = self.detector.detect(spans, &layout.rules);
            detected
                .into_iter()
                .map(|table| {
                    let bbox = BBox::new(
                        table.left_x,
                        layout.to_top(table.top_y),
                        table.right_x,
                        layout.to_top(table.bottom_y),
                    );
                    TableRegion::new(bbox, table.cells, page_index)
                })
                .collect()
        } else {
            Vec::new()
        };

        PageContent::new(page_index, lines, tables)
    }

    fn inside_margins(&self, layout: &PageLayout, span: &TextSpan) -> bool {
        if self.margins.is_none() {
            return true;
        }
        let top = layout.to_top(span.top());
        let bottom = layout.to_top(span.bottom());
        top >= self.margins.top && bottom <= layout.height() - self.margins.bottom
    }
}

/// Extracted pages plus the skips recorded while reading them.
#[derive(Debug, Default)]
pub struct ExtractedPages {
    /// Page content by page index; skipped pages are present and empty
    pub pages: BTreeMap<usize, PageContent>,
    /// One `PageSkipped` per page that yielded nothing
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractedPages {
    /// Content of a page, if it was requested.
    pub fn get(&self, page_index: usize) -> Option<&PageContent> {
        self.pages.get(&page_index)
    }
}

/// Extract a set of pages, in parallel when enabled.
///
/// A page that fails or has no text is recorded as skipped and contributes
/// an empty `PageContent`; it never aborts its siblings.
pub fn extract_pages<S>(source: &S, indices: &[usize], options: &ParseOptions) -> ExtractedPages
where
    S: PageSource + ?Sized,
{
    let extract_one = |&index: &usize| (index, source.extract_page(index));

    let results: Vec<(usize, Result<PageContent>)> = if options.parallel && indices.len() > 1 {
        match build_pool(options.max_workers) {
            Some(pool) => pool.install(|| indices.par_iter().map(extract_one).collect()),
            None => indices.par_iter().map(extract_one).collect(),
        }
    } else {
        indices.iter().map(extract_one).collect()
    };

    let mut extracted = ExtractedPages::default();
    for (index, result) in results {
        let content = match result {
            Ok(content) if content.lines.is_empty() => {
                log::warn!("page {} has no extractable text", index + 1);
                extracted.diagnostics.push(Diagnostic::PageSkipped {
                    page_index: index,
                    reason: "no text layer".to_string(),
                });
                PageContent::empty(index)
            }
            Ok(content) => content,
            Err(e) => {
                log::warn!("page {} extraction failed: {}", index + 1, e);
                extracted.diagnostics.push(Diagnostic::PageSkipped {
                    page_index: index,
                    reason: e.to_string(),
                });
                PageContent::empty(index)
            }
        };
        extracted.pages.insert(index, content);
    }

    extracted
}

/// A dedicated pool when a worker limit is set; `None` uses rayon's global pool.
fn build_pool(max_workers: usize) -> Option<rayon::ThreadPool> {
    if max_workers == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(max_workers).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("could not build a {}-thread pool, using the global pool: {}", max_workers, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::layout::Rule;

    struct FakeSource {
        pages: Vec<Option<PageContent>>,
    }

    impl PageSource for FakeSource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn extract_page(&self, page_index: usize) -> Result<PageContent> {
            match self.pages.get(page_index) {
                Some(Some(content)) => Ok(content.clone()),
                Some(None) => Err(Error::TextExtract("broken stream".to_string())),
                None => Err(Error::PageOutOfRange(page_index, self.pages.len())),
            }
        }
    }

    fn page_with(index: usize, text: &str) -> PageContent {
        PageContent::new(index, vec![PageLine::new(text, 100.0, index)], vec![])
    }

    fn layout(spans: Vec<TextSpan>, rules: Vec<Rule>) -> PageLayout {
        PageLayout {
            x0: 0.0,
            y0: 0.0,
            x1: 595.0,
            y1: 842.0,
            spans,
            rules,
        }
    }

    #[test]
    fn test_extract_lines_top_down() {
        let extractor = PageExtractor::new(&ParseOptions::default());
        let page = layout(
            vec![
                TextSpan::new("第二行", 50.0, 700.0, 10.0),
                TextSpan::new("第一行", 50.0, 742.0, 10.0),
            ],
            vec![],
        );
        let content = extractor.extract(&page, 4);
        assert_eq!(content.lines.len(), 2);
        assert_eq!(content.lines[0].text, "第一行");
        assert!((content.lines[0].top - 92.0).abs() < 0.01);
        assert_eq!(content.lines[1].page_index, 4);
        assert!(content.tables.is_empty());
    }

    #[test]
    fn test_margins_drop_header_and_footer() {
        let options = ParseOptions::new().with_margins(PageMargins::report_default());
        let extractor = PageExtractor::new(&options);
        let page = layout(
            vec![
                TextSpan::new("running header", 50.0, 800.0, 10.0),
                TextSpan::new("body", 50.0, 500.0, 10.0),
                TextSpan::new("12 / 200", 280.0, 30.0, 10.0),
            ],
            vec![],
        );
        let content = extractor.extract(&page, 0);
        assert_eq!(content.lines.len(), 1);
        assert_eq!(content.lines[0].text, "body");
    }

    #[test]
    fn test_table_bbox_is_top_down() {
        let extractor = PageExtractor::new(&ParseOptions::default());
        let page = layout(
            vec![
                TextSpan::new("A", 50.0, 506.0, 10.0),
                TextSpan::new("B", 250.0, 506.0, 10.0),
                TextSpan::new("C", 50.0, 486.0, 10.0),
                TextSpan::new("D", 250.0, 486.0, 10.0),
            ],
            vec![
                Rule::horizontal(520.0, 40.0, 400.0),
                Rule::horizontal(500.0, 40.0, 400.0),
                Rule::horizontal(480.0, 40.0, 400.0),
                Rule::vertical(200.0, 480.0, 520.0),
            ],
        );
        let content = extractor.extract(&page, 0);
        assert_eq!(content.tables.len(), 1);
        let bbox = content.tables[0].bbox;
        assert_eq!(bbox.top, 322.0);
        assert_eq!(bbox.bottom, 362.0);
        // Lines still carry the covered text; override happens during assembly
        assert_eq!(content.lines.len(), 2);
    }

    #[test]
    fn test_extract_pages_records_skips() {
        let source = FakeSource {
            pages: vec![
                Some(page_with(0, "one")),
                None,
                Some(PageContent::empty(2)),
                Some(page_with(3, "four")),
            ],
        };

        let extracted = extract_pages(&source, &[0, 1, 2, 3], &ParseOptions::default());
        assert_eq!(extracted.pages.len(), 4);
        assert_eq!(extracted.diagnostics.len(), 2);
        assert!(extracted.get(1).is_some_and(PageContent::is_empty));
        assert_eq!(extracted.get(3).map(|p| p.lines[0].text.as_str()), Some("four"));
    }

    #[test]
    fn test_bounded_pool_keeps_order() {
        let source = FakeSource {
            pages: (0..16).map(|i| Some(page_with(i, &i.to_string()))).collect(),
        };
        let indices: Vec<usize> = (0..16).collect();
        let options = ParseOptions::new().with_max_workers(2);

        let extracted = extract_pages(&source, &indices, &options);
        let texts: Vec<String> = extracted
            .pages
            .values()
            .map(|p| p.lines[0].text.clone())
            .collect();
        let expected: Vec<String> = (0..16).map(|i| i.to_string()).collect();
        assert_eq!(texts, expected);
    }
}

//! End-to-end document assembly.
//!
//! Outline entries become a tree, the tree gets page ranges, the pages the
//! ranges touch are extracted once (in parallel when enabled), and every node
//! is assembled in depth-first order into the output sections.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;
use crate::metadata::build_metadata;
use crate::model::{Diagnostic, OutlineEntry, OutlineTree, ParsedDocument, PdfMetadata, Section};
use crate::parser::{extract_pages, PageSource, ParseOptions, PdfParser};
use crate::section::{
    build_tree, resolve_boundaries, NormalizedTitleMatcher, SectionAssembler, SectionWindow,
    TitleMatcher,
};

/// Turns outline entries and pages into a [`ParsedDocument`].
pub struct DocumentAssembler {
    options: ParseOptions,
    matcher: Box<dyn TitleMatcher>,
}

impl DocumentAssembler {
    /// Create an assembler using the default title matcher.
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            matcher: Box::new(NormalizedTitleMatcher),
        }
    }

    /// Replace the title matcher.
    pub fn with_matcher(mut self, matcher: impl TitleMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Build the document.
    ///
    /// Never fails: unreadable pages, malformed nesting and degenerate ranges
    /// are absorbed and listed in `diagnostics`.
    pub fn assemble<S>(&self, source: &S, entries: &[OutlineEntry], metadata: PdfMetadata) -> ParsedDocument
    where
        S: PageSource + ?Sized,
    {
        let page_count = source.page_count();
        let mut document = ParsedDocument::new(metadata);

        let (tree, diagnostics) = resolved_tree(entries, page_count);
        document.diagnostics.extend(diagnostics);

        let windows: Vec<SectionWindow> = tree
            .depth_first()
            .into_iter()
            .map(|id| SectionWindow::plan(&tree, id, page_count))
            .collect();

        let needed: BTreeSet<usize> = windows
            .iter()
            .flat_map(SectionWindow::pages)
            .filter(|page| *page < page_count)
            .collect();
        let needed: Vec<usize> = needed.into_iter().collect();

        log::debug!(
            "assembling {} sections from {} of {} pages",
            windows.len(),
            needed.len(),
            page_count
        );

        let extracted = extract_pages(source, &needed, &self.options);
        document.diagnostics.extend(extracted.diagnostics.iter().cloned());

        let assembler = SectionAssembler::new(self.matcher.as_ref(), self.options.title_match_threshold);
        for window in &windows {
            let node = tree.node(window.node);
            let assembled = assembler.assemble(&tree, window, &extracted.pages);
            document.diagnostics.extend(assembled.diagnostics);

            // Internal nodes only carry the text before their first child
            if node.is_leaf() || assembled.has_body {
                document.outline.push(Section::new(
                    node.section_id.clone(),
                    node.title.clone(),
                    node.page_anchor,
                    assembled.content,
                ));
            }
        }

        document
    }
}

/// Build and resolve the outline tree for a document of `page_count` pages.
pub fn resolved_tree(entries: &[OutlineEntry], page_count: usize) -> (OutlineTree, Vec<Diagnostic>) {
    let (mut tree, mut diagnostics) = build_tree(entries);
    diagnostics.extend(resolve_boundaries(&mut tree, page_count));
    (tree, diagnostics)
}

/// Parse a report file into sections with default options.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedDocument> {
    parse_file_with_options(path, ParseOptions::default())
}

/// Parse a report file into sections.
///
/// Fails only when the document cannot be opened (or, in strict mode, when
/// its outline cannot be read faithfully).
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<ParsedDocument> {
    let path = path.as_ref();
    let parser = PdfParser::open_with_options(path, options.clone())?;
    let document = parse_with_parser(&parser, path, options)?;

    log::info!(
        "parsed {}: {} sections, {} diagnostics",
        path.display(),
        document.section_count(),
        document.diagnostics.len()
    );
    Ok(document)
}

/// Parse a report held in memory. `file_name` drives metadata discovery.
pub fn parse_bytes(data: &[u8], file_name: &str, options: ParseOptions) -> Result<ParsedDocument> {
    let parser = PdfParser::from_bytes_with_options(data, options.clone())?;
    parse_with_parser(&parser, Path::new(file_name), options)
}

fn parse_with_parser(parser: &PdfParser, path: &Path, options: ParseOptions) -> Result<ParsedDocument> {
    let outline = parser.outline_entries()?;

    let info_title = parser.info_title();
    // The cover page is only read when the info dictionary has no title
    let cover = match info_title {
        Some(_) => None,
        None => parser.extract_page(0).ok(),
    };
    let metadata = build_metadata(path, info_title.as_deref(), cover.as_ref());

    let mut document = DocumentAssembler::new(options).assemble(parser, &outline.entries, metadata);
    document.diagnostics.splice(0..0, outline.diagnostics);
    Ok(document)
}

/// Open a report and return its resolved outline tree.
pub fn read_outline<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<(OutlineTree, Vec<Diagnostic>)> {
    let parser = PdfParser::open_with_options(path, options)?;
    let outline = parser.outline_entries()?;
    let (tree, mut diagnostics) = resolved_tree(&outline.entries, parser.page_count());
    diagnostics.splice(0..0, outline.diagnostics);
    Ok((tree, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, PageContent, PageLine, TableRegion};

    struct MemorySource {
        pages: Vec<PageContent>,
    }

    impl PageSource for MemorySource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn extract_page(&self, page_index: usize) -> Result<PageContent> {
            Ok(self.pages[page_index].clone())
        }
    }

    fn text_page(index: usize, lines: &[&str]) -> PageContent {
        let lines = lines
            .iter()
            .enumerate()
            .map(|(i, text)| PageLine::new(*text, 100.0 + 20.0 * i as f32, index))
            .collect();
        PageContent::new(index, lines, vec![])
    }

    fn source() -> MemorySource {
        MemorySource {
            pages: vec![
                text_page(0, &["示例股份有限公司", "2023年年度报告"]),
                text_page(1, &["第一节 重要提示", "董事会保证报告真实"]),
                text_page(2, &["第二节 公司简介", "一、公司信息", "股票简称 示例"]),
                PageContent::empty(3),
                text_page(4, &["二、联系人", "董事会秘书 张三"]),
            ],
        }
    }

    fn entries() -> Vec<OutlineEntry> {
        vec![
            OutlineEntry::new("第一节 重要提示", 1, 1),
            OutlineEntry::new("第二节 公司简介", 1, 2),
            OutlineEntry::new("一、公司信息", 2, 2),
            OutlineEntry::new("二、联系人", 2, 4),
        ]
    }

    #[test]
    fn test_assemble_document() {
        let doc = DocumentAssembler::new(ParseOptions::default()).assemble(
            &source(),
            &entries(),
            PdfMetadata::default(),
        );

        let ids: Vec<&str> = doc.outline.iter().map(Section::section_id).collect();
        // Section 2 has no text of its own before its first child
        assert_eq!(ids, vec!["1", "2.1", "2.2"]);

        let first = doc.section("1").unwrap();
        assert_eq!(first.content, "第一节 重要提示\n董事会保证报告真实");
        assert_eq!(first.metadata.page, 2);

        let info = doc.section("2.1").unwrap();
        assert_eq!(info.content, "一、公司信息\n股票简称 示例");

        assert_eq!(doc.section("2.2").unwrap().content, "二、联系人\n董事会秘书 张三");

        assert!(doc.has_skipped_pages());
        assert!(doc
            .diagnostics
            .contains(&Diagnostic::PageSkipped { page_index: 3, reason: "no text layer".to_string() }));
    }

    #[test]
    fn test_empty_outline_document() {
        let doc = DocumentAssembler::new(ParseOptions::default()).assemble(
            &source(),
            &[],
            PdfMetadata::default(),
        );
        assert!(doc.outline.is_empty());
        assert_eq!(doc.diagnostics, vec![Diagnostic::EmptyOutline]);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["outline"], serde_json::json!([]));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let parallel = DocumentAssembler::new(ParseOptions::default()).assemble(
            &source(),
            &entries(),
            PdfMetadata::default(),
        );
        let sequential = DocumentAssembler::new(ParseOptions::new().sequential()).assemble(
            &source(),
            &entries(),
            PdfMetadata::default(),
        );
        assert_eq!(parallel.outline, sequential.outline);
    }

    #[test]
    fn test_custom_matcher() {
        struct ExactMatcher;
        impl TitleMatcher for ExactMatcher {
            fn confidence(&self, candidate: &str, title: &str) -> f32 {
                if candidate == title {
                    1.0
                } else {
                    0.0
                }
            }
        }

        let source = MemorySource {
            pages: vec![text_page(0, &["前言", "第一节重要提示", "正文"])],
        };
        let entries = vec![OutlineEntry::new("第一节 重要提示", 1, 0)];
        let doc = DocumentAssembler::new(ParseOptions::default())
            .with_matcher(ExactMatcher)
            .assemble(&source, &entries, PdfMetadata::default());

        // No exact line: the whole page is kept
        assert_eq!(doc.outline[0].content, "前言\n第一节重要提示\n正文");
        assert!(matches!(doc.diagnostics[0], Diagnostic::TitleNotFound { .. }));
    }

    #[test]
    fn test_repeated_sibling_titles_do_not_overlap() {
        let source = MemorySource {
            pages: vec![text_page(0, &["附注", "first body", "附注", "second body"])],
        };
        let entries = vec![OutlineEntry::new("附注", 1, 0), OutlineEntry::new("附注", 1, 0)];
        let doc = DocumentAssembler::new(ParseOptions::default()).assemble(
            &source,
            &entries,
            PdfMetadata::default(),
        );

        assert_eq!(doc.outline.len(), 2);
        assert_eq!(doc.outline[0].content, "附注\nfirst body");
        assert_eq!(doc.outline[1].content, "附注\nsecond body");
        assert!(doc.diagnostics.is_empty());
    }

    #[test]
    fn test_table_rows_in_section() {
        let table = TableRegion::new(
            BBox::new(40.0, 118.0, 500.0, 150.0),
            vec![vec!["营业收入".into(), "1,000".into()], vec!["净利润".into(), "200".into()]],
            0,
        );
        let mut page = text_page(0, &["主要会计数据", "营业收入 1,000", "净利润 200"]);
        page.tables.push(table);
        let source = MemorySource { pages: vec![page] };

        let doc = DocumentAssembler::new(ParseOptions::default()).assemble(
            &source,
            &[OutlineEntry::new("主要会计数据", 1, 0)],
            PdfMetadata::default(),
        );
        assert_eq!(doc.outline[0].content, "主要会计数据\n营业收入 1,000\n净利润 200");
    }
}

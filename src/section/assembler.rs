//! Section content assembly.
//!
//! A section's text is read from its window of pages. On every page, plain
//! lines covered by a detected table are replaced by that table's rows,
//! placed where the table sits. The first page is cut at the section's own
//! title line; the section stops at the title of the node that ends it
//! (its first child for an internal node, otherwise its resolved boundary).
//! When several bookmarks start on the same page, each title is searched
//! below the title of the bookmark declared before it, so repeated titles
//! resolve to successive lines.
//!
//! Tables are never split by a title cut: a table belongs to the section in
//! which its top edge lies.

use std::collections::BTreeMap;

use crate::model::{Diagnostic, NodeId, OutlineTree, PageContent, PageLine, TableRegion};

use super::matcher::{best_match, TitleMatcher};

/// Vertical slack when deciding whether a line lies inside a table.
const TABLE_COVER_TOLERANCE: f32 = 1.0;

/// Where a section stops: the title of `node`, looked for on `page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopCut {
    /// Node whose title ends the section
    pub node: NodeId,
    /// Page the title is expected on (0-indexed)
    pub page: usize,
}

/// Pages a section reads and where its cuts fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionWindow {
    /// The section's node
    pub node: NodeId,
    /// First page, cut at the section's title (0-indexed)
    pub start_page: usize,
    /// Node declared just before this one when it starts on the same page
    pub after: Option<NodeId>,
    /// End of the pages read in full (exclusive)
    pub end_page: usize,
    /// Closing title cut; on `start_page` for same-page stops, else the
    /// tail page `end_page` read only up to the title
    pub stop: Option<StopCut>,
}

impl SectionWindow {
    /// Plan the window of a node with a resolved range.
    ///
    /// Nodes without a range (unresolved trees) get an empty window.
    pub fn plan(tree: &OutlineTree, id: NodeId, page_count: usize) -> Self {
        let node = tree.node(id);
        let Some(range) = node.range else {
            return Self {
                node: id,
                start_page: node.page_anchor,
                after: None,
                end_page: node.page_anchor,
                stop: None,
            };
        };

        let start_page = range.start_page;
        let after = same_page_predecessor(tree, id, start_page);
        let stop_node = node.children.first().copied().or(range.boundary);

        let Some(stop_node) = stop_node else {
            return Self {
                node: id,
                start_page,
                after,
                end_page: range.end_page,
                stop: None,
            };
        };

        let anchor = tree.node(stop_node).page_anchor;
        if anchor <= start_page {
            // The next title shares the first page (or precedes it)
            Self {
                node: id,
                start_page,
                after,
                end_page: start_page + 1,
                stop: Some(StopCut {
                    node: stop_node,
                    page: start_page,
                }),
            }
        } else if anchor >= page_count {
            Self {
                node: id,
                start_page,
                after,
                end_page: page_count,
                stop: None,
            }
        } else {
            Self {
                node: id,
                start_page,
                after,
                end_page: anchor,
                stop: Some(StopCut {
                    node: stop_node,
                    page: anchor,
                }),
            }
        }
    }

    /// Every page the window touches, in order.
    pub fn pages(&self) -> impl Iterator<Item = usize> {
        let tail = self
            .stop
            .map(|cut| cut.page)
            .filter(|page| *page >= self.end_page);
        (self.start_page..self.end_page).chain(tail)
    }

    fn is_tail(&self, page: usize) -> bool {
        page >= self.end_page
    }
}

/// Assembled text of one section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledSection {
    /// Lines joined by `\n`
    pub content: String,
    /// Whether any non-blank line besides the title line was emitted
    pub has_body: bool,
    /// Title lookups that failed
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds section content from extracted pages.
pub struct SectionAssembler<'a> {
    matcher: &'a dyn TitleMatcher,
    threshold: f32,
}

impl<'a> SectionAssembler<'a> {
    /// Create an assembler with a title matcher and its acceptance threshold.
    pub fn new(matcher: &'a dyn TitleMatcher, threshold: f32) -> Self {
        Self { matcher, threshold }
    }

    /// Assemble one section. Pages missing from `pages` count as empty.
    pub fn assemble(
        &self,
        tree: &OutlineTree,
        window: &SectionWindow,
        pages: &BTreeMap<usize, PageContent>,
    ) -> AssembledSection {
        let node = tree.node(window.node);
        let mut out = AssembledSection::default();
        let mut lines: Vec<String> = Vec::new();

        // Own title on the first page, below the titles declared before it
        let start_page = pages.get(&window.start_page);
        let floor = start_page.and_then(|page| self.floor_line(tree, window.after, page));
        let title_idx = start_page.and_then(|page| self.match_below(page, &node.title, floor));
        if title_idx.is_none() && start_page.is_some_and(|p| !p.lines.is_empty()) {
            log::debug!(
                "title of section {} not found on page {}",
                node.section_id,
                window.start_page + 1
            );
            out.diagnostics.push(Diagnostic::TitleNotFound {
                section_id: node.section_id.clone(),
                page_index: window.start_page,
            });
        }

        for page_index in window.pages() {
            let Some(page) = pages.get(&page_index) else {
                continue;
            };

            let (from, title_line, stop_floor) = if page_index == window.start_page {
                (title_idx.map(|i| page.lines[i].top), title_idx, title_idx.or(floor))
            } else {
                (None, None, None)
            };

            let until = match window.stop {
                Some(cut) if cut.page == page_index => {
                    let stop_title = &tree.node(cut.node).title;
                    match self.match_below(page, stop_title, stop_floor) {
                        Some(i) => Some(page.lines[i].top),
                        // Without its title the tail page belongs to the next section
                        None if window.is_tail(page_index) => continue,
                        // Likewise the rest of a shared page; keep only the own title
                        None => match title_line {
                            Some(i) => {
                                lines.push(page.lines[i].text.clone());
                                continue;
                            }
                            None => None,
                        },
                    }
                }
                _ => None,
            };

            for (text, is_title) in merge_page(page, from, until, title_line) {
                if !is_title && !text.trim().is_empty() {
                    out.has_body = true;
                }
                lines.push(text);
            }
        }

        out.content = lines.join("\n");
        out
    }

    /// Index of the best line matching `title` strictly below line `floor`.
    fn match_below(&self, page: &PageContent, title: &str, floor: Option<usize>) -> Option<usize> {
        let skip = floor.map_or(0, |f| {
            let top = page.lines[f].top;
            page.lines.iter().take_while(|l| l.top <= top).count()
        });
        best_match(self.matcher, &page.lines[skip..], title, self.threshold).map(|i| skip + i)
    }

    /// Lowest title line claimed by `after` and the same-page bookmarks
    /// declared before it. A missing title passes its own floor through.
    fn floor_line(&self, tree: &OutlineTree, after: Option<NodeId>, page: &PageContent) -> Option<usize> {
        let prev = after?;
        let prev_floor = self.floor_line(tree, same_page_predecessor(tree, prev, page.page_index), page);
        self.match_below(page, &tree.node(prev).title, prev_floor).or(prev_floor)
    }
}

/// The node declared before `id`, if it starts on `page`.
fn same_page_predecessor(tree: &OutlineTree, id: NodeId, page: usize) -> Option<NodeId> {
    tree.preceding(id).filter(|&prev| {
        let node = tree.node(prev);
        node.range.map_or(node.page_anchor, |r| r.start_page) == page
    })
}

/// One page's content between two cuts, tables substituted for the lines
/// they cover. Returns each line with whether it is the matched title line.
fn merge_page(
    page: &PageContent,
    from: Option<f32>,
    until: Option<f32>,
    title_line: Option<usize>,
) -> Vec<(String, bool)> {
    let in_window = |top: f32| from.map_or(true, |f| top >= f) && until.map_or(true, |u| top < u);
    let covered = |line: &PageLine| {
        page.tables
            .iter()
            .any(|t| t.bbox.covers_vertically(line.top, TABLE_COVER_TOLERANCE))
    };

    enum Item<'p> {
        Line(&'p PageLine, bool),
        Table(&'p TableRegion),
    }

    let mut items: Vec<(f32, Item<'_>)> = page
        .lines
        .iter()
        .enumerate()
        .filter(|&(_, line)| in_window(line.top) && !covered(line))
        .map(|(i, line)| (line.top, Item::Line(line, Some(i) == title_line)))
        .chain(
            page.tables
                .iter()
                .filter(|t| in_window(t.bbox.top))
                .map(|t| (t.bbox.top, Item::Table(t))),
        )
        .collect();

    items.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = Vec::new();
    for (_, item) in items {
        match item {
            Item::Line(line, is_title) => out.push((line.text.clone(), is_title)),
            Item::Table(table) => out.extend(table.row_lines().into_iter().map(|row| (row, false))),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, OutlineEntry};
    use crate::section::{build_tree, resolve_boundaries, NormalizedTitleMatcher};

    fn line(text: &str, top: f32, page: usize) -> PageLine {
        PageLine::new(text, top, page)
    }

    fn page(index: usize, lines: Vec<PageLine>, tables: Vec<TableRegion>) -> PageContent {
        PageContent::new(index, lines, tables)
    }

    fn tree_for(entries: &[OutlineEntry], page_count: usize) -> OutlineTree {
        let (mut tree, _) = build_tree(entries);
        resolve_boundaries(&mut tree, page_count);
        tree
    }

    fn assemble(
        tree: &OutlineTree,
        section_id: &str,
        pages: &BTreeMap<usize, PageContent>,
        page_count: usize,
    ) -> AssembledSection {
        let id = tree.find(section_id).unwrap();
        let window = SectionWindow::plan(tree, id, page_count);
        SectionAssembler::new(&NormalizedTitleMatcher, 0.6).assemble(tree, &window, pages)
    }

    fn pages_of(list: Vec<PageContent>) -> BTreeMap<usize, PageContent> {
        list.into_iter().map(|p| (p.page_index, p)).collect()
    }

    #[test]
    fn test_window_plans() {
        let entries = vec![
            OutlineEntry::new("A", 1, 0),
            OutlineEntry::new("A1", 2, 2),
            OutlineEntry::new("B", 1, 4),
            OutlineEntry::new("C", 1, 4),
        ];
        let tree = tree_for(&entries, 6);

        let a = SectionWindow::plan(&tree, tree.find("1").unwrap(), 6);
        assert_eq!((a.start_page, a.end_page), (0, 2));
        assert_eq!(a.stop.map(|s| s.page), Some(2));
        assert_eq!(a.pages().collect::<Vec<_>>(), vec![0, 1, 2]);

        let a1 = SectionWindow::plan(&tree, tree.find("1.1").unwrap(), 6);
        assert_eq!(a1.pages().collect::<Vec<_>>(), vec![2, 3, 4]);

        // Same-page stop: one page, cut inside it
        let b = SectionWindow::plan(&tree, tree.find("2").unwrap(), 6);
        assert_eq!(b.pages().collect::<Vec<_>>(), vec![4]);
        assert_eq!(b.stop.map(|s| s.page), Some(4));

        let c = SectionWindow::plan(&tree, tree.find("3").unwrap(), 6);
        assert_eq!(c.pages().collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(c.stop, None);
    }

    #[test]
    fn test_start_and_tail_truncation() {
        let entries = vec![
            OutlineEntry::new("第一节 公司简介", 1, 0),
            OutlineEntry::new("第二节 经营情况", 1, 1),
        ];
        let tree = tree_for(&entries, 2);
        let pages = pages_of(vec![
            page(
                0,
                vec![
                    line("目录页眉", 50.0, 0),
                    line("第一节 公司简介", 100.0, 0),
                    line("公司名称：示例股份", 130.0, 0),
                ],
                vec![],
            ),
            page(
                1,
                vec![
                    line("接上页：注册地址", 90.0, 1),
                    line("第二节 经营情况", 200.0, 1),
                    line("报告期内营业收入增长", 230.0, 1),
                ],
                vec![],
            ),
        ]);

        let first = assemble(&tree, "1", &pages, 2);
        assert_eq!(first.content, "第一节 公司简介\n公司名称：示例股份\n接上页：注册地址");
        assert!(first.has_body);
        assert!(first.diagnostics.is_empty());

        let second = assemble(&tree, "2", &pages, 2);
        assert_eq!(second.content, "第二节 经营情况\n报告期内营业收入增长");
    }

    #[test]
    fn test_table_override_in_reading_order() {
        let entries = vec![OutlineEntry::new("主要会计数据", 1, 0)];
        let tree = tree_for(&entries, 1);
        let table = TableRegion::new(
            BBox::new(40.0, 150.0, 500.0, 200.0),
            vec![
                vec!["项目".into(), "2023年".into(), "2022年".into()],
                vec!["营业收入".into(), "1,000".into(), "900".into()],
            ],
            0,
        );
        let pages = pages_of(vec![page(
            0,
            vec![
                line("主要会计数据", 100.0, 0),
                line("单位：元", 130.0, 0),
                line("项目 2023年 2022年", 155.0, 0),
                line("营业收入 1,000 900", 180.0, 0),
                line("注：以上数据经审计", 220.0, 0),
            ],
            vec![table],
        )]);

        let result = assemble(&tree, "1", &pages, 1);
        assert_eq!(
            result.content,
            "主要会计数据\n单位：元\n项目 2023年 2022年\n营业收入 1,000 900\n注：以上数据经审计"
        );
        // The covered raw lines are gone; only the table rows carry that text
        assert_eq!(result.content.matches("营业收入").count(), 1);
    }

    #[test]
    fn test_table_wins_over_next_title() {
        // The next title sits inside a table that starts above it
        let entries = vec![
            OutlineEntry::new("一、股本变动", 1, 0),
            OutlineEntry::new("二、股东情况", 1, 0),
        ];
        let tree = tree_for(&entries, 1);
        let table = TableRegion::new(
            BBox::new(40.0, 250.0, 500.0, 350.0),
            vec![vec!["股份类别".into(), "数量".into()], vec!["A股".into(), "100".into()]],
            0,
        );
        let pages = pages_of(vec![page(
            0,
            vec![
                line("一、股本变动", 100.0, 0),
                line("报告期内股本未变动", 150.0, 0),
                line("二、股东情况", 300.0, 0),
                line("前十名股东", 400.0, 0),
            ],
            vec![table],
        )]);

        let first = assemble(&tree, "1", &pages, 1);
        assert_eq!(first.content, "一、股本变动\n报告期内股本未变动\n股份类别 数量\nA股 100");

        let second = assemble(&tree, "2", &pages, 1);
        assert_eq!(second.content, "前十名股东");
        assert!(!second.content.contains("股份类别"));
    }

    #[test]
    fn test_skipped_middle_page() {
        let entries = vec![
            OutlineEntry::new("第五节 重要事项", 1, 0),
            OutlineEntry::new("第六节 股份变动", 1, 3),
        ];
        let tree = tree_for(&entries, 4);
        let pages = pages_of(vec![
            page(0, vec![line("第五节 重要事项", 100.0, 0), line("事项一", 130.0, 0)], vec![]),
            PageContent::empty(1),
            page(2, vec![line("事项三", 100.0, 2)], vec![]),
            page(3, vec![line("第六节 股份变动", 100.0, 3)], vec![]),
        ]);

        let result = assemble(&tree, "1", &pages, 4);
        assert_eq!(result.content, "第五节 重要事项\n事项一\n事项三");
    }

    #[test]
    fn test_tail_page_without_title_is_not_used() {
        let entries = vec![OutlineEntry::new("A", 1, 0), OutlineEntry::new("B", 1, 1)];
        let tree = tree_for(&entries, 2);
        let pages = pages_of(vec![
            page(0, vec![line("A", 100.0, 0), line("a body", 120.0, 0)], vec![]),
            page(1, vec![line("scanned caption", 100.0, 1)], vec![]),
        ]);
        let result = assemble(&tree, "1", &pages, 2);
        assert_eq!(result.content, "A\na body");
    }

    #[test]
    fn test_internal_node_own_content() {
        let entries = vec![
            OutlineEntry::new("第十节 财务报告", 1, 0),
            OutlineEntry::new("一、审计报告", 2, 0),
            OutlineEntry::new("第十一节 备查文件", 1, 1),
            OutlineEntry::new("一、文件目录", 2, 1),
        ];
        let tree = tree_for(&entries, 2);
        let pages = pages_of(vec![
            page(
                0,
                vec![
                    line("第十节 财务报告", 100.0, 0),
                    line("一、审计报告", 130.0, 0),
                    line("审计意见：标准无保留", 160.0, 0),
                ],
                vec![],
            ),
            page(
                1,
                vec![
                    line("第十一节 备查文件", 100.0, 1),
                    line("本节列示备查文件", 120.0, 1),
                    line("一、文件目录", 140.0, 1),
                    line("载有签名的财务报表", 160.0, 1),
                ],
                vec![],
            ),
        ]);

        let tenth = assemble(&tree, "1", &pages, 2);
        assert_eq!(tenth.content, "第十节 财务报告");
        assert!(!tenth.has_body);

        let audit = assemble(&tree, "1.1", &pages, 2);
        assert_eq!(audit.content, "一、审计报告\n审计意见：标准无保留");

        let eleventh = assemble(&tree, "2", &pages, 2);
        assert_eq!(eleventh.content, "第十一节 备查文件\n本节列示备查文件");
        assert!(eleventh.has_body);
    }

    #[test]
    fn test_repeated_titles_on_one_page() {
        let entries = vec![OutlineEntry::new("附注", 1, 0), OutlineEntry::new("附注", 1, 0)];
        let tree = tree_for(&entries, 1);
        let pages = pages_of(vec![page(
            0,
            vec![
                line("附注", 100.0, 0),
                line("first body", 130.0, 0),
                line("附注", 160.0, 0),
                line("second body", 190.0, 0),
            ],
            vec![],
        )]);

        let second = SectionWindow::plan(&tree, tree.find("2").unwrap(), 1);
        assert_eq!(second.after, tree.find("1"));

        let first = assemble(&tree, "1", &pages, 1);
        assert_eq!(first.content, "附注\nfirst body");

        let second = assemble(&tree, "2", &pages, 1);
        assert_eq!(second.content, "附注\nsecond body");
        assert!(second.diagnostics.is_empty());
    }

    #[test]
    fn test_three_repeated_titles_chain() {
        let entries = vec![
            OutlineEntry::new("说明", 1, 0),
            OutlineEntry::new("说明", 1, 0),
            OutlineEntry::new("说明", 1, 0),
        ];
        let tree = tree_for(&entries, 1);
        let pages = pages_of(vec![page(
            0,
            vec![
                line("说明", 100.0, 0),
                line("one", 120.0, 0),
                line("说明", 140.0, 0),
                line("two", 160.0, 0),
                line("说明", 180.0, 0),
                line("three", 200.0, 0),
            ],
            vec![],
        )]);

        assert_eq!(assemble(&tree, "2", &pages, 1).content, "说明\ntwo");
        assert_eq!(assemble(&tree, "3", &pages, 1).content, "说明\nthree");
    }

    #[test]
    fn test_missing_child_title_keeps_parent_to_its_title() {
        let entries = vec![
            OutlineEntry::new("第九节 公司治理", 1, 0),
            OutlineEntry::new("一、治理概况", 2, 0),
        ];
        let tree = tree_for(&entries, 1);
        let pages = pages_of(vec![page(
            0,
            vec![
                line("第九节 公司治理", 100.0, 0),
                line("公司严格遵守法规", 130.0, 0),
                line("董事会共召开八次会议", 160.0, 0),
            ],
            vec![],
        )]);

        let parent = assemble(&tree, "1", &pages, 1);
        assert_eq!(parent.content, "第九节 公司治理");
        assert!(!parent.has_body);
    }

    #[test]
    fn test_title_not_found_keeps_whole_page() {
        let entries = vec![OutlineEntry::new("释义", 1, 0)];
        let tree = tree_for(&entries, 1);
        let pages = pages_of(vec![page(0, vec![line("本公司 指 示例股份", 100.0, 0)], vec![])]);

        let result = assemble(&tree, "1", &pages, 1);
        assert_eq!(result.content, "本公司 指 示例股份");
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::TitleNotFound {
                section_id: "1".to_string(),
                page_index: 0,
            }]
        );
    }

    #[test]
    fn test_idempotent() {
        let entries = vec![
            OutlineEntry::new("第一节", 1, 0),
            OutlineEntry::new("第二节", 1, 1),
        ];
        let tree = tree_for(&entries, 2);
        let pages = pages_of(vec![
            page(0, vec![line("第一节", 100.0, 0), line("正文", 120.0, 0)], vec![]),
            page(1, vec![line("第二节", 100.0, 1)], vec![]),
        ]);
        let a = assemble(&tree, "1", &pages, 2);
        let b = assemble(&tree, "1", &pages, 2);
        assert_eq!(a, b);
    }
}

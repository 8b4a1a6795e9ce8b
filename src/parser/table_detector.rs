//! Table detection.
//!
//! Two passes run over a page. The ruled pass builds grids from the drawn
//! horizontal and vertical rules, which is how most financial statements
//! in annual reports are typeset. The stream pass then looks at the spans
//! that are left over and finds tables from text alignment alone, in the
//! manner of Camelot's Stream mode.
//!
//! All coordinates here are PDF user space (Y grows upward).

use std::collections::{HashMap, HashSet};

use super::layout::{group_spans_into_lines, is_spaceless_script_char, Rule, TextSpan};

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Top edge (highest Y)
    pub top_y: f32,
    /// Bottom edge (lowest Y)
    pub bottom_y: f32,
    /// Left X boundary
    pub left_x: f32,
    /// Right X boundary
    pub right_x: f32,
    /// Column left edges
    pub columns: Vec<f32>,
    /// Cell text, row-major, top row first
    pub cells: Vec<Vec<String>>,
}

impl DetectedTable {
    /// Number of rows with at least one non-empty cell.
    pub fn filled_rows(&self) -> usize {
        self.cells
            .iter()
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .count()
    }
}

/// A row of text spans in a table.
#[derive(Debug, Clone)]
struct TableRowData {
    /// Spans in this row, sorted by X
    spans: Vec<TextSpan>,
    /// Positions of `spans` in the detector input
    indices: Vec<usize>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns for stream tables (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
    /// Largest vertical gap between consecutive rules of one ruled table
    pub max_rule_gap: f32,
    /// Tolerance when snapping rules together (points)
    pub snap_tolerance: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 8,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            max_rule_gap: 40.0,
            snap_tolerance: 2.0,
        }
    }
}

/// Detects tables from spans and rules.
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: TableDetectorConfig::default(),
        }
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in the given spans.
    ///
    /// Returns detected tables (top to bottom) and the spans that were NOT
    /// part of any table.
    pub fn detect(
        &self,
        spans: Vec<TextSpan>,
        rules: &[Rule],
    ) -> (Vec<DetectedTable>, Vec<TextSpan>) {
        log::debug!(
            "TableDetector: starting with {} spans, {} rules",
            spans.len(),
            rules.len()
        );

        let (mut tables, remaining) = self.detect_ruled(spans, rules);
        let (stream_tables, remaining) = self.detect_stream(remaining);
        tables.extend(stream_tables);

        tables.sort_by(|a, b| {
            b.top_y
                .partial_cmp(&a.top_y)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        (tables, remaining)
    }

    /// Ruled pass: grids delimited by drawn rules.
    fn detect_ruled(
        &self,
        spans: Vec<TextSpan>,
        rules: &[Rule],
    ) -> (Vec<DetectedTable>, Vec<TextSpan>) {
        let mut horizontals: Vec<Rule> = rules.iter().copied().filter(Rule::is_horizontal).collect();
        let verticals: Vec<Rule> = rules.iter().copied().filter(Rule::is_vertical).collect();

        if horizontals.len() < 2 {
            return (vec![], spans);
        }

        horizontals.sort_by(|a, b| b.y0.partial_cmp(&a.y0).unwrap_or(std::cmp::Ordering::Equal));

        let clusters = self.cluster_horizontals(&horizontals, &verticals);
        log::debug!("TableDetector: {} ruled clusters", clusters.len());

        let mut used: HashSet<usize> = HashSet::new();
        let mut tables = Vec::new();

        for cluster in clusters {
            if let Some((table, members)) = self.build_grid(&cluster, &verticals, &spans, &used) {
                log::debug!(
                    "TableDetector: ruled table {}x{} at y {:.1}..{:.1}",
                    table.cells.len(),
                    table.columns.len(),
                    table.top_y,
                    table.bottom_y
                );
                used.extend(members);
                tables.push(table);
            }
        }

        let remaining = spans
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(_, span)| span)
            .collect();

        (tables, remaining)
    }

    /// Group horizontal rules (sorted top-down) into candidate tables.
    fn cluster_horizontals(&self, horizontals: &[Rule], verticals: &[Rule]) -> Vec<Vec<Rule>> {
        let mut clusters: Vec<Vec<Rule>> = Vec::new();

        for rule in horizontals {
            let joined = clusters.last_mut().is_some_and(|cluster| {
                let left = cluster.iter().map(|r| r.x0).fold(f32::MAX, f32::min);
                let right = cluster.iter().map(|r| r.x1).fold(f32::MIN, f32::max);
                let lowest = cluster.iter().map(|r| r.y0).fold(f32::MAX, f32::min);

                let overlap = rule.x1.min(right) - rule.x0.max(left);
                let shorter = (rule.x1 - rule.x0).min(right - left);
                if overlap < shorter * 0.5 {
                    return false;
                }

                let gap = lowest - rule.y0;
                gap <= self.config.max_rule_gap
                    || verticals.iter().any(|v| {
                        v.x0 >= left - self.config.snap_tolerance
                            && v.x0 <= right + self.config.snap_tolerance
                            && v.y0 <= rule.y0 + self.config.snap_tolerance
                            && v.y1 >= lowest - self.config.snap_tolerance
                    })
            });

            if joined {
                if let Some(cluster) = clusters.last_mut() {
                    cluster.push(*rule);
                }
            } else {
                clusters.push(vec![*rule]);
            }
        }

        clusters
    }

    /// Build a grid from one rule cluster and fill it with spans.
    ///
    /// Returns the table and the indices of the spans it consumed.
    fn build_grid(
        &self,
        cluster: &[Rule],
        verticals: &[Rule],
        spans: &[TextSpan],
        used: &HashSet<usize>,
    ) -> Option<(DetectedTable, Vec<usize>)> {
        let tol = self.config.snap_tolerance;

        let row_edges = snap_values(cluster.iter().map(|r| r.y0), tol, true);
        if row_edges.len() < 2 {
            return None;
        }

        let left_x = cluster.iter().map(|r| r.x0).fold(f32::MAX, f32::min);
        let right_x = cluster.iter().map(|r| r.x1).fold(f32::MIN, f32::max);
        let top_y = row_edges[0];
        let bottom_y = row_edges[row_edges.len() - 1];

        let inner_verticals = verticals.iter().filter(|v| {
            v.x0 > left_x + tol
                && v.x0 < right_x - tol
                && v.y1.min(top_y) - v.y0.max(bottom_y) > 0.0
        });
        let mut col_edges = snap_values(inner_verticals.map(|v| v.x0), tol, false);
        col_edges.insert(0, left_x);
        col_edges.push(right_x);

        let columns = col_edges.len() - 1;
        let rows = row_edges.len() - 1;
        let mut buckets: Vec<Vec<Vec<TextSpan>>> = vec![vec![Vec::new(); columns]; rows];
        let mut members = Vec::new();

        for (i, span) in spans.iter().enumerate() {
            if used.contains(&i) {
                continue;
            }
            let (cx, cy) = (span.center_x(), span.center_y());
            if cx < left_x || cx > right_x || cy > top_y || cy < bottom_y {
                continue;
            }
            let row = row_edges
                .windows(2)
                .position(|w| cy <= w[0] && cy >= w[1])
                .unwrap_or(rows - 1);
            let col = col_edges
                .windows(2)
                .position(|w| cx >= w[0] && cx <= w[1])
                .unwrap_or(columns - 1);
            buckets[row][col].push(span.clone());
            members.push(i);
        }

        let mut cells: Vec<Vec<String>> = buckets
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell_text(&cell)).collect())
            .collect();

        // Open tables (no inner verticals) keep their column structure in span gaps
        if columns == 1 {
            cells = cells
                .into_iter()
                .map(|row| row.into_iter().flat_map(|c| split_gapped(&c)).collect())
                .collect();
        }

        let table = DetectedTable {
            top_y,
            bottom_y,
            left_x,
            right_x,
            columns: col_edges[..columns].to_vec(),
            cells,
        };

        if table.filled_rows() < self.config.min_rows {
            log::debug!(
                "TableDetector: dropping ruled cluster with {} filled rows",
                table.filled_rows()
            );
            return None;
        }

        Some((table, members))
    }

    /// Stream pass: tables inferred from text alignment.
    fn detect_stream(&self, spans: Vec<TextSpan>) -> (Vec<DetectedTable>, Vec<TextSpan>) {
        if spans.len() < self.config.min_rows * self.config.min_columns {
            log::debug!(
                "TableDetector: not enough spans ({} < {})",
                spans.len(),
                self.config.min_rows * self.config.min_columns
            );
            return (vec![], spans);
        }

        // Step 1: Group spans into rows by Y position
        let rows = self.group_into_rows(&spans);
        log::debug!("TableDetector: grouped into {} rows", rows.len());

        if rows.len() < self.config.min_rows {
            return (vec![], spans);
        }

        // Step 2: Detect column boundaries from text edges
        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: detected {} columns at positions: {:?}",
            columns.len(),
            columns
        );

        if columns.len() < self.config.min_columns {
            return (vec![], spans);
        }

        // Step 3: Find table regions (contiguous rows with consistent column alignment)
        let table_regions = self.find_table_regions(&rows, &columns);
        log::debug!("TableDetector: found {} table regions", table_regions.len());

        let mut detected_tables = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for (start_row, end_row) in table_regions {
            let table_rows = &rows[start_row..=end_row];

            // Re-detect columns for this specific table region
            let table_columns = self.detect_columns(table_rows);

            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, detected as list pattern");
                continue;
            }

            let region_spans = || table_rows.iter().flat_map(|r| r.spans.iter());
            let top_y = region_spans().map(TextSpan::top).fold(f32::MIN, f32::max);
            let bottom_y = region_spans().map(TextSpan::bottom).fold(f32::MAX, f32::min);
            let left_x = region_spans().map(|s| s.x).fold(f32::MAX, f32::min);
            let right_x = region_spans().map(|s| s.x + s.width).fold(f32::MIN, f32::max);

            let cells = table_rows
                .iter()
                .map(|row| {
                    let mut contents: Vec<Vec<TextSpan>> = vec![Vec::new(); table_columns.len()];
                    for span in &row.spans {
                        let col = find_column_for_span(span.x, &table_columns, right_x);
                        if col < contents.len() {
                            contents[col].push(span.clone());
                        }
                    }
                    contents.iter().map(|c| cell_text(c)).collect()
                })
                .collect();

            used.extend(table_rows.iter().flat_map(|r| r.indices.iter().copied()));

            detected_tables.push(DetectedTable {
                top_y,
                bottom_y,
                left_x,
                right_x,
                columns: table_columns,
                cells,
            });
        }

        let unused_spans = spans
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(_, span)| span)
            .collect();

        (detected_tables, unused_spans)
    }

    /// Group spans into rows by Y position.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        if spans.is_empty() {
            return vec![];
        }

        // Sort by Y (descending for PDF coords) then X
        let mut order: Vec<usize> = (0..spans.len()).collect();
        order.sort_by(|&a, &b| {
            spans[b]
                .y
                .partial_cmp(&spans[a].y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    spans[a]
                        .x
                        .partial_cmp(&spans[b].x)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_y: Option<f32> = None;

        let flush = |indices: Vec<usize>, rows: &mut Vec<TableRowData>| {
            rows.push(TableRowData {
                spans: indices.iter().map(|&i| spans[i].clone()).collect(),
                indices,
            });
        };

        for idx in order {
            let span = &spans[idx];
            let y_tolerance = span.font_size * self.config.y_tolerance_factor;

            match current_y {
                Some(y) if (span.y - y).abs() <= y_tolerance => current.push(idx),
                _ => {
                    if !current.is_empty() {
                        flush(std::mem::take(&mut current), &mut rows);
                    }
                    current_y = Some(span.y);
                    current.push(idx);
                }
            }
        }

        if !current.is_empty() {
            flush(current, &mut rows);
        }

        rows
    }

    /// Detect column boundaries from text edges.
    ///
    /// Left edges are bucketed to 5pt; buckets that recur in enough rows
    /// become columns. Rows with a single span are ignored when enough
    /// multi-span rows exist.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        if rows.is_empty() {
            return vec![];
        }

        let multi_span_rows: Vec<&TableRowData> =
            rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let source: Vec<&TableRowData> = if multi_span_rows.len() >= self.config.min_rows {
            multi_span_rows
        } else {
            rows.iter().collect()
        };

        let bucket_size = 5.0;
        let mut edge_counts: HashMap<i32, usize> = HashMap::new();

        for row in &source {
            // Count each bucket only once per row
            let row_buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|span| (span.x / bucket_size).round() as i32)
                .collect();
            for bucket in row_buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((source.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut column_edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f32 * bucket_size)
            .collect();

        column_edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut merged_edges: Vec<f32> = Vec::new();
        for edge in column_edges {
            match merged_edges.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged_edges.push(edge),
            }
        }

        merged_edges
    }

    /// Find contiguous row regions that form tables.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        if rows.is_empty() || columns.len() < self.config.min_columns {
            return vec![];
        }

        let mut regions: Vec<(usize, usize)> = Vec::new();
        let mut current_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            // Single-span rows are prose, never table rows
            let aligned = row.spans.len() >= 2
                && self.calculate_alignment_score(row, columns) >= self.config.min_alignment_ratio;

            if aligned {
                current_start.get_or_insert(i);
            } else if let Some(start) = current_start.take() {
                if i - start >= self.config.min_rows {
                    regions.push((start, i - 1));
                }
            }
        }

        if let Some(start) = current_start {
            if rows.len() - start >= self.config.min_rows {
                regions.push((start, rows.len() - 1));
            }
        }

        regions
    }

    /// Calculate how well a row aligns with the detected columns.
    fn calculate_alignment_score(&self, row: &TableRowData, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }

        let tolerance = 5.0;

        let aligned_spans = row
            .spans
            .iter()
            .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= tolerance))
            .count();

        aligned_spans as f32 / row.spans.len() as f32
    }

    /// Check if detected table rows actually represent a numbered or bulleted list.
    ///
    /// A list like "1. Item" often yields the marker and the text as separate
    /// spans, which looks like a two-column table.
    fn is_list_pattern(&self, rows: &[TableRowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;

        for row in rows {
            let first_span = row
                .spans
                .iter()
                .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

            if let Some(span) = first_span {
                let text = span.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;

        if bullet_ratio >= 0.5 {
            return true;
        }

        // Numbered first columns are common in real tables with 3+ columns
        columns.len() == 2 && total_ratio >= 0.5
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Find which column a span belongs to based on its X position.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    if columns.is_empty() {
        return 0;
    }

    // Allow 10pt for spans slightly before the column start
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if span_x >= col_start - 10.0 && span_x < col_end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (span_x - **a)
                .abs()
                .partial_cmp(&(span_x - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Deduplicate coordinates that lie within `tol` of each other.
fn snap_values(values: impl Iterator<Item = f32>, tol: f32, descending: bool) -> Vec<f32> {
    let mut sorted: Vec<f32> = values.collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut snapped: Vec<f32> = Vec::new();
    for v in sorted {
        match snapped.last() {
            Some(&last) if v - last <= tol => {}
            _ => snapped.push(v),
        }
    }

    if descending {
        snapped.reverse();
    }
    snapped
}

/// Text of one cell: its spans laid out as lines, wrapped lines re-joined.
fn cell_text(spans: &[TextSpan]) -> String {
    let lines = group_spans_into_lines(spans);
    let mut out = String::new();
    for line in lines {
        let text = line.text();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if !out.is_empty() {
            let joins_cjk = out.chars().last().is_some_and(is_spaceless_script_char)
                && text.chars().next().is_some_and(is_spaceless_script_char);
            if !joins_cjk {
                out.push(' ');
            }
        }
        out.push_str(text);
    }
    out
}

/// Split a cell's text on runs of two or more spaces.
fn split_gapped(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    text.split("  ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "※" | "□" | "◆" | "◇" | "▶" | "➤"
    )
}

/// Check if text is a number-style list marker (1., 2), a., (一), 一、 etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && matches!(suffix, "." | ")" | "、" | "）") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    // Chinese enumerations: 一、 (二) （三）
    let inner = cleaned
        .trim_start_matches(['(', '（'])
        .trim_end_matches([')', '）', '、']);
    if inner != cleaned && !inner.is_empty() && inner.chars().all(is_chinese_numeral) {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && matches!(chars[1], '.' | ')')
}

fn is_chinese_numeral(c: char) -> bool {
    "一二三四五六七八九十".contains(c)
}

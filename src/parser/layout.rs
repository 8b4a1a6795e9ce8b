//! Layout analysis for PDF pages.
//!
//! Interprets a page's content stream into positioned text spans and the
//! ruling lines drawn on the page. Coordinates here are PDF user space
//! (origin bottom-left, `y` grows upward); conversion to top-down reading
//! coordinates happens in the extractor.

use std::collections::BTreeMap;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// Shortest segment (in points) kept as a ruling line.
const MIN_RULE_LENGTH: f32 = 5.0;

/// Rectangles thinner than this are treated as a single line.
const THIN_RECT: f32 = 2.0;

/// Segments whose off-axis drift is below this are axis-aligned.
const AXIS_TOLERANCE: f32 = 1.0;

/// A text span with position information.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a span, estimating its width from the character count.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = estimate_advance(&text, font_size);
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Get the bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2 // Approximate descender
    }

    /// Get the top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8 // Approximate ascender
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical center of the glyph box.
    pub fn center_y(&self) -> f32 {
        (self.top() + self.bottom()) / 2.0
    }
}

/// An axis-aligned ruling segment.
///
/// Horizontal rules have `y0 == y1` and `x0 < x1`; vertical rules have
/// `x0 == x1` and `y0 < y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rule {
    /// A horizontal rule at `y` from `x0` to `x1` (any order).
    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y,
            x1: x0.max(x1),
            y1: y,
        }
    }

    /// A vertical rule at `x` from `y0` to `y1` (any order).
    pub fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Self {
            x0: x,
            y0: y0.min(y1),
            x1: x,
            y1: y0.max(y1),
        }
    }

    /// Whether the rule runs left to right.
    pub fn is_horizontal(&self) -> bool {
        self.y0 == self.y1
    }

    /// Whether the rule runs bottom to top.
    pub fn is_vertical(&self) -> bool {
        self.x0 == self.x1 && !self.is_horizontal()
    }

    /// Segment length.
    pub fn length(&self) -> f32 {
        (self.x1 - self.x0).max(self.y1 - self.y0)
    }

    /// Build an axis-aligned rule from two points, if they are aligned.
    fn from_points((ax, ay): (f32, f32), (bx, by): (f32, f32)) -> Option<Self> {
        let rule = if (ay - by).abs() <= AXIS_TOLERANCE {
            Self::horizontal((ay + by) / 2.0, ax, bx)
        } else if (ax - bx).abs() <= AXIS_TOLERANCE {
            Self::vertical((ax + bx) / 2.0, ay, by)
        } else {
            return None;
        };
        (rule.length() >= MIN_RULE_LENGTH).then_some(rule)
    }
}

/// A text line composed of spans on the same baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by X position
    pub spans: Vec<TextSpan>,
    /// Y position (baseline)
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
}

impl TextLine {
    /// Create a new text line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let y = spans.first().map(|s| s.y).unwrap_or(0.0);
        let x = spans.first().map(|s| s.x).unwrap_or(0.0);
        Self { spans, y, x }
    }

    /// Highest glyph top among the spans.
    pub fn top(&self) -> f32 {
        self.spans
            .iter()
            .map(TextSpan::top)
            .fold(f32::MIN, f32::max)
    }

    /// Lowest glyph bottom among the spans.
    pub fn bottom(&self) -> f32 {
        self.spans
            .iter()
            .map(TextSpan::bottom)
            .fold(f32::MAX, f32::min)
    }

    /// Get the combined text of all spans with appropriate spacing.
    ///
    /// A space is inserted where the horizontal gap between spans exceeds a
    /// fraction of a character width, except between two CJK characters.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i == 0 {
                result.push_str(&span.text);
                continue;
            }

            let prev_span = &self.spans[i - 1];
            let gap = span.x - (prev_span.x + prev_span.width);

            let char_count = span.text.chars().count();
            let avg_char_width = if char_count > 0 && span.width > 0.0 {
                span.width / char_count as f32
            } else {
                span.font_size * 0.5
            };

            let prev_is_cjk = prev_span
                .text
                .chars()
                .last()
                .map(is_spaceless_script_char)
                .unwrap_or(false);
            let curr_is_cjk = span
                .text
                .chars()
                .next()
                .map(is_spaceless_script_char)
                .unwrap_or(false);

            let should_insert_space = gap > avg_char_width * 0.2
                && !(prev_is_cjk && curr_is_cjk)
                && !result.ends_with(char::is_whitespace)
                && !span.text.starts_with(char::is_whitespace);

            if should_insert_space {
                result.push(' ');
            }

            result.push_str(&span.text);
        }

        result
    }
}

/// Geometry and raw content of one page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// MediaBox lower-left X
    pub x0: f32,
    /// MediaBox lower-left Y
    pub y0: f32,
    /// MediaBox upper-right X
    pub x1: f32,
    /// MediaBox upper-right Y
    pub y1: f32,
    /// Text spans in content-stream order
    pub spans: Vec<TextSpan>,
    /// Ruling lines drawn on the page
    pub rules: Vec<Rule>,
}

impl PageLayout {
    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Convert a PDF-space Y coordinate to a distance from the page top.
    pub fn to_top(&self, y: f32) -> f32 {
        self.y1 - y
    }
}

/// Layout analyzer for extracting positioned content from PDF pages.
pub struct LayoutAnalyzer<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> LayoutAnalyzer<'a> {
    /// Create a new layout analyzer.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Interpret a page into spans and rules.
    pub fn page_layout(&self, page_id: ObjectId) -> Result<PageLayout> {
        let (x0, y0, x1, y1) = self.media_box(page_id);

        let fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let content = self.page_content(page_id)?;
        let (spans, rules) = self.interpret(&content, &fonts)?;

        Ok(PageLayout {
            x0,
            y0,
            x1,
            y1,
            spans,
            rules,
        })
    }

    /// Resolve the page's MediaBox, following `/Parent` inheritance.
    fn media_box(&self, page_id: ObjectId) -> (f32, f32, f32, f32) {
        let mut current = self.doc.get_dictionary(page_id).ok();
        let mut hops = 0;

        while let Some(dict) = current {
            if let Ok(media_box) = dict.get(b"MediaBox") {
                let array = match media_box {
                    Object::Reference(r) => self.doc.get_object(*r).and_then(Object::as_array).ok(),
                    other => other.as_array().ok(),
                };
                if let Some(array) = array {
                    if array.len() >= 4 {
                        let values: Vec<f32> = array.iter().filter_map(get_number).collect();
                        if values.len() >= 4 {
                            return (values[0], values[1], values[2], values[3]);
                        }
                    }
                }
            }

            hops += 1;
            if hops > 32 {
                break;
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|r| self.doc.get_dictionary(r))
                .ok();
        }

        // Default to A4, the size exchange filings use
        (0.0, 0.0, 595.0, 842.0)
    }

    /// Get the decompressed page content stream.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without contents is blank, not broken
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => stream_bytes(s),
                Ok(Object::Array(arr)) => Ok(self.concat_streams(arr)),
                _ => Err(Error::TextExtract("Invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            _ => Err(Error::TextExtract("Invalid content stream".to_string())),
        }
    }

    fn concat_streams(&self, refs: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in refs {
            if let Object::Reference(r) = obj {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    // A broken part drops out; its siblings still render
                    if let Ok(data) = stream_bytes(s) {
                        content.extend_from_slice(&data);
                        content.push(b' ');
                    }
                }
            }
        }
        content
    }

    /// Walk the content stream, collecting text spans and ruling lines.
    fn interpret(
        &self,
        content: &[u8],
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    ) -> Result<(Vec<TextSpan>, Vec<Rule>)> {
        let content = lopdf::content::Content::decode(content)
            .map_err(|e| Error::TextExtract(e.to_string()))?;

        let mut spans = Vec::new();
        let mut rules = Vec::new();
        let mut pending: Vec<Rule> = Vec::new();

        let mut state = GraphicsState::default();
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut text = TextState::default();
        let mut in_text_block = false;

        let mut cursor: Option<(f32, f32)> = None;
        let mut subpath_start: Option<(f32, f32)> = None;

        for op in content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_from(operands) {
                        state.ctm = m.multiply(&state.ctm);
                    }
                }
                "BT" => {
                    in_text_block = true;
                    text.tm = Matrix::IDENTITY;
                    text.tlm = Matrix::IDENTITY;
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(font_name) = &operands[0] {
                            state.font_name = font_name.clone();
                        }
                        state.font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(get_number) {
                        state.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            state.leading = -ty;
                        }
                        text.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_from(operands) {
                        text.tm = m;
                        text.tlm = m;
                    }
                }
                "T*" => text.move_line(0.0, -state.effective_leading()),
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "'" || op.operator == "\"" {
                        text.move_line(0.0, -state.effective_leading());
                    }
                    if !in_text_block {
                        continue;
                    }

                    let shown = match op.operator.as_str() {
                        "TJ" => match operands.first() {
                            Some(Object::Array(arr)) => self.decode_array(fonts, &state, arr),
                            _ => None,
                        },
                        "\"" => operands.get(2).and_then(|o| self.decode_operand(fonts, &state, o)),
                        _ => operands.first().and_then(|o| self.decode_operand(fonts, &state, o)),
                    };

                    if let Some((decoded, advance)) = shown {
                        let rendering = text.tm.multiply(&state.ctm);
                        if !decoded.trim().is_empty() {
                            let (x, y) = rendering.apply(0.0, 0.0);
                            let size = state.font_size * rendering.vertical_scale();
                            let mut span = TextSpan::new(decoded, x, y, size);
                            span.width = advance * rendering.horizontal_scale();
                            spans.push(span);
                        }
                        text.advance(advance);
                    }
                }
                "m" => {
                    if let Some((x, y)) = point_from(operands) {
                        let p = state.ctm.apply(x, y);
                        cursor = Some(p);
                        subpath_start = Some(p);
                    }
                }
                "l" => {
                    if let (Some(from), Some((x, y))) = (cursor, point_from(operands)) {
                        let to = state.ctm.apply(x, y);
                        pending.extend(Rule::from_points(from, to));
                        cursor = Some(to);
                    }
                }
                "h" => {
                    if let (Some(from), Some(to)) = (cursor, subpath_start) {
                        pending.extend(Rule::from_points(from, to));
                        cursor = Some(to);
                    }
                }
                "re" => {
                    if operands.len() >= 4 {
                        let values: Vec<f32> = operands.iter().take(4).filter_map(get_number).collect();
                        if values.len() == 4 {
                            pending.extend(rect_rules(&state.ctm, &values));
                        }
                    }
                }
                "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                    rules.append(&mut pending);
                    cursor = None;
                    subpath_start = None;
                }
                "n" => {
                    pending.clear();
                    cursor = None;
                    subpath_start = None;
                }
                _ => {}
            }
        }

        Ok((spans, rules))
    }

    /// Decode a single string operand; returns the text and its advance in
    /// unscaled text space.
    fn decode_operand(
        &self,
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        state: &GraphicsState,
        operand: &Object,
    ) -> Option<(String, f32)> {
        match operand {
            Object::String(bytes, _) => {
                let decoded = self.decode_bytes(fonts, &state.font_name, bytes);
                let advance = estimate_advance(&decoded, state.font_size);
                Some((decoded, advance))
            }
            _ => None,
        }
    }

    /// Decode a TJ array: strings interleaved with positioning adjustments in
    /// 1/1000 text space units. Large negative adjustments are word breaks.
    fn decode_array(
        &self,
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        state: &GraphicsState,
        items: &[Object],
    ) -> Option<(String, f32)> {
        let space_threshold = 200.0;
        let mut combined = String::new();
        let mut advance = 0.0;

        for item in items {
            match item {
                Object::String(bytes, _) => {
                    let decoded = self.decode_bytes(fonts, &state.font_name, bytes);
                    advance += estimate_advance(&decoded, state.font_size);
                    combined.push_str(&decoded);
                }
                Object::Integer(_) | Object::Real(_) => {
                    let adjustment = -get_number(item).unwrap_or(0.0);
                    advance += adjustment / 1000.0 * state.font_size;
                    if adjustment > space_threshold
                        && !combined.is_empty()
                        && !combined.ends_with(char::is_whitespace)
                    {
                        if let Some(c) = combined.chars().last() {
                            if !is_spaceless_script_char(c) {
                                combined.push(' ');
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Some((combined, advance))
    }

    fn decode_bytes(
        &self,
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        font_name: &[u8],
        bytes: &[u8],
    ) -> String {
        if let Some(font_dict) = fonts.get(font_name) {
            if let Ok(enc) = font_dict.get_font_encoding(self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Group spans into lines by baseline, top to bottom.
///
/// Spans whose baselines differ by less than 30% of their font size share a
/// line. Repeated spans drawn at the same spot (fake bold) are dropped.
pub fn group_spans_into_lines(spans: &[TextSpan]) -> Vec<TextLine> {
    if spans.is_empty() {
        return vec![];
    }

    // Sort spans by Y (descending, since PDF Y is bottom-up) then X
    let mut sorted = spans.to_vec();
    sorted.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in sorted {
        let y_tolerance = span.font_size * 0.3;

        match current_y {
            Some(y) if (span.y - y).abs() <= y_tolerance => {
                let duplicate = current.iter().any(|s| {
                    s.text == span.text && (s.x - span.x).abs() < 1.0 && (s.y - span.y).abs() < 1.0
                });
                if !duplicate {
                    current.push(span);
                }
            }
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    lines
}

/// Graphics state saved and restored by `q`/`Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font_name: Vec<u8>,
    font_size: f32,
    leading: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            font_name: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

impl GraphicsState {
    fn effective_leading(&self) -> f32 {
        if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        }
    }
}

/// Text matrix and text line matrix.
#[derive(Debug, Clone, Default)]
struct TextState {
    tm: Matrix,
    tlm: Matrix,
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn advance(&mut self, tx: f32) {
        self.tm = Matrix::translation(tx, 0.0).multiply(&self.tm);
    }
}

/// 2D affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`.
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let v: Vec<f32> = operands.iter().take(6).filter_map(get_number).collect();
    (v.len() == 6).then(|| Matrix {
        a: v[0],
        b: v[1],
        c: v[2],
        d: v[3],
        e: v[4],
        f: v[5],
    })
}

fn point_from(operands: &[Object]) -> Option<(f32, f32)> {
    match operands {
        [x, y, ..] => Some((get_number(x)?, get_number(y)?)),
        _ => None,
    }
}

/// Rules contributed by an `re` rectangle: one rule when thin, else its edges.
fn rect_rules(ctm: &Matrix, v: &[f32]) -> Vec<Rule> {
    let (x, y, w, h) = (v[0], v[1], v[2], v[3]);
    let corners = [
        ctm.apply(x, y),
        ctm.apply(x + w, y),
        ctm.apply(x + w, y + h),
        ctm.apply(x, y + h),
    ];
    let min_x = corners.iter().map(|p| p.0).fold(f32::MAX, f32::min);
    let max_x = corners.iter().map(|p| p.0).fold(f32::MIN, f32::max);
    let min_y = corners.iter().map(|p| p.1).fold(f32::MAX, f32::min);
    let max_y = corners.iter().map(|p| p.1).fold(f32::MIN, f32::max);

    let mut out = Vec::new();
    if max_y - min_y <= THIN_RECT {
        let rule = Rule::horizontal((min_y + max_y) / 2.0, min_x, max_x);
        if rule.length() >= MIN_RULE_LENGTH {
            out.push(rule);
        }
    } else if max_x - min_x <= THIN_RECT {
        let rule = Rule::vertical((min_x + max_x) / 2.0, min_y, max_y);
        if rule.length() >= MIN_RULE_LENGTH {
            out.push(rule);
        }
    } else {
        for i in 0..4 {
            out.extend(Rule::from_points(corners[i], corners[(i + 1) % 4]));
        }
    }
    out
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Rough advance width of `text` at `font_size`: full-width for CJK, half
/// otherwise. Glyph metrics are not consulted.
fn estimate_advance(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| {
            if is_spaceless_script_char(c) || is_fullwidth_form(c) {
                font_size
            } else {
                font_size * 0.5
            }
        })
        .sum()
}

fn is_fullwidth_form(c: char) -> bool {
    ('\u{FF00}'..='\u{FFEF}').contains(&c)
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}

/// Stream payload, decoded when the stream declares a filter.
fn stream_bytes(stream: &lopdf::Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|e| Error::TextExtract(e.to_string()))
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

//! Page layout analysis over positioned text spans.
//!
//! pdfium hands back text objects with bounding boxes but no notion of
//! lines, paragraphs, or tables. This module rebuilds them:
//!
//! 1. [`group_lines`] clusters spans whose vertical centres overlap into
//!    lines, ordered top to bottom and left to right.
//! 2. [`build_blocks`] reorders two-column prose at the gutter, finds runs
//!    of lines that split into the same number of aligned short cells
//!    (stream-mode table detection: no ruling lines are needed) and merges
//!    the remaining lines into paragraphs by vertical gap.
//!
//! Form XObjects nest their own object lists; [`flatten_nodes`] maps them
//! into page space before any of the above runs.
//!
//! Coordinates are PDF user space: origin bottom-left, `top > bottom`.

/// Axis-aligned box in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn height(&self) -> f32 {
        (self.top - self.bottom).max(0.0)
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
            bottom: self.bottom.min(other.bottom),
        }
    }
}

/// One text object as reported by the PDF engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub rect: Rect,
}

/// Spans sharing a baseline, sorted left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub rect: Rect,
}

impl TextLine {
    fn from_span(span: TextSpan) -> Self {
        let rect = span.rect;
        Self {
            spans: vec![span],
            rect,
        }
    }

    fn from_spans(spans: Vec<TextSpan>) -> Option<Self> {
        let rect = spans
            .iter()
            .map(|s| s.rect)
            .reduce(|acc, r| acc.union(&r))?;
        Some(Self { spans, rect })
    }

    pub fn text(&self) -> String {
        join_spans(&self.spans)
    }

    /// Split the line into cells wherever the horizontal gap between two
    /// spans reaches `min_gap`. Returns `(left_x, text)` per cell.
    pub fn columns(&self, min_gap: f32) -> Vec<(f32, String)> {
        let mut cells: Vec<(f32, f32, Vec<&TextSpan>)> = Vec::new();
        for span in &self.spans {
            if span.text.trim().is_empty() {
                continue;
            }
            match cells.last_mut() {
                Some((_, right, parts)) if span.rect.left - *right < min_gap => {
                    parts.push(span);
                    *right = right.max(span.rect.right);
                }
                _ => cells.push((span.rect.left, span.rect.right, vec![span])),
            }
        }
        cells
            .into_iter()
            .map(|(left, _, parts)| (left, join_spans(parts)))
            .collect()
    }
}

/// Horizontal gap, as a fraction of line height, that reads as a word space.
const WORD_GAP_FACTOR: f32 = 0.15;

/// Join spans left to right. pdfium splits words across text objects on
/// font or kerning changes, so touching spans are glued without a space.
fn join_spans<'s>(spans: impl IntoIterator<Item = &'s TextSpan>) -> String {
    let mut out = String::new();
    let mut prev: Option<(&Rect, bool)> = None;
    for span in spans {
        let text = span.text.trim();
        if text.is_empty() {
            continue;
        }
        if let Some((rect, trailing_space)) = prev {
            let gap = span.rect.left - rect.right;
            let height = span.rect.height().max(rect.height());
            if trailing_space
                || span.text.starts_with(char::is_whitespace)
                || gap > WORD_GAP_FACTOR * height
            {
                out.push(' ');
            }
        }
        out.push_str(text);
        prev = Some((&span.rect, span.text.ends_with(char::is_whitespace)));
    }
    out
}

/// Thresholds for line, paragraph, and table reconstruction.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Minimum consecutive aligned lines to call a region a table.
    pub min_table_rows: usize,
    /// Minimum cells per line inside a table.
    pub min_columns: usize,
    /// Above this many cells a line is more likely word-spaced prose.
    pub max_columns: usize,
    /// Horizontal gap (points) separating two cells.
    pub min_column_gap: f32,
    /// Maximum drift (points) between matching column left edges.
    pub column_tolerance: f32,
    /// Mean words per cell above which aligned cells are prose columns.
    pub max_cell_words: f32,
    /// Vertical gap, as a multiple of line height, that ends a paragraph.
    pub paragraph_gap_factor: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_table_rows: 2,
            min_columns: 2,
            max_columns: 6,
            min_column_gap: 15.0,
            column_tolerance: 8.0,
            max_cell_words: 4.0,
            paragraph_gap_factor: 0.9,
        }
    }
}

/// A reconstructed region of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutBlock {
    Paragraph { text: String, rect: Rect },
    Table { rows: Vec<Vec<String>>, rect: Rect },
}

impl LayoutBlock {
    pub fn rect(&self) -> &Rect {
        match self {
            LayoutBlock::Paragraph { rect, .. } | LayoutBlock::Table { rect, .. } => rect,
        }
    }
}

/// Cluster spans into lines, top of page first.
pub fn group_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.retain(|s| !s.text.trim().is_empty());
    spans.sort_by(|a, b| b.rect.center_y().total_cmp(&a.rect.center_y()));

    let mut lines: Vec<TextLine> = Vec::new();
    for span in spans {
        let joins_last = lines.last().is_some_and(|line| {
            let cy = span.rect.center_y();
            cy <= line.rect.top && cy >= line.rect.bottom
        });
        match lines.last_mut() {
            Some(line) if joins_last => {
                line.rect = line.rect.union(&span.rect);
                line.spans.push(span);
            }
            _ => lines.push(TextLine::from_span(span)),
        }
    }

    for line in &mut lines {
        line.spans
            .sort_by(|a, b| a.rect.left.total_cmp(&b.rect.left));
    }
    lines
}

/// Turn ordered lines into paragraphs and tables.
///
/// Two-column prose is first split at the gutter so the left column is read
/// before the right one.
pub fn build_blocks(lines: &[TextLine], config: &LayoutConfig) -> Vec<LayoutBlock> {
    let lines = column_order(lines, config);
    let mut blocks = Vec::new();
    let mut paragraph: Option<Paragraph> = None;
    let mut i = 0;

    while i < lines.len() {
        let run = table_run_len(&lines[i..], config);
        if run >= config.min_table_rows {
            flush_paragraph(&mut paragraph, &mut blocks);
            let region = &lines[i..i + run];
            let rows = region
                .iter()
                .map(|l| {
                    l.columns(config.min_column_gap)
                        .into_iter()
                        .map(|(_, t)| t)
                        .collect()
                })
                .collect();
            let rect = region
                .iter()
                .skip(1)
                .fold(region[0].rect, |acc, l| acc.union(&l.rect));
            blocks.push(LayoutBlock::Table { rows, rect });
            i += run;
            continue;
        }

        let line = &lines[i];
        let height = line.rect.height().max(1.0);
        let continues = paragraph.as_ref().is_some_and(|p| {
            let gap = p.last.bottom - line.rect.top;
            gap >= -height / 2.0 && gap <= height * config.paragraph_gap_factor
        });
        match paragraph.as_mut() {
            Some(p) if continues => {
                p.parts.push(line.text());
                p.rect = p.rect.union(&line.rect);
                p.last = line.rect;
            }
            _ => {
                flush_paragraph(&mut paragraph, &mut blocks);
                paragraph = Some(Paragraph {
                    parts: vec![line.text()],
                    rect: line.rect,
                    last: line.rect,
                });
            }
        }
        i += 1;
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

struct Paragraph {
    parts: Vec<String>,
    rect: Rect,
    /// Most recent line; the gap to the next line is measured from here.
    last: Rect,
}

fn flush_paragraph(paragraph: &mut Option<Paragraph>, blocks: &mut Vec<LayoutBlock>) {
    if let Some(p) = paragraph.take() {
        let text = p.parts.join(" ");
        if !text.trim().is_empty() {
            blocks.push(LayoutBlock::Paragraph { text, rect: p.rect });
        }
    }
}

fn mean_words(cells: &[(f32, String)]) -> f32 {
    if cells.is_empty() {
        return 0.0;
    }
    let words: usize = cells.iter().map(|(_, t)| t.split_whitespace().count()).sum();
    words as f32 / cells.len() as f32
}

/// Reorder lines of a two-column page: every left-column line, then every
/// right-column line. Lines that cross the gutter (titles, full-width
/// figures' captions) close the current column band and stay in place.
/// Pages without prose on both sides of a common gutter are returned as-is.
fn column_order(lines: &[TextLine], config: &LayoutConfig) -> Vec<TextLine> {
    let mut starts: Vec<f32> = lines
        .iter()
        .filter_map(|l| {
            let cols = l.columns(config.min_column_gap);
            (cols.len() == 2 && mean_words(&cols) > config.max_cell_words).then(|| cols[1].0)
        })
        .collect();
    if starts.len() < config.min_table_rows {
        return lines.to_vec();
    }
    starts.sort_by(f32::total_cmp);
    let gutter = starts[starts.len() / 2] - config.column_tolerance;

    let mut ordered = Vec::with_capacity(lines.len());
    let (mut left, mut right) = (Vec::new(), Vec::new());
    for line in lines {
        let crosses = line
            .spans
            .iter()
            .any(|s| s.rect.left < gutter && s.rect.right > gutter + 2.0 * config.column_tolerance);
        if crosses {
            ordered.append(&mut left);
            ordered.append(&mut right);
            ordered.push(line.clone());
            continue;
        }
        let (l, r): (Vec<TextSpan>, Vec<TextSpan>) =
            line.spans.iter().cloned().partition(|s| s.rect.left < gutter);
        left.extend(TextLine::from_spans(l));
        right.extend(TextLine::from_spans(r));
    }
    ordered.append(&mut left);
    ordered.append(&mut right);
    ordered
}

/// Number of leading lines that share the first line's column structure.
/// Runs whose cells read as prose are rejected.
fn table_run_len(lines: &[TextLine], config: &LayoutConfig) -> usize {
    let Some(first) = lines.first() else {
        return 0;
    };
    let first_cols = first.columns(config.min_column_gap);
    if first_cols.len() < config.min_columns || first_cols.len() > config.max_columns {
        return 0;
    }
    let anchor: Vec<f32> = first_cols.iter().map(|(x, _)| *x).collect();

    let mut cells = first_cols;
    let mut run = 1;
    for line in &lines[1..] {
        let cols = line.columns(config.min_column_gap);
        let aligned = cols.len() == anchor.len()
            && cols
                .iter()
                .zip(&anchor)
                .all(|((x, _), ax)| (x - ax).abs() <= config.column_tolerance);
        if !aligned {
            break;
        }
        cells.extend(cols);
        run += 1;
    }

    if mean_words(&cells) > config.max_cell_words {
        return 0;
    }
    run
}

// ── Page object tree ─────────────────────────────────────────────────────────

/// Affine transform `[a b c d e f]` in PDF matrix order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// `self` applied after `inner`.
    fn then(&self, inner: &Transform) -> Transform {
        Transform {
            a: inner.a * self.a + inner.b * self.c,
            b: inner.a * self.b + inner.b * self.d,
            c: inner.c * self.a + inner.d * self.c,
            d: inner.c * self.b + inner.d * self.d,
            e: inner.e * self.a + inner.f * self.c + self.e,
            f: inner.e * self.b + inner.f * self.d + self.f,
        }
    }

    fn apply_rect(&self, r: &Rect) -> Rect {
        if *self == Transform::IDENTITY {
            return *r;
        }
        let corners = [
            self.apply(r.left, r.bottom),
            self.apply(r.left, r.top),
            self.apply(r.right, r.bottom),
            self.apply(r.right, r.top),
        ];
        let xs = corners.iter().map(|c| c.0);
        let ys = corners.iter().map(|c| c.1);
        Rect {
            left: xs.clone().fold(f32::INFINITY, f32::min),
            right: xs.fold(f32::NEG_INFINITY, f32::max),
            top: ys.clone().fold(f32::NEG_INFINITY, f32::max),
            bottom: ys.fold(f32::INFINITY, f32::min),
        }
    }
}

/// The parts of a page's object list that layout analysis reads.
#[derive(Debug, Clone, PartialEq)]
pub enum PageNode {
    Text(TextSpan),
    Image(Rect),
    /// A form XObject: child boxes are in form space and `matrix` maps them
    /// onto the page.
    Form {
        matrix: Transform,
        children: Vec<PageNode>,
    },
}

/// Flatten a page object tree into text spans and figure boxes in page space.
pub fn flatten_nodes(nodes: &[PageNode]) -> (Vec<TextSpan>, Vec<Rect>) {
    let mut spans = Vec::new();
    let mut figures = Vec::new();
    walk_nodes(nodes, &Transform::IDENTITY, &mut spans, &mut figures);
    (spans, figures)
}

fn walk_nodes(
    nodes: &[PageNode],
    ctm: &Transform,
    spans: &mut Vec<TextSpan>,
    figures: &mut Vec<Rect>,
) {
    for node in nodes {
        match node {
            PageNode::Text(span) => spans.push(TextSpan {
                text: span.text.clone(),
                rect: ctm.apply_rect(&span.rect),
            }),
            PageNode::Image(rect) => figures.push(ctm.apply_rect(rect)),
            PageNode::Form { matrix, children } => {
                walk_nodes(children, &ctm.then(matrix), spans, figures)
            }
        }
    }
}

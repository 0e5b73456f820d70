//! Element classification and sequence numbering.
//!
//! Content sources feed raw nodes into an [`ElementCollector`], which tags
//! them as text, table, link, or image, drops nodes with nothing to show,
//! and hands out the 1-based sequence indices that later become asset file
//! names. Numbering happens here and only here, so the renderer and the
//! exporter always agree.

use crate::model::{
    ExtractedElement, ExtractionResult, ImageRef, ImageSource, LinkRef, PageRaster, TableBlock,
    TextBlock,
};
use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;

/// The four element kinds a DOM node can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Table,
    Link,
    Image,
}

/// CSS selector matching every node a web source extracts.
pub const WEB_ELEMENT_SELECTOR: &str = "h1, h2, h3, p, table, a[href], img[src]";

/// Map an HTML tag name to the kind of element it produces.
pub fn classify_tag(tag: &str) -> Option<ElementKind> {
    match tag.to_ascii_lowercase().as_str() {
        "h1" | "h2" | "h3" | "p" => Some(ElementKind::Text),
        "table" => Some(ElementKind::Table),
        "a" => Some(ElementKind::Link),
        "img" => Some(ElementKind::Image),
        _ => None,
    }
}

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace to one space and trim.
pub fn normalize_text(raw: &str) -> String {
    RE_WS.replace_all(raw.trim(), " ").into_owned()
}

/// Accumulates elements in source order and assigns sequence indices.
#[derive(Debug, Default)]
pub struct ElementCollector {
    elements: Vec<ExtractedElement>,
    pages: Vec<PageRaster>,
    tables: usize,
    images: usize,
}

impl ElementCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a heading or paragraph. Blank text is dropped.
    pub fn push_text(&mut self, raw: &str) {
        let content = normalize_text(raw);
        if !content.is_empty() {
            self.elements
                .push(ExtractedElement::Text(TextBlock { content }));
        }
    }

    /// Add a table. Blank cells are kept, empty rows and empty tables are
    /// dropped.
    pub fn push_table(&mut self, rows: Vec<Vec<String>>, raster: Option<DynamicImage>) {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.iter().map(|c| normalize_text(c)).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();
        if rows.is_empty() {
            return;
        }
        self.tables += 1;
        self.elements.push(ExtractedElement::Table(TableBlock {
            rows,
            sequence_index: self.tables,
            raster,
        }));
    }

    /// Add an anchor. Anchors without a target are dropped.
    pub fn push_link(&mut self, label: &str, href: &str) {
        let href = href.trim();
        if href.is_empty() {
            return;
        }
        self.elements.push(ExtractedElement::Link(LinkRef {
            label: normalize_text(label),
            href: href.to_string(),
        }));
    }

    /// Add an image. Empty URLs are dropped.
    pub fn push_image(&mut self, source: ImageSource) {
        if let ImageSource::Url(ref u) = source {
            if u.trim().is_empty() {
                return;
            }
        }
        self.images += 1;
        self.elements.push(ExtractedElement::Image(ImageRef {
            source,
            sequence_index: self.images,
        }));
    }

    /// Record a full-page render (PDF only).
    pub fn push_page(&mut self, page_no: usize, image: DynamicImage) {
        self.pages.push(PageRaster { page_no, image });
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn finish(self, document_identifier: String, source: String) -> ExtractionResult {
        ExtractionResult {
            document_identifier,
            source,
            elements: self.elements,
            pages: self.pages,
        }
    }
}

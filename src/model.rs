//! Extracted element model shared by every content source.
//!
//! Every strategy (PDF, browser, static HTML) produces the same
//! [`ExtractionResult`], so the renderer and exporter never need to know
//! where the elements came from. Sequence indices are assigned by
//! [`crate::source::classify::ElementCollector`] and never change afterwards.

use image::DynamicImage;

/// One piece of extracted content, in source document order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedElement {
    Text(TextBlock),
    Table(TableBlock),
    Image(ImageRef),
    Link(LinkRef),
}

/// A heading or paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub content: String,
}

/// A table as rows of cell strings. Header rows are not distinguished.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub rows: Vec<Vec<String>>,
    /// 1-based, first-seen order among tables.
    pub sequence_index: usize,
    /// Raster crop of the table region (PDF sources only).
    pub raster: Option<DynamicImage>,
}

/// An image, either remote or already rasterised.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub source: ImageSource,
    /// 1-based, first-seen order among images.
    pub sequence_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Absolute URL as found in the page.
    Url(String),
    /// Decoded pixels that must be exported before they can be referenced.
    Raster(DynamicImage),
}

impl ImageSource {
    pub fn as_url(&self) -> Option<&str> {
        match self {
            ImageSource::Url(u) => Some(u),
            ImageSource::Raster(_) => None,
        }
    }
}

/// An anchor. `label` may be empty; renderers fall back to `Link`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub label: String,
    pub href: String,
}

/// Full-page render produced by the PDF strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRaster {
    /// 1-based page number.
    pub page_no: usize,
    pub image: DynamicImage,
}

/// Everything one content source extracted from one input.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Filename prefix for every exported asset.
    pub document_identifier: String,
    /// The input reference as the caller supplied it.
    pub source: String,
    pub elements: Vec<ExtractedElement>,
    pub pages: Vec<PageRaster>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextBlock> {
        self.elements.iter().filter_map(|e| match e {
            ExtractedElement::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.elements.iter().filter_map(|e| match e {
            ExtractedElement::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkRef> {
        self.elements.iter().filter_map(|e| match e {
            ExtractedElement::Link(l) => Some(l),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageRef> {
        self.elements.iter().filter_map(|e| match e {
            ExtractedElement::Image(i) => Some(i),
            _ => None,
        })
    }
}

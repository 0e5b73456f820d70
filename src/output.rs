//! Output types returned to callers.

use crate::error::AssetError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The final product of one extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedDocument {
    /// Markdown with raster images referenced by relative file name.
    pub markdown_text: String,
    /// Image URLs and exported image paths, in sequence order.
    pub image_refs: Vec<String>,
    pub document_identifier: String,
    /// Every file written into the output directory.
    pub assets_written: Vec<PathBuf>,
    /// Assets that could not be written; their references are absent from
    /// `markdown_text`.
    pub failed_assets: Vec<AssetError>,
    pub stats: ExtractionStats,
}

impl RenderedDocument {
    /// `true` when every asset was written.
    pub fn is_complete(&self) -> bool {
        self.failed_assets.is_empty()
    }
}

/// Element and timing counters for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub text_blocks: usize,
    pub tables: usize,
    pub links: usize,
    pub images: usize,
    pub pages: usize,
    pub assets_written: usize,
    pub assets_failed: usize,
    pub total_duration_ms: u64,
}

impl ExtractionStats {
    pub fn total_elements(&self) -> usize {
        self.text_blocks + self.tables + self.links + self.images
    }
}

//! Markdown and HTML rendering of an [`ExtractionResult`].
//!
//! Both renderers emit the same fixed section order (text, tables, links,
//! images) regardless of which content source produced the elements.
//! Rendering is pure: raster images are resolved through an [`AssetIndex`]
//! built by the exporter, never by touching the file system.

pub mod html;
pub mod markdown;

use crate::config::{AssetFormat, SectionPolicy};
use crate::model::{ImageRef, ImageSource};
use std::collections::BTreeMap;

pub use html::render_html;
pub use markdown::{render_markdown, render_table_rows};

/// How raster images appear in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMode {
    /// Relative file name of the exported asset.
    #[default]
    Referenced,
    /// Inline base64 data URI.
    Embedded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub section_policy: SectionPolicy,
    pub image_mode: ImageMode,
    /// Encoding used for embedded data URIs.
    pub asset_format: AssetFormat,
}

/// File names of exported picture assets, keyed by sequence index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIndex {
    pictures: BTreeMap<usize, String>,
}

impl AssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_picture(&mut self, sequence_index: usize, file_name: impl Into<String>) {
        self.pictures.insert(sequence_index, file_name.into());
    }

    pub fn picture(&self, sequence_index: usize) -> Option<&str> {
        self.pictures.get(&sequence_index).map(String::as_str)
    }
}

/// Resolve the target an image tag should point at. `None` means the image
/// has nothing to show (export failed, or encoding failed when embedding).
pub(crate) fn image_target(
    image: &ImageRef,
    assets: &AssetIndex,
    options: &RenderOptions,
) -> Option<String> {
    match &image.source {
        ImageSource::Url(url) => Some(url.clone()),
        ImageSource::Raster(img) => match options.image_mode {
            ImageMode::Referenced => assets.picture(image.sequence_index).map(str::to_string),
            ImageMode::Embedded => crate::export::encode::data_uri(img, options.asset_format).ok(),
        },
    }
}

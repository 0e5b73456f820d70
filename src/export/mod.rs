//! Asset export: rasters and rendered documents written to the output
//! directory under deterministic names.
//!
//! | Asset                   | File name                              |
//! |-------------------------|----------------------------------------|
//! | page render             | `{doc}-{page_no}.{ext}`                |
//! | table crop              | `{doc}-table-{n}.{ext}`                |
//! | figure / downloaded img | `{doc}-picture-{n}.{ext}`              |
//! | embedded markdown       | `{doc}-with-images.md`                 |
//! | referenced markdown     | `{doc}-with-image-refs.md`             |
//! | referenced HTML         | `{doc}-with-image-refs.html`           |
//!
//! `n` is the element's sequence index, so the names match the references
//! the renderer emits. Individual write failures are collected rather than
//! returned; only a collision under [`CollisionPolicy::Fail`] is fatal.

pub mod encode;

use crate::config::{AssetFormat, CollisionPolicy};
use crate::error::{AssetError, Content2MdError};
use crate::model::{ExtractionResult, ImageSource};
use crate::render::AssetIndex;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Element kinds that get their own raster file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Table,
    Picture,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Table => "table",
            AssetKind::Picture => "picture",
        }
    }
}

/// The three rendered documents written per extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    EmbeddedMarkdown,
    ReferencedMarkdown,
    ReferencedHtml,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::EmbeddedMarkdown,
        DocumentKind::ReferencedMarkdown,
        DocumentKind::ReferencedHtml,
    ];

    fn suffix(self) -> &'static str {
        match self {
            DocumentKind::EmbeddedMarkdown => "with-images.md",
            DocumentKind::ReferencedMarkdown => "with-image-refs.md",
            DocumentKind::ReferencedHtml => "with-image-refs.html",
        }
    }
}

/// Outcome of writing the raster assets.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Picture files that were written, for the referenced renderers.
    pub index: AssetIndex,
    pub written: Vec<PathBuf>,
    pub failed: Vec<AssetError>,
}

#[derive(Debug, Clone)]
pub struct AssetExporter {
    output_dir: PathBuf,
    document_identifier: String,
    policy: CollisionPolicy,
    format: AssetFormat,
}

impl AssetExporter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        document_identifier: impl Into<String>,
        policy: CollisionPolicy,
        format: AssetFormat,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            document_identifier: document_identifier.into(),
            policy,
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn page_file_name(&self, page_no: usize) -> String {
        format!(
            "{}-{}.{}",
            self.document_identifier,
            page_no,
            self.format.extension()
        )
    }

    pub fn element_file_name(&self, kind: AssetKind, sequence_index: usize) -> String {
        format!(
            "{}-{}-{}.{}",
            self.document_identifier,
            kind.as_str(),
            sequence_index,
            self.format.extension()
        )
    }

    pub fn document_file_name(&self, kind: DocumentKind) -> String {
        format!("{}-{}", self.document_identifier, kind.suffix())
    }

    /// Every path an export of `result` would write, documents included.
    pub fn planned_paths(&self, result: &ExtractionResult, write_pages: bool) -> Vec<PathBuf> {
        self.raster_jobs(result, write_pages)
            .into_iter()
            .map(|(name, _, _)| self.output_dir.join(name))
            .chain(
                DocumentKind::ALL
                    .iter()
                    .map(|k| self.output_dir.join(self.document_file_name(*k))),
            )
            .collect()
    }

    /// Under [`CollisionPolicy::Fail`], reject the first planned path that
    /// already exists. Nothing is written by this check.
    pub fn check_collisions(&self, planned: &[PathBuf]) -> Result<(), Content2MdError> {
        if self.policy == CollisionPolicy::Replace {
            return Ok(());
        }
        match planned.iter().find(|p| p.exists()) {
            Some(path) => Err(Content2MdError::AssetCollision { path: path.clone() }),
            None => Ok(()),
        }
    }

    /// Create the output directory if it does not exist.
    pub async fn prepare_dir(&self) -> Result<(), AssetError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AssetError::DirectoryUnavailable {
                path: self.output_dir.clone(),
                detail: e.to_string(),
            })
    }

    /// Write page renders, table crops, and picture rasters.
    pub async fn export_rasters(&self, result: &ExtractionResult, write_pages: bool) -> ExportReport {
        let mut report = ExportReport::default();
        for (name, image, picture_index) in self.raster_jobs(result, write_pages) {
            match self.write_raster(&name, image).await {
                Ok(path) => {
                    if let Some(seq) = picture_index {
                        report.index.insert_picture(seq, name);
                    }
                    report.written.push(path);
                }
                Err(e) => {
                    warn!("Asset export failed: {}", e);
                    report.failed.push(e);
                }
            }
        }
        report
    }

    /// Write one rendered document.
    pub async fn write_document(&self, kind: DocumentKind, content: &str) -> Result<PathBuf, AssetError> {
        let path = self.output_dir.join(self.document_file_name(kind));
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AssetError::WriteFailed {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    async fn write_raster(&self, name: &str, image: &DynamicImage) -> Result<PathBuf, AssetError> {
        let bytes = encode::encode_image(image, self.format).map_err(|e| AssetError::EncodeFailed {
            name: name.to_string(),
            detail: e.to_string(),
        })?;
        let path = self.output_dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AssetError::WriteFailed {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// `(file name, raster, picture sequence index)` in write order.
    fn raster_jobs<'a>(
        &self,
        result: &'a ExtractionResult,
        write_pages: bool,
    ) -> Vec<(String, &'a DynamicImage, Option<usize>)> {
        let mut jobs = Vec::new();
        if write_pages {
            for page in &result.pages {
                jobs.push((self.page_file_name(page.page_no), &page.image, None));
            }
        }
        for table in result.tables() {
            if let Some(raster) = &table.raster {
                jobs.push((
                    self.element_file_name(AssetKind::Table, table.sequence_index),
                    raster,
                    None,
                ));
            }
        }
        for image in result.images() {
            if let ImageSource::Raster(raster) = &image.source {
                jobs.push((
                    self.element_file_name(AssetKind::Picture, image.sequence_index),
                    raster,
                    Some(image.sequence_index),
                ));
            }
        }
        jobs
    }
}

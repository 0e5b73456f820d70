//! Extraction entry points.
//!
//! ```text
//! input ─► ContentSource::extract ─► empty? ─► collision check
//!                                                   │
//!          RenderedDocument ◄─ render + write docs ◄┴─ export rasters
//! ```
//!
//! Every error from the content source propagates unchanged. Asset export
//! failures (directory creation, raster writes, document writes) are logged,
//! reported to the observer, and collected in
//! [`RenderedDocument::failed_assets`]; the markdown is still returned.

use crate::config::{ExtractionConfig, Strategy};
use crate::error::Content2MdError;
use crate::export::{AssetExporter, DocumentKind, ExportReport};
use crate::model::{ExtractionResult, ImageSource};
use crate::output::{ExtractionStats, RenderedDocument};
use crate::render::{render_html, render_markdown, AssetIndex, ImageMode, RenderOptions};
use crate::source::{BrowserSource, ContentSource, PdfSource, StaticHtmlSource};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Extract `source_ref` with the chosen strategy and write every asset and
/// document into `output_dir`.
///
/// # Errors
/// Fatal errors only: unreachable or unsupported input, engine failure,
/// [`Content2MdError::EmptyExtraction`] when nothing was found, and
/// [`Content2MdError::AssetCollision`] under the `Fail` collision policy.
///
/// # Example
/// ```rust,no_run
/// use edgequake_content2md::{extract, ExtractionConfig, Strategy};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let doc = extract("report.pdf", Strategy::StructuralPdf, "scratch", &config).await?;
/// println!("{}", doc.markdown_text);
/// # Ok(())
/// # }
/// ```
pub async fn extract(
    source_ref: impl AsRef<str>,
    strategy: Strategy,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RenderedDocument, Content2MdError> {
    let source_ref = source_ref.as_ref();
    let output_dir = output_dir.as_ref();
    match strategy {
        Strategy::StructuralPdf => extract_with(&PdfSource::new(), source_ref, output_dir, config).await,
        Strategy::Browser => extract_with(&BrowserSource, source_ref, output_dir, config).await,
        Strategy::StaticHtml => extract_with(&StaticHtmlSource, source_ref, output_dir, config).await,
    }
}

/// Run the pipeline with any [`ContentSource`].
pub async fn extract_with<S: ContentSource>(
    source: &S,
    source_ref: &str,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RenderedDocument, Content2MdError> {
    let start = Instant::now();
    let observer = &config.observer;
    observer.on_extraction_start(source_ref, source.strategy());

    match run_pipeline(source, source_ref, output_dir.as_ref(), config, start).await {
        Ok(doc) => {
            observer.on_extraction_complete(source_ref, &doc.stats);
            Ok(doc)
        }
        Err(e) => {
            observer.on_extraction_failed(source_ref, &e);
            Err(e)
        }
    }
}

async fn run_pipeline<S: ContentSource>(
    source: &S,
    source_ref: &str,
    output_dir: &Path,
    config: &ExtractionConfig,
    start: Instant,
) -> Result<RenderedDocument, Content2MdError> {
    let observer = &config.observer;

    // ── Step 1–2: Validate input and run the content source ──────────────
    let result = source.extract(source_ref, config).await?;
    let mut stats = element_stats(&result);
    observer.on_elements_extracted(source_ref, &stats);

    // ── Step 3: Nothing found is not a success ───────────────────────────
    if result.is_empty() {
        return Err(Content2MdError::EmptyExtraction {
            source_ref: source_ref.to_string(),
        });
    }

    // ── Step 4: Collision check before anything is written ───────────────
    let exporter = AssetExporter::new(
        output_dir,
        result.document_identifier.clone(),
        config.collision_policy,
        config.asset_format,
    );
    let planned = exporter.planned_paths(&result, config.write_page_images);
    exporter.check_collisions(&planned)?;

    // ── Step 5: Export rasters ───────────────────────────────────────────
    let mut report = ExportReport::default();
    let dir_ready = match exporter.prepare_dir().await {
        Ok(()) => {
            report = exporter
                .export_rasters(&result, config.write_page_images)
                .await;
            true
        }
        Err(e) => {
            warn!("Skipping every asset: {}", e);
            report.failed.push(e);
            false
        }
    };

    // ── Step 6: Render and write documents ───────────────────────────────
    let referenced = RenderOptions {
        section_policy: config.section_policy,
        image_mode: ImageMode::Referenced,
        asset_format: config.asset_format,
    };
    let embedded = RenderOptions {
        image_mode: ImageMode::Embedded,
        ..referenced
    };
    let markdown_text = render_markdown(&result, &report.index, &referenced);

    if dir_ready {
        let documents = [
            (
                DocumentKind::EmbeddedMarkdown,
                render_markdown(&result, &report.index, &embedded),
            ),
            (DocumentKind::ReferencedMarkdown, markdown_text.clone()),
            (
                DocumentKind::ReferencedHtml,
                render_html(&result, &report.index, &referenced),
            ),
        ];
        for (kind, content) in documents {
            match exporter.write_document(kind, &content).await {
                Ok(path) => report.written.push(path),
                Err(e) => {
                    warn!("Document write failed: {}", e);
                    report.failed.push(e);
                }
            }
        }
    }

    for path in &report.written {
        observer.on_asset_written(path);
    }
    for failure in &report.failed {
        observer.on_asset_failed(failure);
    }

    let image_refs = image_refs(&result, &report.index, output_dir);

    stats.assets_written = report.written.len();
    stats.assets_failed = report.failed.len();
    stats.total_duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} elements from {} in {:.2}s ({} assets written, {} failed)",
        stats.total_elements(),
        source_ref,
        stats.total_duration_ms as f64 / 1000.0,
        stats.assets_written,
        stats.assets_failed
    );

    Ok(RenderedDocument {
        markdown_text,
        image_refs,
        document_identifier: result.document_identifier,
        assets_written: report.written,
        failed_assets: report.failed,
        stats,
    })
}

fn element_stats(result: &ExtractionResult) -> ExtractionStats {
    ExtractionStats {
        text_blocks: result.texts().count(),
        tables: result.tables().count(),
        links: result.links().count(),
        images: result.images().count(),
        pages: result.pages.len(),
        ..ExtractionStats::default()
    }
}

/// URL sources verbatim, raster sources as the path of their exported file.
/// Rasters that were not exported have no reference.
fn image_refs(result: &ExtractionResult, index: &AssetIndex, output_dir: &Path) -> Vec<String> {
    result
        .images()
        .filter_map(|image| match &image.source {
            ImageSource::Url(url) => Some(url.clone()),
            ImageSource::Raster(_) => index
                .picture(image.sequence_index)
                .map(|name| output_dir.join(name).to_string_lossy().into_owned()),
        })
        .collect()
}

/// Extract an uploaded PDF held in memory.
///
/// The bytes go to a managed [`tempfile`] that is removed on every exit
/// path. `name` (typically the upload's file name) seeds the document
/// identifier and the markdown title.
pub async fn extract_from_bytes(
    bytes: &[u8],
    name: &str,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RenderedDocument, Content2MdError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("content2md-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| Content2MdError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Content2MdError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract_with` returns
    extract_with(&PdfSource::named(name), &path, output_dir, config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally; do not call from inside
/// an async context.
pub fn extract_sync(
    source_ref: impl AsRef<str>,
    strategy: Strategy,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RenderedDocument, Content2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Content2MdError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(source_ref, strategy, output_dir, config))
}

/// Extract and additionally write the returned markdown to `markdown_path`.
///
/// Uses atomic write (temp file + rename) so readers never see a partial
/// file. Unlike asset writes, a failure here is fatal.
pub async fn extract_to_file(
    source_ref: impl AsRef<str>,
    strategy: Strategy,
    output_dir: impl AsRef<Path>,
    markdown_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RenderedDocument, Content2MdError> {
    let doc = extract(source_ref, strategy, output_dir, config).await?;
    write_atomic(markdown_path.as_ref(), &doc.markdown_text).await?;
    Ok(doc)
}

pub(crate) async fn write_atomic(path: &Path, content: &str) -> Result<(), Content2MdError> {
    let fail = |e| Content2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, content).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    Ok(())
}

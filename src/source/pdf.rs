//! Structural-PDF strategy: pdfium layout analysis with raster export.
//!
//! ## Why render every page up front?
//!
//! Figure and table images are cropped out of the upscaled page render, not
//! pulled from the embedded streams. That gives vector drawings and tables a
//! raster too, but it means the page renders have to be produced while the
//! document is open, at the configured scale, before any element is emitted.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is not safe to call
//! from async contexts. All pdfium work runs on the blocking thread pool.

use super::classify::ElementCollector;
use super::input::{self, document_identifier};
use super::layout::{self, LayoutBlock, LayoutConfig, PageNode, Rect, TextSpan, Transform};
use super::ContentSource;
use crate::config::{ExtractionConfig, Strategy};
use crate::error::Content2MdError;
use crate::model::{ExtractionResult, ImageSource};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extracts text, tables, and figures from a PDF through pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfSource {
    /// Overrides the identifier and display name derived from the input.
    name: Option<String>,
}

impl PdfSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `name` as document identifier and source label. Needed when the
    /// input path is a temp file whose name means nothing to the caller.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl ContentSource for PdfSource {
    fn strategy(&self) -> Strategy {
        Strategy::StructuralPdf
    }

    async fn extract(
        &self,
        source_ref: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult, Content2MdError> {
        let resolved = input::resolve_pdf(source_ref, config).await?;
        let (identifier, label) = match &self.name {
            Some(name) => (document_identifier(name), name.clone()),
            None => (document_identifier(source_ref), source_ref.to_string()),
        };

        let path = resolved.path().to_path_buf();
        let scale = config.image_scale;
        let password = config.password.clone();

        let result = tokio::task::spawn_blocking(move || {
            extract_blocking(&path, &label, identifier, scale, password.as_deref())
        })
        .await
        .map_err(|e| Content2MdError::Internal(format!("PDF task panicked: {e}")))?;

        // The temp download must outlive the blocking task.
        drop(resolved);
        result
    }
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the working directory,
/// then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, Content2MdError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let path = PathBuf::from(&p);
            if path.is_file() {
                Pdfium::bind_to_library(&path)
            } else {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path))
            }
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Content2MdError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    label: &str,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Content2MdError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{e:?}");
        let detail = if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                "wrong password".to_string()
            } else {
                "document is encrypted; supply a password".to_string()
            }
        } else {
            err_str
        };
        Content2MdError::ParseFailure {
            source_ref: label.to_string(),
            detail,
        }
    })
}

/// Blocking implementation of the structural extraction.
fn extract_blocking(
    pdf_path: &Path,
    label: &str,
    identifier: String,
    scale: f32,
    password: Option<&str>,
) -> Result<ExtractionResult, Content2MdError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, label, password)?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
    let layout_config = LayoutConfig::default();
    let mut collector = ElementCollector::new();

    for (idx, page) in pages.iter().enumerate() {
        let page_no = idx + 1;
        let page_size = (page.width().value, page.height().value);

        let raster = page
            .render_with_config(&render_config)
            .map_err(|e| Content2MdError::ParseFailure {
                source_ref: label.to_string(),
                detail: format!("rendering page {page_no} failed: {e:?}"),
            })?
            .as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_no,
            raster.width(),
            raster.height()
        );

        let nodes: Vec<PageNode> = page.objects().iter().filter_map(|o| page_node(&o)).collect();
        let (spans, figures) = layout::flatten_nodes(&nodes);

        let lines = layout::group_lines(spans);
        let blocks = layout::build_blocks(&lines, &layout_config);
        for item in order_page_items(blocks, figures) {
            match item {
                PageItem::Block(LayoutBlock::Paragraph { text, .. }) => collector.push_text(&text),
                PageItem::Block(LayoutBlock::Table { rows, rect }) => {
                    let crop = crop_region(&raster, page_size, &rect);
                    collector.push_table(rows, crop);
                }
                PageItem::Figure(rect) => match crop_region(&raster, page_size, &rect) {
                    Some(img) => collector.push_image(ImageSource::Raster(img)),
                    None => warn!("Skipping degenerate figure on page {}", page_no),
                },
            }
        }

        collector.push_page(page_no, raster);
    }

    Ok(collector.finish(identifier, label.to_string()))
}

fn object_rect(object: &PdfPageObject) -> Option<Rect> {
    let b = object.bounds().ok()?;
    Some(Rect {
        left: b.left().value,
        right: b.right().value,
        top: b.top().value,
        bottom: b.bottom().value,
    })
}

/// Read one page object, descending into form XObjects.
fn page_node(object: &PdfPageObject) -> Option<PageNode> {
    match object.object_type() {
        PdfPageObjectType::Text => Some(PageNode::Text(TextSpan {
            text: object.as_text_object()?.text(),
            rect: object_rect(object)?,
        })),
        PdfPageObjectType::Image => Some(PageNode::Image(object_rect(object)?)),
        PdfPageObjectType::XObjectForm => {
            let form = object.as_x_object_form_object()?;
            let matrix = form
                .matrix()
                .map(|m| Transform {
                    a: m.a(),
                    b: m.b(),
                    c: m.c(),
                    d: m.d(),
                    e: m.e(),
                    f: m.f(),
                })
                .unwrap_or(Transform::IDENTITY);
            let children = (0..form.len())
                .filter_map(|i| form.get(i).ok())
                .filter_map(|child| page_node(&child))
                .collect();
            Some(PageNode::Form { matrix, children })
        }
        _ => None,
    }
}

enum PageItem {
    Block(LayoutBlock),
    Figure(Rect),
}

impl PageItem {
    fn top(&self) -> f32 {
        match self {
            PageItem::Block(b) => b.rect().top,
            PageItem::Figure(r) => r.top,
        }
    }
}

/// Place figures into the block sequence. Blocks already come in reading
/// order (columns included), so each figure goes before the first block
/// below its top edge that shares horizontal extent with it.
fn order_page_items(blocks: Vec<LayoutBlock>, mut figures: Vec<Rect>) -> Vec<PageItem> {
    figures.sort_by(|a, b| b.top.total_cmp(&a.top));
    let mut items: Vec<PageItem> = blocks.into_iter().map(PageItem::Block).collect();
    for figure in figures {
        let at = items
            .iter()
            .position(|item| match item {
                PageItem::Block(b) => {
                    let r = b.rect();
                    r.top < figure.top && r.left < figure.right && r.right > figure.left
                }
                PageItem::Figure(_) => false,
            })
            .unwrap_or(items.len());
        items.insert(at, PageItem::Figure(figure));
    }
    items
}

/// Cut a PDF-space rectangle out of a page render.
///
/// The render's actual pixel size is used to derive the scale, so rounding
/// inside pdfium cannot shift the crop. Returns `None` for regions that do
/// not cover at least one pixel.
pub fn crop_region(
    page: &DynamicImage,
    (page_w, page_h): (f32, f32),
    rect: &Rect,
) -> Option<DynamicImage> {
    if page_w <= 0.0 || page_h <= 0.0 {
        return None;
    }
    let sx = page.width() as f32 / page_w;
    let sy = page.height() as f32 / page_h;

    let x0 = (rect.left * sx).clamp(0.0, page.width() as f32);
    let x1 = (rect.right * sx).clamp(0.0, page.width() as f32);
    let y0 = ((page_h - rect.top) * sy).clamp(0.0, page.height() as f32);
    let y1 = ((page_h - rect.bottom) * sy).clamp(0.0, page.height() as f32);

    let w = (x1 - x0).round() as u32;
    let h = (y1 - y0).round() as u32;
    if w == 0 || h == 0 {
        return None;
    }
    Some(page.crop_imm(x0.floor() as u32, y0.floor() as u32, w, h))
}

/// Plain text of every page, pages separated by a blank line.
pub async fn pdf_text(
    source_ref: &str,
    config: &ExtractionConfig,
) -> Result<String, Content2MdError> {
    let resolved = input::resolve_pdf(source_ref, config).await?;
    let path = resolved.path().to_path_buf();
    let label = source_ref.to_string();
    let password = config.password.clone();

    let text = tokio::task::spawn_blocking(move || -> Result<String, Content2MdError> {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path, &label, password.as_deref())?;
        let mut parts = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let text = page.text().map_err(|e| Content2MdError::ParseFailure {
                source_ref: label.clone(),
                detail: format!("text layer of page {} unreadable: {e:?}", idx + 1),
            })?;
            let all = text.all();
            let trimmed = all.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
        Ok(parts.join("\n\n"))
    })
    .await
    .map_err(|e| Content2MdError::Internal(format!("PDF task panicked: {e}")))??;

    drop(resolved);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn page_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn crop_maps_pdf_space_to_pixels() {
        // 100x200 pt page rendered at 2x.
        let page = page_image(200, 400);
        let rect = Rect {
            left: 10.0,
            right: 60.0,
            top: 190.0,
            bottom: 140.0,
        };
        let crop = crop_region(&page, (100.0, 200.0), &rect).expect("crop");
        assert_eq!(crop.width(), 100);
        assert_eq!(crop.height(), 100);
    }

    #[test]
    fn crop_clamps_to_page() {
        let page = page_image(200, 400);
        let rect = Rect {
            left: -20.0,
            right: 500.0,
            top: 400.0,
            bottom: -10.0,
        };
        let crop = crop_region(&page, (100.0, 200.0), &rect).expect("crop");
        assert_eq!((crop.width(), crop.height()), (200, 400));
    }

    #[test]
    fn degenerate_crop_is_none() {
        let page = page_image(200, 400);
        let rect = Rect {
            left: 10.0,
            right: 10.0,
            top: 50.0,
            bottom: 20.0,
        };
        assert!(crop_region(&page, (100.0, 200.0), &rect).is_none());
        assert!(crop_region(&page, (0.0, 200.0), &rect).is_none());
    }

    #[test]
    fn items_are_ordered_top_down() {
        let para = LayoutBlock::Paragraph {
            text: "caption".into(),
            rect: Rect {
                left: 0.0,
                right: 10.0,
                top: 300.0,
                bottom: 290.0,
            },
        };
        let figure = Rect {
            left: 0.0,
            right: 10.0,
            top: 500.0,
            bottom: 310.0,
        };
        let items = order_page_items(vec![para], vec![figure]);
        assert!(matches!(items[0], PageItem::Figure(_)));
        assert!(matches!(items[1], PageItem::Block(_)));
    }

    fn block(text: &str, left: f32, top: f32) -> LayoutBlock {
        LayoutBlock::Paragraph {
            text: text.into(),
            rect: Rect {
                left,
                right: left + 100.0,
                top,
                bottom: top - 50.0,
            },
        }
    }

    #[test]
    fn figure_in_right_column_follows_left_column() {
        let blocks = vec![
            block("L1", 0.0, 700.0),
            block("L2", 0.0, 500.0),
            block("R1", 200.0, 700.0),
            block("R2", 200.0, 400.0),
        ];
        let figure = Rect {
            left: 200.0,
            right: 300.0,
            top: 600.0,
            bottom: 450.0,
        };
        let order: Vec<String> = order_page_items(blocks, vec![figure])
            .iter()
            .map(|item| match item {
                PageItem::Block(LayoutBlock::Paragraph { text, .. }) => text.clone(),
                PageItem::Block(_) => "table".into(),
                PageItem::Figure(_) => "figure".into(),
            })
            .collect();
        assert_eq!(order, vec!["L1", "L2", "R1", "figure", "R2"]);
    }
}

//! End-to-end test of the structural-PDF strategy.
//!
//! The fixture PDF is generated with pdfium itself, so no binary files are
//! checked in. Skipped when no pdfium library can be bound.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/pdfium cargo test --test pdf_e2e -- --nocapture

use edgequake_content2md::source::pdf::bind_pdfium;
use edgequake_content2md::{
    extract, extract_from_bytes, pdf_text, ExtractionConfig, NoopObserver, Strategy,
};
use image::{DynamicImage, Rgb, RgbImage};
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// Page 1: two paragraphs. Page 2: a caption and one embedded image.
fn build_fixture(path: &Path) -> Result<(), String> {
    let fail = |e: PdfiumError| format!("{e:?}");
    let pdfium = bind_pdfium().map_err(|e| e.to_string())?;
    let mut document = pdfium.create_new_pdf().map_err(fail)?;
    let font = document.fonts_mut().helvetica();

    {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .map_err(fail)?;
        page.objects_mut().create_text_object(
            PdfPoints::new(72.0),
            PdfPoints::new(760.0),
            "Quarterly report",
            font,
            PdfPoints::new(18.0),
        ).map_err(fail)?;
        page.objects_mut().create_text_object(
            PdfPoints::new(72.0),
            PdfPoints::new(640.0),
            "Revenue grew in every region.",
            font,
            PdfPoints::new(12.0),
        ).map_err(fail)?;
    }

    {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .map_err(fail)?;
        page.objects_mut().create_text_object(
            PdfPoints::new(72.0),
            PdfPoints::new(760.0),
            "Figure 1: growth chart",
            font,
            PdfPoints::new(12.0),
        ).map_err(fail)?;
        let chart = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 80, Rgb([30, 90, 200])));
        page.objects_mut().create_image_object(
            PdfPoints::new(72.0),
            PdfPoints::new(400.0),
            &chart,
            Some(PdfPoints::new(240.0)),
            Some(PdfPoints::new(160.0)),
        ).map_err(fail)?;
    }

    document.save_to_file(path).map_err(fail)
}

fn config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .observer(Arc::new(NoopObserver))
        .build()
        .unwrap()
}

fn files_matching(dir: &Path, pred: impl Fn(&str) -> bool) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| pred(n))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn two_page_pdf_with_one_figure_and_other_entry_points() {
    if bind_pdfium().is_err() {
        println!("SKIP: no pdfium library found (set PDFIUM_LIB_PATH)");
        return;
    }

    let scratch = tempfile::tempdir().unwrap();
    let pdf_path = scratch.path().join("report.pdf");
    build_fixture(&pdf_path).expect("fixture PDF");
    let out = scratch.path().join("out");

    let doc = extract(
        pdf_path.to_string_lossy(),
        Strategy::StructuralPdf,
        &out,
        &config(),
    )
    .await
    .expect("extraction");

    assert_eq!(doc.document_identifier, "report");
    assert_eq!(files_matching(&out, |n| n == "report-1.png" || n == "report-2.png").len(), 2);
    let pictures = files_matching(&out, |n| n.starts_with("report-picture-"));
    assert_eq!(pictures, vec!["report-picture-1.png".to_string()]);

    let embedded = std::fs::read_to_string(out.join("report-with-images.md")).unwrap();
    assert_eq!(embedded.matches("![Image](data:image/png;base64,").count(), 1);

    let referenced = std::fs::read_to_string(out.join("report-with-image-refs.md")).unwrap();
    let refs: Vec<&str> = referenced
        .lines()
        .filter_map(|l| l.strip_prefix("![Image](")?.strip_suffix(')'))
        .collect();
    assert_eq!(refs, vec!["report-picture-1.png"]);
    assert_eq!(referenced, doc.markdown_text);

    assert!(doc.markdown_text.contains("Quarterly report"));
    assert!(doc.markdown_text.contains("Revenue grew in every region."));
    assert_eq!(doc.stats.pages, 2);
    assert_eq!(doc.stats.images, 1);
    assert!(doc.is_complete());

    // Other entry points over the same fixture. pdfium is bound by one
    // test at a time, so they share this test.
    let text = pdf_text(&pdf_path.to_string_lossy(), &config())
        .await
        .unwrap();
    assert!(text.contains("Quarterly report"));
    assert!(text.contains("Figure 1"));

    let bytes = std::fs::read(&pdf_path).unwrap();
    let upload = scratch.path().join("upload");
    let doc = extract_from_bytes(&bytes, "Upload Q3.pdf", &upload, &config())
        .await
        .unwrap();
    assert!(doc.markdown_text.starts_with("# Extracted Content from Upload Q3.pdf\n"));
    assert!(upload
        .join(format!("{}-with-image-refs.md", doc.document_identifier))
        .is_file());
}

#[tokio::test]
async fn non_pdf_input_is_unsupported() {
    let scratch = tempfile::tempdir().unwrap();
    let fake = scratch.path().join("notes.pdf");
    std::fs::write(&fake, b"plain text, not a PDF").unwrap();

    let err = extract(
        fake.to_string_lossy(),
        Strategy::StructuralPdf,
        scratch.path(),
        &config(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        edgequake_content2md::Content2MdError::UnsupportedFormat { .. }
    ));
}

//! Orchestrator behaviour with an in-test content source.
//!
//! No pdfium, browser, or network is needed: `FakeSource` hands back a
//! prepared `ExtractionResult` so the export, render, and failure paths can
//! be exercised directly.

use edgequake_content2md::{
    extract_with, AssetError, CollisionPolicy, Content2MdError, ContentSource, ExtractedElement,
    ExtractionConfig, ExtractionObserver, ExtractionResult, ImageRef, ImageSource, LinkRef,
    NoopObserver, PageRaster, Strategy, TableBlock, TextBlock,
};
use image::DynamicImage;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

struct FakeSource {
    result: ExtractionResult,
}

impl ContentSource for FakeSource {
    fn strategy(&self) -> Strategy {
        Strategy::StructuralPdf
    }

    async fn extract(
        &self,
        _source_ref: &str,
        _config: &ExtractionConfig,
    ) -> Result<ExtractionResult, Content2MdError> {
        Ok(self.result.clone())
    }
}

#[derive(Default)]
struct Counting {
    written: AtomicUsize,
    failed: AtomicUsize,
    errors: AtomicUsize,
}

impl ExtractionObserver for Counting {
    fn on_asset_written(&self, _path: &Path) {
        self.written.fetch_add(1, Ordering::SeqCst);
    }
    fn on_asset_failed(&self, _error: &AssetError) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_extraction_failed(&self, _source_ref: &str, _error: &Content2MdError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

fn quiet_config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .observer(Arc::new(NoopObserver))
        .build()
        .unwrap()
}

fn raster() -> DynamicImage {
    DynamicImage::new_rgb8(6, 4)
}

/// Two pages, one table with a crop, two figures, a link, and a remote image.
fn pdf_like() -> ExtractionResult {
    ExtractionResult {
        document_identifier: "paper".into(),
        source: "paper.pdf".into(),
        elements: vec![
            ExtractedElement::Text(TextBlock {
                content: "Abstract".into(),
            }),
            ExtractedElement::Image(ImageRef {
                source: ImageSource::Raster(raster()),
                sequence_index: 1,
            }),
            ExtractedElement::Table(TableBlock {
                rows: vec![vec!["a".into(), "b".into()], vec!["1".into(), "2".into()]],
                sequence_index: 1,
                raster: Some(raster()),
            }),
            ExtractedElement::Link(LinkRef {
                label: String::new(),
                href: "https://example.com/".into(),
            }),
            ExtractedElement::Image(ImageRef {
                source: ImageSource::Url("https://example.com/remote.png".into()),
                sequence_index: 2,
            }),
            ExtractedElement::Image(ImageRef {
                source: ImageSource::Raster(raster()),
                sequence_index: 3,
            }),
        ],
        pages: vec![
            PageRaster {
                page_no: 1,
                image: raster(),
            },
            PageRaster {
                page_no: 2,
                image: raster(),
            },
        ],
    }
}

fn empty() -> ExtractionResult {
    ExtractionResult {
        document_identifier: "blank".into(),
        source: "blank.pdf".into(),
        elements: Vec::new(),
        pages: vec![PageRaster {
            page_no: 1,
            image: raster(),
        }],
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_result_is_soft_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let observer = Arc::new(Counting::default());
    let config = ExtractionConfig::builder()
        .observer(observer.clone())
        .build()
        .unwrap();

    let err = extract_with(&FakeSource { result: empty() }, "blank.pdf", &out, &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Content2MdError::EmptyExtraction { .. }));
    assert!(err.is_soft());
    assert!(!out.exists(), "nothing may be written for an empty result");
    assert_eq!(observer.errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exports_every_asset_and_document() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();
    let source = FakeSource { result: pdf_like() };

    let doc = extract_with(&source, "paper.pdf", out, &quiet_config())
        .await
        .unwrap();

    for name in [
        "paper-1.png",
        "paper-2.png",
        "paper-table-1.png",
        "paper-picture-1.png",
        "paper-picture-3.png",
        "paper-with-images.md",
        "paper-with-image-refs.md",
        "paper-with-image-refs.html",
    ] {
        assert!(out.join(name).is_file(), "missing {name}");
    }
    assert!(!out.join("paper-picture-2.png").exists());
    assert!(doc.is_complete());
    assert_eq!(doc.assets_written.len(), 8);
    assert_eq!(doc.stats.assets_written, 8);
    assert_eq!(doc.stats.images, 3);
    assert_eq!(doc.stats.pages, 2);
    assert_eq!(doc.document_identifier, "paper");
}

#[tokio::test]
async fn references_match_exported_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();
    let doc = extract_with(&FakeSource { result: pdf_like() }, "paper.pdf", out, &quiet_config())
        .await
        .unwrap();

    let md = &doc.markdown_text;
    let targets: Vec<&str> = md
        .lines()
        .filter_map(|l| l.strip_prefix("![Image](")?.strip_suffix(')'))
        .collect();
    assert_eq!(
        targets,
        vec![
            "paper-picture-1.png",
            "https://example.com/remote.png",
            "paper-picture-3.png"
        ]
    );
    for t in targets.iter().filter(|t| !t.starts_with("http")) {
        assert!(out.join(t).is_file(), "reference {t} has no file");
    }

    assert_eq!(
        doc.image_refs,
        vec![
            out.join("paper-picture-1.png").to_string_lossy().into_owned(),
            "https://example.com/remote.png".to_string(),
            out.join("paper-picture-3.png").to_string_lossy().into_owned(),
        ]
    );

    let on_disk = std::fs::read_to_string(out.join("paper-with-image-refs.md")).unwrap();
    assert_eq!(&on_disk, md);
    assert!(md.contains("### Table 1\n\n| a | b |\n| 1 | 2 |\n"));
    assert!(md.contains("- [Link](https://example.com/)\n"));

    let embedded = std::fs::read_to_string(out.join("paper-with-images.md")).unwrap();
    assert_eq!(embedded.matches("](data:image/png;base64,").count(), 2);
}

#[tokio::test]
async fn unusable_output_dir_downgrades_to_partial_success() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let observer = Arc::new(Counting::default());
    let config = ExtractionConfig::builder()
        .observer(observer.clone())
        .build()
        .unwrap();

    let doc = extract_with(&FakeSource { result: pdf_like() }, "paper.pdf", &blocker, &config)
        .await
        .expect("asset failures must not be fatal");

    assert!(!doc.is_complete());
    assert!(doc.assets_written.is_empty());
    assert!(matches!(
        doc.failed_assets[0],
        AssetError::DirectoryUnavailable { .. }
    ));
    assert_eq!(observer.failed.load(Ordering::SeqCst), doc.failed_assets.len());
    assert_eq!(observer.written.load(Ordering::SeqCst), 0);

    // Raster references are dropped, remote ones survive.
    assert!(!doc.markdown_text.contains("paper-picture"));
    assert!(doc
        .markdown_text
        .contains("![Image](https://example.com/remote.png)"));
    assert_eq!(doc.image_refs, vec!["https://example.com/remote.png".to_string()]);
}

#[tokio::test]
async fn fail_policy_rejects_existing_output_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();
    std::fs::write(out.join("paper-with-image-refs.html"), b"old").unwrap();

    let config = ExtractionConfig::builder()
        .collision_policy(CollisionPolicy::Fail)
        .observer(Arc::new(NoopObserver))
        .build()
        .unwrap();

    let err = extract_with(&FakeSource { result: pdf_like() }, "paper.pdf", out, &config)
        .await
        .unwrap_err();
    match err {
        Content2MdError::AssetCollision { path } => {
            assert_eq!(path, out.join("paper-with-image-refs.html"))
        }
        other => panic!("expected AssetCollision, got {other:?}"),
    }
    assert!(!out.join("paper-1.png").exists());
    assert_eq!(
        std::fs::read(out.join("paper-with-image-refs.html")).unwrap(),
        b"old"
    );
}

#[tokio::test]
async fn replace_policy_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();
    std::fs::write(out.join("paper-with-image-refs.md"), b"old").unwrap();

    let doc = extract_with(&FakeSource { result: pdf_like() }, "paper.pdf", out, &quiet_config())
        .await
        .unwrap();
    let on_disk = std::fs::read_to_string(out.join("paper-with-image-refs.md")).unwrap();
    assert_eq!(on_disk, doc.markdown_text);
}

#[tokio::test]
async fn page_images_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();
    let config = ExtractionConfig::builder()
        .write_page_images(false)
        .observer(Arc::new(NoopObserver))
        .build()
        .unwrap();

    let doc = extract_with(&FakeSource { result: pdf_like() }, "paper.pdf", out, &config)
        .await
        .unwrap();
    assert!(!out.join("paper-1.png").exists());
    assert!(out.join("paper-picture-1.png").is_file());
    assert_eq!(doc.assets_written.len(), 6);
}

#[tokio::test]
async fn result_serialises_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let doc = extract_with(
        &FakeSource { result: pdf_like() },
        "paper.pdf",
        dir.path(),
        &quiet_config(),
    )
    .await
    .unwrap();
    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["document_identifier"], "paper");
    assert_eq!(json["stats"]["tables"], 1);
    assert!(json["markdown_text"]
        .as_str()
        .unwrap()
        .starts_with("# Extracted Content from paper.pdf\n"));
}

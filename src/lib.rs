//! # edgequake-content2md
//!
//! Extract PDF documents and web pages into Markdown, exporting every image
//! alongside.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF path / URL / bytes, or web page URL
//!  │
//!  ├─ 1. Source    pdfium layout analysis │ headless Chrome │ HTTP GET + parser
//!  ├─ 2. Classify  text / table / link / image, 1-based sequence indices
//!  ├─ 3. Export    page renders, table and figure crops → {doc}-*.png
//!  ├─ 4. Render    Markdown (embedded + referenced) and HTML
//!  └─ 5. Output    RenderedDocument: markdown, image refs, asset report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_content2md::{extract, ExtractionConfig, Strategy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let url = "https://example.com/article";
//!     let doc = extract(url, Strategy::detect(url), "scratch", &config).await?;
//!     println!("{}", doc.markdown_text);
//!     for r in &doc.image_refs {
//!         eprintln!("image: {r}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `content2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `browser` | on      | Enables the browser-driven strategy (chromiumoxide) |
//!
//! Disable default features when using only the library:
//! ```toml
//! edgequake-content2md = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! The PDF strategy binds to a pdfium shared library at runtime. Set
//! `PDFIUM_LIB_PATH` to the library (or its directory); otherwise the
//! working directory and the system library path are searched.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod observer;
pub mod output;
pub mod render;
pub mod source;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AssetFormat, CollisionPolicy, ExtractionConfig, ExtractionConfigBuilder, SectionPolicy,
    Strategy, DEFAULT_DOM_READY_TIMEOUT_SECS, DEFAULT_IMAGE_SCALE,
};
pub use error::{AssetError, Content2MdError};
pub use extract::{
    extract, extract_from_bytes, extract_sync, extract_to_file, extract_with,
};
pub use model::{
    ExtractedElement, ExtractionResult, ImageRef, ImageSource, LinkRef, PageRaster, TableBlock,
    TextBlock,
};
pub use observer::{ExtractionObserver, NoopObserver, SharedObserver, TracingObserver};
pub use output::{ExtractionStats, RenderedDocument};
pub use source::pdf::pdf_text;
pub use source::{BrowserSource, ContentSource, PdfSource, StaticHtmlSource};

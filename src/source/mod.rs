//! Content source adapters.
//!
//! Each adapter wraps one external extraction engine and reduces its output
//! to an [`ExtractionResult`]:
//!
//! | Adapter              | Engine                  | Accepts           |
//! |----------------------|-------------------------|-------------------|
//! | [`PdfSource`]        | pdfium                  | PDF path or URL   |
//! | [`BrowserSource`]    | Chrome over CDP         | page URL          |
//! | [`StaticHtmlSource`] | reqwest + scraper       | page URL          |
//!
//! Classification and sequence numbering live in [`classify`], so every
//! adapter hands the renderer identical shapes.

pub mod browser;
pub mod classify;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod static_html;
pub mod web;

use crate::config::{ExtractionConfig, Strategy};
use crate::error::Content2MdError;
use crate::model::ExtractionResult;
use std::future::Future;

pub use browser::BrowserSource;
pub use pdf::PdfSource;
pub use static_html::StaticHtmlSource;

/// One extraction capability.
///
/// Implementations validate `source_ref` themselves and fail with
/// [`Content2MdError::SourceUnavailable`], [`Content2MdError::UnsupportedFormat`]
/// or [`Content2MdError::ParseFailure`]. An empty result is not an error at
/// this level; the orchestrator decides what emptiness means.
pub trait ContentSource {
    fn strategy(&self) -> Strategy;

    fn extract(
        &self,
        source_ref: &str,
        config: &ExtractionConfig,
    ) -> impl Future<Output = Result<ExtractionResult, Content2MdError>> + Send;
}

//! Observer trait for extraction lifecycle events.
//!
//! The orchestrator never logs through a process-wide singleton directly;
//! it reports every event to the [`ExtractionObserver`] carried in
//! [`crate::config::ExtractionConfig`]. The default, [`TracingObserver`],
//! forwards events to `tracing`. Callers can swap in their own observer to
//! drive a progress bar, collect metrics, or silence output entirely with
//! [`NoopObserver`].
//!
//! # Example
//!
//! ```rust
//! use edgequake_content2md::{ExtractionConfig, ExtractionObserver};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     written: AtomicUsize,
//! }
//!
//! impl ExtractionObserver for CountingObserver {
//!     fn on_asset_written(&self, _path: &Path) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { written: AtomicUsize::new(0) });
//! let config = ExtractionConfig::builder()
//!     .observer(observer as Arc<dyn ExtractionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::config::Strategy;
use crate::error::{AssetError, Content2MdError};
use crate::output::ExtractionStats;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Receives events from the extraction pipeline.
///
/// All methods have default no-op implementations so implementors only
/// override what they care about. Implementations must be `Send + Sync`
/// because the config that carries them is shared across tasks.
pub trait ExtractionObserver: Send + Sync {
    /// Called once before the content source is invoked.
    fn on_extraction_start(&self, source_ref: &str, strategy: Strategy) {
        let _ = (source_ref, strategy);
    }

    /// Called after the content source returned, before anything is written.
    fn on_elements_extracted(&self, source_ref: &str, counts: &ExtractionStats) {
        let _ = (source_ref, counts);
    }

    /// Called for every file written to the output directory.
    fn on_asset_written(&self, path: &Path) {
        let _ = path;
    }

    /// Called for every asset that could not be written.
    fn on_asset_failed(&self, error: &AssetError) {
        let _ = error;
    }

    /// Called once when a document was produced.
    fn on_extraction_complete(&self, source_ref: &str, stats: &ExtractionStats) {
        let _ = (source_ref, stats);
    }

    /// Called once when the extraction ends with an error.
    fn on_extraction_failed(&self, source_ref: &str, error: &Content2MdError) {
        let _ = (source_ref, error);
    }
}

/// Discards every event.
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}

/// Logs every event through `tracing`. The default observer.
pub struct TracingObserver;

impl ExtractionObserver for TracingObserver {
    fn on_extraction_start(&self, source_ref: &str, strategy: Strategy) {
        info!("Starting extraction: {} ({})", source_ref, strategy);
    }

    fn on_elements_extracted(&self, source_ref: &str, counts: &ExtractionStats) {
        info!(
            "Extracted from {}: {} text blocks, {} tables, {} links, {} images, {} pages",
            source_ref, counts.text_blocks, counts.tables, counts.links, counts.images, counts.pages
        );
    }

    fn on_asset_written(&self, path: &Path) {
        tracing::debug!("Wrote {}", path.display());
    }

    fn on_asset_failed(&self, error: &AssetError) {
        warn!("Asset skipped: {}", error);
    }

    fn on_extraction_complete(&self, source_ref: &str, stats: &ExtractionStats) {
        info!(
            "Extraction complete: {} ({} assets, {} failed, {}ms)",
            source_ref, stats.assets_written, stats.assets_failed, stats.total_duration_ms
        );
    }

    fn on_extraction_failed(&self, source_ref: &str, error: &Content2MdError) {
        if error.is_soft() {
            warn!("{}", error);
        } else {
            error!("Extraction of {} failed: {}", source_ref, error);
        }
    }
}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type SharedObserver = Arc<dyn ExtractionObserver>;

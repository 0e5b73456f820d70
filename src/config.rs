//! Configuration types for content extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The builder lets callers set only
//! what they care about and rely on documented defaults for the rest.

use crate::error::Content2MdError;
use crate::observer::{SharedObserver, TracingObserver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default supersampling factor for PDF page and element rasters.
pub const DEFAULT_IMAGE_SCALE: f32 = 2.0;

/// Default number of seconds the browser strategy waits for `<body>`.
pub const DEFAULT_DOM_READY_TIMEOUT_SECS: u64 = 20;

/// User-Agent sent with every HTTP request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Configuration for one extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_content2md::{CollisionPolicy, ExtractionConfig};
///
/// let config = ExtractionConfig::builder()
///     .image_scale(3.0)
///     .collision_policy(CollisionPolicy::Fail)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Upscaling factor applied when rasterising PDF pages. Default: 2.0.
    ///
    /// Figures are usually embedded rasters; supersampling the page before
    /// cropping keeps them legible after re-export. Element crops inherit the
    /// page scale, so this must be fixed before extraction starts.
    pub image_scale: f32,

    /// Seconds the browser strategy waits for `<body>` to exist. Default: 20.
    pub dom_ready_timeout_secs: u64,

    /// Timeout for every HTTP request in seconds. Default: 120.
    pub http_timeout_secs: u64,

    /// User-Agent header for HTTP requests.
    pub user_agent: String,

    /// Whether empty sections are omitted or rendered as bare headers.
    pub section_policy: SectionPolicy,

    /// What to do when an output file already exists. Default: replace.
    pub collision_policy: CollisionPolicy,

    /// Encoding of exported rasters. Default: PNG.
    pub asset_format: AssetFormat,

    /// Write one image per PDF page. Default: true.
    pub write_page_images: bool,

    /// Web strategies: fetch `<img>` bytes and export them as pictures
    /// instead of referencing the remote URL. Default: false.
    pub download_images: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Chrome/Chromium binary for the browser strategy. If None, the driver
    /// searches the usual install locations.
    pub chrome_executable: Option<PathBuf>,

    /// Run the browser without a window. Default: true.
    pub headless: bool,

    /// Receives lifecycle events. Default: [`TracingObserver`].
    pub observer: SharedObserver,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            image_scale: DEFAULT_IMAGE_SCALE,
            dom_ready_timeout_secs: DEFAULT_DOM_READY_TIMEOUT_SECS,
            http_timeout_secs: 120,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            section_policy: SectionPolicy::default(),
            collision_policy: CollisionPolicy::default(),
            asset_format: AssetFormat::default(),
            write_page_images: true,
            download_images: false,
            password: None,
            chrome_executable: None,
            headless: true,
            observer: Arc::new(TracingObserver),
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("image_scale", &self.image_scale)
            .field("dom_ready_timeout_secs", &self.dom_ready_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("section_policy", &self.section_policy)
            .field("collision_policy", &self.collision_policy)
            .field("asset_format", &self.asset_format)
            .field("write_page_images", &self.write_page_images)
            .field("download_images", &self.download_images)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("chrome_executable", &self.chrome_executable)
            .field("headless", &self.headless)
            .field("observer", &"<dyn ExtractionObserver>")
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn image_scale(mut self, scale: f32) -> Self {
        self.config.image_scale = scale.clamp(0.5, 8.0);
        self
    }

    pub fn dom_ready_timeout_secs(mut self, secs: u64) -> Self {
        self.config.dom_ready_timeout_secs = secs;
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn section_policy(mut self, policy: SectionPolicy) -> Self {
        self.config.section_policy = policy;
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.collision_policy = policy;
        self
    }

    pub fn asset_format(mut self, format: AssetFormat) -> Self {
        self.config.asset_format = format;
        self
    }

    pub fn write_page_images(mut self, v: bool) -> Self {
        self.config.write_page_images = v;
        self
    }

    pub fn download_images(mut self, v: bool) -> Self {
        self.config.download_images = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn headless(mut self, v: bool) -> Self {
        self.config.headless = v;
        self
    }

    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.config.observer = observer;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Content2MdError> {
        let c = &self.config;
        if !c.image_scale.is_finite() || c.image_scale < 0.5 || c.image_scale > 8.0 {
            return Err(Content2MdError::InvalidConfig(format!(
                "Image scale must be 0.5–8.0, got {}",
                c.image_scale
            )));
        }
        if c.dom_ready_timeout_secs == 0 {
            return Err(Content2MdError::InvalidConfig(
                "DOM readiness timeout must be ≥ 1 second".into(),
            ));
        }
        if c.http_timeout_secs == 0 {
            return Err(Content2MdError::InvalidConfig(
                "HTTP timeout must be ≥ 1 second".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(Content2MdError::InvalidConfig(
                "User-Agent must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which content source handles an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Layout-aware PDF extraction through pdfium.
    StructuralPdf,
    /// Live headless browser querying the rendered DOM.
    Browser,
    /// Single HTTP GET parsed without running scripts.
    StaticHtml,
}

impl Strategy {
    /// Pick a strategy from the shape of the input: local paths and URLs
    /// ending in `.pdf` go to the PDF strategy, other URLs to static HTML.
    pub fn detect(input: &str) -> Strategy {
        if crate::source::input::is_url(input) {
            let path = input
                .split(['?', '#'])
                .next()
                .unwrap_or(input)
                .to_ascii_lowercase();
            if path.ends_with(".pdf") {
                Strategy::StructuralPdf
            } else {
                Strategy::StaticHtml
            }
        } else {
            Strategy::StructuralPdf
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::StructuralPdf => "structural-pdf",
            Strategy::Browser => "browser",
            Strategy::StaticHtml => "static-html",
        };
        f.write_str(name)
    }
}

/// How the renderer treats a category with no elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SectionPolicy {
    /// Omit the section entirely. (default)
    #[default]
    Skip,
    /// Emit the section header with nothing under it.
    EmitHeader,
}

/// What the exporter does when a target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Overwrite silently. (default)
    #[default]
    Replace,
    /// Abort with [`Content2MdError::AssetCollision`] before writing anything.
    Fail,
}

/// Encoding for exported rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssetFormat {
    #[default]
    Png,
    Jpeg,
}

impl AssetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AssetFormat::Png => "png",
            AssetFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            AssetFormat::Png => "image/png",
            AssetFormat::Jpeg => "image/jpeg",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            AssetFormat::Png => image::ImageFormat::Png,
            AssetFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = ExtractionConfig::default();
        assert_eq!(c.image_scale, 2.0);
        assert_eq!(c.dom_ready_timeout_secs, 20);
        assert_eq!(c.section_policy, SectionPolicy::Skip);
        assert_eq!(c.collision_policy, CollisionPolicy::Replace);
        assert!(c.write_page_images);
        assert!(!c.download_images);
    }

    #[test]
    fn builder_clamps_scale() {
        let c = ExtractionConfig::builder().image_scale(50.0).build().unwrap();
        assert_eq!(c.image_scale, 8.0);
        let c = ExtractionConfig::builder().image_scale(0.1).build().unwrap();
        assert_eq!(c.image_scale, 0.5);
    }

    #[test]
    fn builder_rejects_zero_timeouts() {
        assert!(ExtractionConfig::builder()
            .dom_ready_timeout_secs(0)
            .build()
            .is_err());
        assert!(ExtractionConfig::builder()
            .http_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn builder_rejects_blank_user_agent() {
        let err = ExtractionConfig::builder().user_agent("  ").build().unwrap_err();
        assert!(err.to_string().contains("User-Agent"));
    }

    #[test]
    fn debug_redacts_password() {
        let c = ExtractionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn strategy_detection() {
        assert_eq!(Strategy::detect("paper.pdf"), Strategy::StructuralPdf);
        assert_eq!(
            Strategy::detect("https://arxiv.org/pdf/1706.03762v7.PDF"),
            Strategy::StructuralPdf
        );
        assert_eq!(
            Strategy::detect("https://example.com/a.pdf?download=1"),
            Strategy::StructuralPdf
        );
        assert_eq!(
            Strategy::detect("https://example.com/blog/post"),
            Strategy::StaticHtml
        );
    }

    #[test]
    fn asset_format_extensions() {
        assert_eq!(AssetFormat::Png.extension(), "png");
        assert_eq!(AssetFormat::Jpeg.extension(), "jpg");
        assert_eq!(AssetFormat::Jpeg.mime_type(), "image/jpeg");
    }
}

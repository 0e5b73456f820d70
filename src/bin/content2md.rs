//! CLI binary for edgequake-content2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_content2md::{
    extract, extract_to_file, pdf_text, AssetError, AssetFormat, CollisionPolicy,
    Content2MdError, ExtractionConfig, ExtractionObserver, ExtractionStats, SectionPolicy,
    SharedObserver, Strategy, DEFAULT_DOM_READY_TIMEOUT_SECS, DEFAULT_IMAGE_SCALE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner plus one log line per lifecycle event.
struct CliObserver {
    bar: ProgressBar,
    written: AtomicUsize,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            written: AtomicUsize::new(0),
        })
    }
}

impl ExtractionObserver for CliObserver {
    fn on_extraction_start(&self, source_ref: &str, strategy: Strategy) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("{source_ref} ({strategy})"));
    }

    fn on_elements_extracted(&self, _source_ref: &str, counts: &ExtractionStats) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "{} text blocks, {} tables, {} links, {} images, {} pages",
                counts.text_blocks, counts.tables, counts.links, counts.images, counts.pages
            ))
        ));
        self.bar.set_prefix("Exporting");
    }

    fn on_asset_written(&self, path: &Path) {
        let n = self.written.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.set_message(format!("{n} files"));
        self.bar
            .println(format!("  {} {}", green("✓"), dim(&path.display().to_string())));
    }

    fn on_asset_failed(&self, error: &AssetError) {
        self.bar.println(format!("  {} {}", red("✗"), red(&error.to_string())));
    }

    fn on_extraction_complete(&self, _source_ref: &str, stats: &ExtractionStats) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} elements, {} files written  {}",
            if stats.assets_failed == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&stats.total_elements().to_string()),
            stats.assets_written,
            dim(&format!("{}ms", stats.total_duration_ms)),
        );
    }

    fn on_extraction_failed(&self, _source_ref: &str, error: &Content2MdError) {
        self.bar.finish_and_clear();
        if error.is_soft() {
            eprintln!("{} {}", cyan("⚠"), error);
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PDF to markdown, assets into ./scratch
  content2md report.pdf

  # Web page, static HTML, markdown into a file
  content2md https://example.com/post -o post.md

  # Script-rendered page through headless Chrome
  content2md --strategy browser https://example.com/app -d out/

  # Download page images and export them next to the markdown
  content2md --download-images https://example.com/gallery

  # Plain text of a PDF, no layout analysis
  content2md --text-only report.pdf

  # JSON result (markdown, image refs, written files, stats)
  content2md --json report.pdf > result.json

OUTPUT FILES (in --output-dir):
  {doc}-{page}.png             page render (PDF only)
  {doc}-table-{n}.png          table region crop (PDF only)
  {doc}-picture-{n}.png        figure crop or downloaded image
  {doc}-with-images.md         markdown with embedded images
  {doc}-with-image-refs.md     markdown referencing the exported files
  {doc}-with-image-refs.html   HTML referencing the exported files

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides --verbose / --quiet
"#;

/// Extract PDF documents and web pages into Markdown with image export.
#[derive(Parser, Debug)]
#[command(
    name = "content2md",
    version,
    about = "Extract PDF documents and web pages into Markdown with image export",
    long_about = "Extract text, tables, links, and images from PDF files (local or URL) and web \
pages into canonical Markdown. PDFs go through pdfium layout analysis; web pages are fetched as \
static HTML or rendered in a headless Chrome.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF path, PDF URL, or web page URL.
    input: String,

    /// Extraction strategy.
    #[arg(long, env = "CONTENT2MD_STRATEGY", value_enum, default_value = "auto")]
    strategy: StrategyArg,

    /// Directory for exported assets and rendered documents.
    #[arg(short = 'd', long, env = "CONTENT2MD_OUTPUT_DIR", default_value = "scratch")]
    output_dir: PathBuf,

    /// Also write the returned Markdown to this file (atomic).
    #[arg(short, long, env = "CONTENT2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// Image upscaling factor for PDF renders (0.5–8.0).
    #[arg(long, env = "CONTENT2MD_SCALE", default_value_t = DEFAULT_IMAGE_SCALE)]
    scale: f32,

    /// Seconds to wait for the page body in browser mode.
    #[arg(long, env = "CONTENT2MD_DOM_TIMEOUT", default_value_t = DEFAULT_DOM_READY_TIMEOUT_SECS)]
    dom_timeout: u64,

    /// HTTP timeout in seconds (page GET, PDF and image downloads).
    #[arg(long, env = "CONTENT2MD_HTTP_TIMEOUT", default_value_t = 120)]
    http_timeout: u64,

    /// What to do when an output file already exists.
    #[arg(long, env = "CONTENT2MD_COLLISION", value_enum, default_value = "replace")]
    collision: CollisionArg,

    /// Emit section headers even when a section has no elements.
    #[arg(long, env = "CONTENT2MD_EMIT_EMPTY_SECTIONS")]
    emit_empty_sections: bool,

    /// Download web page images and export them as picture files.
    #[arg(long, env = "CONTENT2MD_DOWNLOAD_IMAGES")]
    download_images: bool,

    /// Do not write per-page renders of PDFs.
    #[arg(long, env = "CONTENT2MD_NO_PAGE_IMAGES")]
    no_page_images: bool,

    /// Raster format for exported images.
    #[arg(long, env = "CONTENT2MD_FORMAT", value_enum, default_value = "png")]
    format: FormatArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CONTENT2MD_PASSWORD")]
    password: Option<String>,

    /// Chrome/Chromium executable for browser mode.
    #[arg(long, env = "CONTENT2MD_CHROME")]
    chrome: Option<PathBuf>,

    /// Show the browser window instead of running headless.
    #[arg(long, env = "CONTENT2MD_HEADFUL")]
    headful: bool,

    /// Print the plain text of a PDF only; no assets are written.
    #[arg(long)]
    text_only: bool,

    /// Output the RenderedDocument as JSON instead of Markdown.
    #[arg(long, env = "CONTENT2MD_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "CONTENT2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CONTENT2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CONTENT2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Auto,
    Pdf,
    Browser,
    Static,
}

impl StrategyArg {
    fn resolve(self, input: &str) -> Strategy {
        match self {
            StrategyArg::Auto => Strategy::detect(input),
            StrategyArg::Pdf => Strategy::StructuralPdf,
            StrategyArg::Browser => Strategy::Browser,
            StrategyArg::Static => Strategy::StaticHtml,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CollisionArg {
    Replace,
    Fail,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(v: CollisionArg) -> Self {
        match v {
            CollisionArg::Replace => CollisionPolicy::Replace,
            CollisionArg::Fail => CollisionPolicy::Fail,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for AssetFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => AssetFormat::Png,
            FormatArg::Jpeg => AssetFormat::Jpeg,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs; --verbose brings them back.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.text_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let observer: Option<SharedObserver> = if show_progress {
        Some(CliObserver::new() as Arc<dyn ExtractionObserver>)
    } else {
        None
    };
    let config = build_config(&cli, observer)?;

    // ── Text-only mode ───────────────────────────────────────────────────
    if cli.text_only {
        let text = pdf_text(&cli.input, &config)
            .await
            .context("Text extraction failed")?;
        return emit(&text, cli.output.as_deref()).await;
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let strategy = cli.strategy.resolve(&cli.input);
    let doc = match cli.output {
        Some(ref path) => extract_to_file(&cli.input, strategy, &cli.output_dir, path, &config)
            .await
            .context("Extraction failed")?,
        None => extract(&cli.input, strategy, &cli.output_dir, &config)
            .await
            .context("Extraction failed")?,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&doc).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output.is_none() {
        emit(&doc.markdown_text, None).await?;
    }

    if !cli.quiet && !cli.json {
        if let Some(ref path) = cli.output {
            eprintln!("   →  {}", bold(&path.display().to_string()));
        }
        for failure in &doc.failed_assets {
            if !show_progress {
                eprintln!("  {} {}", red("✗"), failure);
            }
        }
    }

    Ok(())
}

/// Write `text` to `path`, or to stdout with a trailing newline.
async fn emit(text: &str, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        return tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()));
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, observer: Option<SharedObserver>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .image_scale(cli.scale)
        .dom_ready_timeout_secs(cli.dom_timeout)
        .http_timeout_secs(cli.http_timeout)
        .collision_policy(cli.collision.into())
        .asset_format(cli.format.into())
        .section_policy(if cli.emit_empty_sections {
            SectionPolicy::EmitHeader
        } else {
            SectionPolicy::Skip
        })
        .download_images(cli.download_images)
        .write_page_images(!cli.no_page_images)
        .headless(!cli.headful);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_executable(chrome.clone());
    }
    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}

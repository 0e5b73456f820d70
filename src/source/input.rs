//! Input resolution: normalise a user-supplied path or URL.
//!
//! pdfium requires a file-system path, so PDF URLs are downloaded into a
//! `TempDir` that lives as long as the [`ResolvedInput`]. Dropping it removes
//! the file on every exit path, including panics. PDF magic bytes (`%PDF`)
//! are checked before returning so callers get `UnsupportedFormat` instead of
//! an engine crash.

use crate::config::ExtractionConfig;
use crate::error::Content2MdError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// A local PDF, either given directly or downloaded.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the `TempDir` keeps the download alive.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Build the HTTP client every network call goes through.
pub fn http_client(config: &ExtractionConfig) -> Result<reqwest::Client, Content2MdError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| Content2MdError::Internal(format!("HTTP client: {e}")))
}

/// Parse a web-page input. Only `http` and `https` URLs are accepted.
pub fn require_url(input: &str) -> Result<Url, Content2MdError> {
    if !is_url(input) {
        return Err(Content2MdError::UnsupportedFormat {
            source_ref: input.to_string(),
            detail: "web strategies need an http:// or https:// URL".into(),
        });
    }
    Url::parse(input).map_err(|e| Content2MdError::UnsupportedFormat {
        source_ref: input.to_string(),
        detail: format!("invalid URL: {e}"),
    })
}

/// Resolve a PDF input to a local file path, downloading URLs.
pub async fn resolve_pdf(
    input: &str,
    config: &ExtractionConfig,
) -> Result<ResolvedInput, Content2MdError> {
    if is_url(input) {
        download_pdf(input, config).await
    } else {
        resolve_local(input)
    }
}

/// Validate a local path: it must exist, be readable, and start with `%PDF`.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, Content2MdError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(Content2MdError::unavailable(path_str, "file not found"));
    }

    let mut f = std::fs::File::open(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Content2MdError::unavailable(path_str, "permission denied")
        } else {
            Content2MdError::unavailable(path_str, e)
        }
    })?;

    use std::io::Read;
    let mut magic = [0u8; 4];
    let read = f
        .read(&mut magic)
        .map_err(|e| Content2MdError::unavailable(path_str, e))?;
    check_pdf_magic(path_str, &magic[..read])?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a PDF URL into a temporary directory.
async fn download_pdf(
    url: &str,
    config: &ExtractionConfig,
) -> Result<ResolvedInput, Content2MdError> {
    info!("Downloading PDF from: {}", url);

    let client = http_client(config)?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Content2MdError::unavailable(url, e))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(Content2MdError::unavailable(url, format!("HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Content2MdError::unavailable(url, e))?;
    check_pdf_magic(url, &bytes)?;

    let temp_dir = TempDir::new().map_err(|e| Content2MdError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(format!("{}.pdf", document_identifier(url)));
    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Content2MdError::Internal(format!("Failed to write temp file: {e}")))?;

    info!("Downloaded {} bytes to {}", bytes.len(), file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

fn check_pdf_magic(source_ref: &str, head: &[u8]) -> Result<(), Content2MdError> {
    if head.starts_with(b"%PDF") {
        Ok(())
    } else {
        let shown: String = head.iter().take(4).map(|b| format!("{b:02x}")).collect();
        Err(Content2MdError::UnsupportedFormat {
            source_ref: source_ref.to_string(),
            detail: format!("not a PDF (first bytes: {shown})"),
        })
    }
}

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// Derive the stable asset prefix for an input.
///
/// Local paths use the file stem; URLs use the host followed by the path
/// segments. Anything outside `[A-Za-z0-9._-]` collapses to `-`.
pub fn document_identifier(input: &str) -> String {
    let raw = if is_url(input) {
        match Url::parse(input) {
            Ok(url) => {
                let mut parts: Vec<String> = url.host_str().map(str::to_string).into_iter().collect();
                if let Some(segments) = url.path_segments() {
                    parts.extend(
                        segments
                            .filter(|s| !s.is_empty())
                            .map(|s| s.trim_end_matches(".pdf").to_string()),
                    );
                }
                parts.join("-")
            }
            Err(_) => input.to_string(),
        }
    } else {
        Path::new(input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    sanitize_identifier(&raw)
}

/// Make a caller-supplied name safe to use as a filename prefix.
pub fn sanitize_identifier(raw: &str) -> String {
    let cleaned = RE_UNSAFE.replace_all(raw, "-");
    let trimmed = cleaned.trim_matches(|c| c == '-' || c == '.');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn identifier_from_path_uses_stem() {
        assert_eq!(document_identifier("/data/reports/Q3 report.pdf"), "Q3-report");
        assert_eq!(document_identifier("paper.pdf"), "paper");
    }

    #[test]
    fn identifier_from_url_uses_host_and_path() {
        assert_eq!(
            document_identifier("https://www.example.com/docs/intro?x=1"),
            "www.example.com-docs-intro"
        );
        assert_eq!(
            document_identifier("https://arxiv.org/pdf/1706.03762.pdf"),
            "arxiv.org-pdf-1706.03762"
        );
        assert_eq!(document_identifier("https://example.com/"), "example.com");
    }

    #[test]
    fn sanitize_falls_back_to_document() {
        assert_eq!(sanitize_identifier("///"), "document");
        assert_eq!(sanitize_identifier(""), "document");
        assert_eq!(sanitize_identifier("my upload (1)"), "my-upload-1");
    }

    #[test]
    fn require_url_rejects_paths() {
        let err = require_url("/tmp/page.html").unwrap_err();
        assert!(matches!(err, Content2MdError::UnsupportedFormat { .. }));
        assert!(require_url("https://example.com").is_ok());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = resolve_local("/definitely/not/a/real/file.pdf").err().unwrap();
        assert!(matches!(err, Content2MdError::SourceUnavailable { .. }));
    }

    #[test]
    fn non_pdf_is_unsupported() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"<html></html>").unwrap();
        let err = resolve_local(tmp.path().to_str().unwrap()).err().unwrap();
        assert!(matches!(err, Content2MdError::UnsupportedFormat { .. }));
    }

    #[test]
    fn pdf_magic_accepted() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.7\n").unwrap();
        let resolved = resolve_local(tmp.path().to_str().unwrap()).ok().unwrap();
        assert_eq!(resolved.path(), tmp.path());
    }
}

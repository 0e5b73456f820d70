//! Browser-driven strategy: a headless Chrome session queried over CDP.
//!
//! The whole DOM walk happens in one `Runtime.evaluate` call. The script
//! returns the same tagged node list the static parser builds, so both web
//! strategies share [`super::web::collect_nodes`].

use super::input::require_url;
use super::ContentSource;
use crate::config::{ExtractionConfig, Strategy};
use crate::error::Content2MdError;
use crate::model::ExtractionResult;

/// Walks the live DOM in document order. `innerText` is used for text so
/// CSS-hidden content is skipped the way a reader would skip it.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
const DOM_QUERY_JS: &str = r#"
(() => {
  const clean = (s) => (s || "").replace(/\s+/g, " ").trim();
  const out = [];
  for (const el of document.querySelectorAll("h1, h2, h3, p, table, a[href], img[src]")) {
    switch (el.tagName.toLowerCase()) {
      case "table":
        out.push({
          kind: "table",
          rows: Array.from(el.querySelectorAll("tr")).map((tr) =>
            Array.from(tr.querySelectorAll("th, td")).map((c) => clean(c.innerText))),
        });
        break;
      case "a":
        out.push({ kind: "link", label: clean(el.innerText), href: el.href });
        break;
      case "img":
        out.push({ kind: "image", src: el.src });
        break;
      default:
        out.push({ kind: "text", text: clean(el.innerText) });
    }
  }
  return out;
})()
"#;

/// Scrapes script-rendered pages through a local Chrome or Chromium.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSource;

impl ContentSource for BrowserSource {
    fn strategy(&self) -> Strategy {
        Strategy::Browser
    }

    async fn extract(
        &self,
        source_ref: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult, Content2MdError> {
        let url = require_url(source_ref)?;
        imp::scrape(source_ref, url, config).await
    }
}

#[cfg(feature = "browser")]
mod imp {
    use super::DOM_QUERY_JS;
    use crate::config::ExtractionConfig;
    use crate::error::Content2MdError;
    use crate::model::ExtractionResult;
    use crate::source::input::{document_identifier, http_client};
    use crate::source::web::{collect_nodes, WebNode};
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::Page;
    use futures::StreamExt;
    use reqwest::Url;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tracing::{debug, info, warn};

    /// A launched browser plus the task pumping its CDP connection.
    ///
    /// `close` is the normal shutdown. Dropping the guard without closing
    /// (an early `?` return, a cancelled future) still stops the handler;
    /// chromiumoxide kills the child process when the `Browser` drops.
    struct BrowserSession {
        browser: Browser,
        handler: JoinHandle<()>,
    }

    impl BrowserSession {
        async fn launch(config: &ExtractionConfig) -> Result<Self, String> {
            let mut builder = BrowserConfig::builder()
                .request_timeout(Duration::from_secs(config.http_timeout_secs));
            if !config.headless {
                builder = builder.with_head();
            }
            if let Some(exe) = &config.chrome_executable {
                builder = builder.chrome_executable(exe);
            }
            let browser_config = builder.build()?;

            let (browser, mut handler) = Browser::launch(browser_config)
                .await
                .map_err(|e| e.to_string())?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        debug!("CDP handler stopped: {}", e);
                        break;
                    }
                }
            });
            Ok(Self { browser, handler })
        }

        async fn close(mut self) {
            if let Err(e) = self.browser.close().await {
                warn!("Browser close failed: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("Browser did not exit cleanly: {}", e);
            }
        }
    }

    impl Drop for BrowserSession {
        fn drop(&mut self) {
            self.handler.abort();
        }
    }

    pub(super) async fn scrape(
        source_ref: &str,
        url: Url,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult, Content2MdError> {
        info!("Launching browser for {}", url);
        let session = BrowserSession::launch(config)
            .await
            .map_err(|e| Content2MdError::unavailable(source_ref, format!("browser launch: {e}")))?;

        let outcome = query_page(&session, source_ref, &url, config).await;
        session.close().await;
        let nodes = outcome?;
        debug!("DOM query returned {} nodes", nodes.len());

        let client = if config.download_images {
            Some(http_client(config)?)
        } else {
            None
        };
        let collector = collect_nodes(nodes, client.as_ref()).await;
        Ok(collector.finish(document_identifier(source_ref), source_ref.to_string()))
    }

    async fn query_page(
        session: &BrowserSession,
        source_ref: &str,
        url: &Url,
        config: &ExtractionConfig,
    ) -> Result<Vec<WebNode>, Content2MdError> {
        let timeout = Duration::from_secs(config.dom_ready_timeout_secs);
        let page = tokio::time::timeout(timeout, session.browser.new_page(url.as_str()))
            .await
            .map_err(|_| Content2MdError::unavailable(source_ref, "navigation timed out"))?
            .map_err(|e| Content2MdError::unavailable(source_ref, format!("navigation: {e}")))?;

        wait_for_body(&page, timeout)
            .await
            .map_err(|_| {
                Content2MdError::unavailable(
                    source_ref,
                    format!("body not present after {}s", timeout.as_secs()),
                )
            })?;

        let evaluation = page
            .evaluate(DOM_QUERY_JS)
            .await
            .map_err(|e| Content2MdError::ParseFailure {
                source_ref: source_ref.to_string(),
                detail: format!("DOM query failed: {e}"),
            })?;
        let nodes = evaluation
            .into_value::<Vec<WebNode>>()
            .map_err(|e| Content2MdError::ParseFailure {
                source_ref: source_ref.to_string(),
                detail: format!("DOM query returned unexpected data: {e}"),
            })?;

        if let Err(e) = page.close().await {
            debug!("Page close failed: {}", e);
        }
        Ok(nodes)
    }

    async fn wait_for_body(page: &Page, timeout: Duration) -> Result<(), tokio::time::error::Elapsed> {
        tokio::time::timeout(timeout, async {
            loop {
                if page.find_element("body").await.is_ok() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        })
        .await
    }
}

#[cfg(not(feature = "browser"))]
mod imp {
    use crate::config::ExtractionConfig;
    use crate::error::Content2MdError;
    use crate::model::ExtractionResult;
    use reqwest::Url;

    pub(super) async fn scrape(
        source_ref: &str,
        _url: Url,
        _config: &ExtractionConfig,
    ) -> Result<ExtractionResult, Content2MdError> {
        Err(Content2MdError::unavailable(
            source_ref,
            "built without the `browser` feature",
        ))
    }
}

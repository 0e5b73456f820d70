//! Static-HTML strategy: one HTTP GET, parsed without running scripts.

use super::classify::{classify_tag, normalize_text, ElementKind, WEB_ELEMENT_SELECTOR};
use super::input::{document_identifier, http_client, require_url};
use super::web::{collect_nodes, WebNode};
use super::ContentSource;
use crate::config::{ExtractionConfig, Strategy};
use crate::error::Content2MdError;
use crate::model::ExtractionResult;
use once_cell::sync::Lazy;
use reqwest::{StatusCode, Url};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

static ELEMENTS: Lazy<Selector> = Lazy::new(|| Selector::parse(WEB_ELEMENT_SELECTOR).unwrap());
static ROWS: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELLS: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());

/// Fetches a page and extracts text, tables, links, and images from the
/// served markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticHtmlSource;

impl ContentSource for StaticHtmlSource {
    fn strategy(&self) -> Strategy {
        Strategy::StaticHtml
    }

    async fn extract(
        &self,
        source_ref: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult, Content2MdError> {
        let url = require_url(source_ref)?;
        let client = http_client(config)?;

        info!("Fetching {}", url);
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Content2MdError::unavailable(source_ref, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Content2MdError::unavailable(
                source_ref,
                format!("HTTP {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Content2MdError::unavailable(source_ref, e))?;
        debug!("Fetched {} bytes of markup", body.len());

        let nodes = parse_nodes(&body, &url);
        let download = config.download_images.then_some(&client);
        let collector = collect_nodes(nodes, download).await;
        Ok(collector.finish(document_identifier(source_ref), source_ref.to_string()))
    }
}

/// Parse markup into nodes in document order. Relative `href` and `src`
/// values are resolved against `base`.
pub fn parse_nodes(html: &str, base: &Url) -> Vec<WebNode> {
    let document = Html::parse_document(html);
    document
        .select(&ELEMENTS)
        .filter_map(|el| match classify_tag(el.value().name())? {
            ElementKind::Text => Some(WebNode::Text {
                text: element_text(&el),
            }),
            ElementKind::Table => Some(WebNode::Table {
                rows: el
                    .select(&ROWS)
                    .map(|row| row.select(&CELLS).map(|c| element_text(&c)).collect())
                    .collect(),
            }),
            ElementKind::Link => Some(WebNode::Link {
                label: element_text(&el),
                href: resolve(base, el.value().attr("href")?),
            }),
            ElementKind::Image => Some(WebNode::Image {
                src: resolve(base, el.value().attr("src")?),
            }),
        })
        .collect()
}

/// Text nodes are concatenated as-is so inline markup (`H<sub>2</sub>O`)
/// does not split words, then whitespace is collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<String>())
}

fn resolve(base: &Url, raw: &str) -> String {
    let raw = raw.trim();
    base.join(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

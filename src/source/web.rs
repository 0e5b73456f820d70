//! Shared node model for the two web strategies.
//!
//! The static parser and the live-DOM query both reduce a page to a flat
//! list of [`WebNode`]s in document order. The browser strategy receives
//! them as JSON straight from the page, which is why the type derives
//! `Deserialize`. From there a single code path classifies, numbers, and
//! (optionally) downloads images.

use super::classify::ElementCollector;
use crate::model::ImageSource;
use image::DynamicImage;
use serde::Deserialize;
use tracing::{debug, warn};

/// One extracted DOM node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WebNode {
    Text { text: String },
    Table { rows: Vec<Vec<String>> },
    Link { label: String, href: String },
    Image { src: String },
}

/// Classify nodes into a collector. With `client` set, image URLs are
/// fetched and stored as rasters; a failed download keeps the URL.
pub async fn collect_nodes(
    nodes: Vec<WebNode>,
    client: Option<&reqwest::Client>,
) -> ElementCollector {
    let mut collector = ElementCollector::new();
    for node in nodes {
        match node {
            WebNode::Text { text } => collector.push_text(&text),
            WebNode::Table { rows } => collector.push_table(rows, None),
            WebNode::Link { label, href } => collector.push_link(&label, &href),
            WebNode::Image { src } => {
                let source = match client {
                    Some(client) if !src.trim().is_empty() => {
                        match download_image(client, &src).await {
                            Ok(img) => ImageSource::Raster(img),
                            Err(e) => {
                                warn!("Keeping remote reference for {}: {}", src, e);
                                ImageSource::Url(src)
                            }
                        }
                    }
                    _ => ImageSource::Url(src),
                };
                collector.push_image(source);
            }
        }
    }
    collector
}

/// Fetch and decode one image.
pub async fn download_image(client: &reqwest::Client, url: &str) -> Result<DynamicImage, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(format!("HTTP {status}"));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    debug!("Downloaded image {} ({} bytes)", url, bytes.len());
    image::load_from_memory(&bytes).map_err(|e| e.to_string())
}

//! Canonical markdown layout.
//!
//! ```text
//! # Extracted Content from {source}
//!
//! ## Text Content
//!
//! {text}
//!
//! ## Tables
//!
//! ### Table {n}
//!
//! | c1 | c2 |
//!
//! ## Links
//!
//! - [label](href)
//!
//! ## Images
//!
//! ![Image](target)
//! ```
//!
//! Tables have no separator row: header and data rows are not told apart.

use super::{image_target, AssetIndex, RenderOptions};
use crate::config::SectionPolicy;
use crate::model::ExtractionResult;

/// Render `result` as markdown ending in exactly one newline.
pub fn render_markdown(
    result: &ExtractionResult,
    assets: &AssetIndex,
    options: &RenderOptions,
) -> String {
    let mut output = format!("# Extracted Content from {}\n\n", result.source);

    let mut text = String::new();
    for block in result.texts() {
        text.push_str(&block.content);
        text.push_str("\n\n");
    }
    push_section(&mut output, "Text Content", &text, options.section_policy);

    let mut tables = String::new();
    for table in result.tables() {
        tables.push_str(&format!("### Table {}\n\n", table.sequence_index));
        tables.push_str(&render_table_rows(&table.rows));
        tables.push('\n');
    }
    push_section(&mut output, "Tables", &tables, options.section_policy);

    let mut links = String::new();
    for link in result.links() {
        let label = if link.label.is_empty() {
            "Link"
        } else {
            link.label.as_str()
        };
        links.push_str(&format!("- [{}]({})\n", label, link.href));
    }
    if !links.is_empty() {
        links.push('\n');
    }
    push_section(&mut output, "Links", &links, options.section_policy);

    let mut images = String::new();
    for image in result.images() {
        if let Some(target) = image_target(image, assets, options) {
            images.push_str(&format!("![Image]({})\n", target));
        }
    }
    if !images.is_empty() {
        images.push('\n');
    }
    push_section(&mut output, "Images", &images, options.section_policy);

    let trimmed = output.trim_end_matches('\n').len();
    output.truncate(trimmed);
    output.push('\n');
    output
}

/// Pipe-delimited rows, one line each.
pub fn render_table_rows(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push('|');
        for cell in row {
            out.push(' ');
            out.push_str(&escape_cell(cell));
            out.push_str(" |");
        }
        out.push('\n');
    }
    out
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

fn push_section(output: &mut String, title: &str, body: &str, policy: SectionPolicy) {
    if body.is_empty() && policy == SectionPolicy::Skip {
        return;
    }
    output.push_str("## ");
    output.push_str(title);
    output.push_str("\n\n");
    output.push_str(body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ExtractedElement, ImageRef, ImageSource, LinkRef, TableBlock, TextBlock,
    };
    use crate::render::ImageMode;
    use image::DynamicImage;

    fn result(elements: Vec<ExtractedElement>) -> ExtractionResult {
        ExtractionResult {
            document_identifier: "doc".into(),
            source: "https://example.com".into(),
            elements,
            pages: Vec::new(),
        }
    }

    fn text(s: &str) -> ExtractedElement {
        ExtractedElement::Text(TextBlock { content: s.into() })
    }

    fn table(n: usize, rows: &[&[&str]]) -> ExtractedElement {
        ExtractedElement::Table(TableBlock {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            sequence_index: n,
            raster: None,
        })
    }

    #[test]
    fn table_rows_render_exactly() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
        ];
        assert_eq!(render_table_rows(&rows), "| a | b |\n| 1 | 2 |\n");
    }

    #[test]
    fn cells_escape_pipes_and_newlines() {
        let rows = vec![vec!["x|y".to_string(), "two\nlines".to_string()]];
        assert_eq!(render_table_rows(&rows), "| x\\|y | two lines |\n");
    }

    #[test]
    fn full_document_layout() {
        let r = result(vec![
            text("Hello"),
            ExtractedElement::Link(LinkRef {
                label: String::new(),
                href: "https://a.test/".into(),
            }),
            table(1, &[&["a", "b"], &["1", "2"]]),
            text("World"),
            ExtractedElement::Image(ImageRef {
                source: ImageSource::Url("https://a.test/x.png".into()),
                sequence_index: 1,
            }),
        ]);
        let md = render_markdown(&r, &AssetIndex::new(), &RenderOptions::default());
        assert_eq!(
            md,
            "# Extracted Content from https://example.com\n\n\
             ## Text Content\n\nHello\n\nWorld\n\n\
             ## Tables\n\n### Table 1\n\n| a | b |\n| 1 | 2 |\n\n\
             ## Links\n\n- [Link](https://a.test/)\n\n\
             ## Images\n\n![Image](https://a.test/x.png)\n"
        );
    }

    #[test]
    fn empty_sections_follow_policy() {
        let r = result(vec![text("Only text")]);
        let skipped = render_markdown(&r, &AssetIndex::new(), &RenderOptions::default());
        assert_eq!(
            skipped,
            "# Extracted Content from https://example.com\n\n## Text Content\n\nOnly text\n"
        );

        let options = RenderOptions {
            section_policy: SectionPolicy::EmitHeader,
            ..RenderOptions::default()
        };
        let emitted = render_markdown(&r, &AssetIndex::new(), &options);
        assert!(emitted.contains("## Tables\n\n## Links\n\n## Images\n"));
        assert!(emitted.ends_with("## Images\n"));
        assert!(!emitted.ends_with("\n\n"));
    }

    #[test]
    fn raster_images_resolve_through_assets() {
        let r = result(vec![
            ExtractedElement::Image(ImageRef {
                source: ImageSource::Raster(DynamicImage::new_rgb8(2, 2)),
                sequence_index: 1,
            }),
            ExtractedElement::Image(ImageRef {
                source: ImageSource::Raster(DynamicImage::new_rgb8(2, 2)),
                sequence_index: 2,
            }),
        ]);
        let mut assets = AssetIndex::new();
        assets.insert_picture(2, "doc-picture-2.png");

        let referenced = render_markdown(&r, &assets, &RenderOptions::default());
        assert!(referenced.contains("![Image](doc-picture-2.png)\n"));
        assert!(!referenced.contains("picture-1"));

        let embedded = render_markdown(
            &r,
            &assets,
            &RenderOptions {
                image_mode: ImageMode::Embedded,
                ..RenderOptions::default()
            },
        );
        assert_eq!(embedded.matches("![Image](data:image/png;base64,").count(), 2);
    }

    #[test]
    fn rendering_is_idempotent() {
        let r = result(vec![text("A"), table(1, &[&["x"]])]);
        let options = RenderOptions::default();
        let first = render_markdown(&r, &AssetIndex::new(), &options);
        let second = render_markdown(&r, &AssetIndex::new(), &options);
        assert_eq!(first, second);
    }
}

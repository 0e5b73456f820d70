//! Standalone HTML page with the same section order as the markdown.

use super::{image_target, AssetIndex, RenderOptions};
use crate::config::SectionPolicy;
use crate::model::ExtractionResult;
use html_escape::{encode_double_quoted_attribute, encode_text};

pub fn render_html(result: &ExtractionResult, assets: &AssetIndex, options: &RenderOptions) -> String {
    let title = format!("Extracted Content from {}", result.source);
    let mut output = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    output.push_str(&format!("<title>{}</title>\n", encode_text(&title)));
    output.push_str("</head>\n<body>\n");
    output.push_str(&format!("<h1>{}</h1>\n", encode_text(&title)));

    let mut text = String::new();
    for block in result.texts() {
        text.push_str(&format!("<p>{}</p>\n", encode_text(&block.content)));
    }
    push_section(&mut output, "Text Content", &text, options.section_policy);

    let mut tables = String::new();
    for table in result.tables() {
        tables.push_str(&format!("<h3>Table {}</h3>\n<table>\n", table.sequence_index));
        for row in &table.rows {
            tables.push_str("<tr>");
            for cell in row {
                tables.push_str(&format!("<td>{}</td>", encode_text(cell)));
            }
            tables.push_str("</tr>\n");
        }
        tables.push_str("</table>\n");
    }
    push_section(&mut output, "Tables", &tables, options.section_policy);

    let mut links = String::new();
    for link in result.links() {
        let label = if link.label.is_empty() {
            "Link"
        } else {
            link.label.as_str()
        };
        links.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            encode_double_quoted_attribute(&link.href),
            encode_text(label)
        ));
    }
    if !links.is_empty() {
        links = format!("<ul>\n{links}</ul>\n");
    }
    push_section(&mut output, "Links", &links, options.section_policy);

    let mut images = String::new();
    for image in result.images() {
        if let Some(target) = image_target(image, assets, options) {
            images.push_str(&format!(
                "<img src=\"{}\" alt=\"Image\">\n",
                encode_double_quoted_attribute(&target)
            ));
        }
    }
    push_section(&mut output, "Images", &images, options.section_policy);

    output.push_str("</body>\n</html>\n");
    output
}

fn push_section(output: &mut String, title: &str, body: &str, policy: SectionPolicy) {
    if body.is_empty() && policy == SectionPolicy::Skip {
        return;
    }
    output.push_str(&format!("<h2>{title}</h2>\n"));
    output.push_str(body);
}
